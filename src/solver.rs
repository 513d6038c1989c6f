use crate::data::{
    CourseRequest, DayConstraints, DayIndex, NUM_DAYS, Session, SessionIndex, SlotIndex,
    TimeSlot, Timetable,
};
use crate::error::TimetableError;
use crate::slots::build_time_slots;
use crate::validation::find_violations;
use good_lp::solvers::SolutionStatus;
use good_lp::variable;
use good_lp::{
    Expression, ProblemVariables, ResolutionError, Solution, SolverModel, Variable, constraint,
    default_solver,
};
use itertools::{Itertools, iproduct};
use log::{debug, info, trace, warn};
use std::time::{Duration, Instant};

pub const DEFAULT_TIME_LIMIT: Duration = Duration::from_secs(30);

/// What good_lp's HiGHS backend reports when a limit was hit before any incumbent.
const NO_SOLUTION_FOUND: &str = "NoSolutionFound";

/// Tuning for a single solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverOptions {
    pub time_limit: Duration,
    pub random_seed: i32,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            time_limit: DEFAULT_TIME_LIMIT,
            random_seed: 1234,
        }
    }
}

/// Builds a timetable for `courses` under `constraints` with default solver options.
pub fn schedule(
    constraints: &DayConstraints,
    courses: &[CourseRequest],
) -> Result<Timetable, TimetableError> {
    schedule_with_options(constraints, courses, &SolverOptions::default())
}

pub fn schedule_with_options(
    constraints: &DayConstraints,
    courses: &[CourseRequest],
    options: &SolverOptions,
) -> Result<Timetable, TimetableError> {
    let time_slots = build_time_slots(constraints)?;
    check_capacity(courses, time_slots.len())?;
    let sessions = expand_sessions(courses)?;
    solve_assignment(time_slots, &sessions, options)
}

/// Fails fast when the week has fewer cells than requested sessions.
pub fn check_capacity(
    courses: &[CourseRequest],
    periods_per_day: usize,
) -> Result<(), TimetableError> {
    let required: u64 = courses.iter().map(|c| u64::from(c.weekly_periods)).sum();
    let available = periods_per_day * NUM_DAYS;
    if required > available as u64 {
        return Err(TimetableError::CapacityExceeded {
            required: usize::try_from(required).unwrap_or(usize::MAX),
            available,
        });
    }
    Ok(())
}

/// Expands every course into `weekly_periods` interchangeable sessions.
pub fn expand_sessions(courses: &[CourseRequest]) -> Result<Vec<Session>, TimetableError> {
    let mut sessions = Vec::new();
    for course in courses {
        let name = course.name.trim();
        if name.is_empty() {
            return Err(TimetableError::InvalidCourse(
                "course name is required".to_string(),
            ));
        }
        if course.weekly_periods == 0 {
            return Err(TimetableError::InvalidCourse(format!(
                "{} needs at least one weekly period",
                name
            )));
        }
        let session = Session {
            course: name.to_string(),
            lecturer: course.lecturer_label().to_string(),
        };
        sessions.extend(std::iter::repeat_n(session, course.weekly_periods as usize));
    }
    if sessions.is_empty() {
        return Err(TimetableError::NoSessions);
    }
    Ok(sessions)
}

/// x_sdt = 1 if session s is taught on day d in slot t, laid out flat.
struct AssignmentVars {
    vars: Vec<Variable>,
    num_slots: usize,
}

impl AssignmentVars {
    fn at(&self, session: SessionIndex, day: DayIndex, slot: SlotIndex) -> Variable {
        self.vars[(session * NUM_DAYS + day) * self.num_slots + slot]
    }
}

/// Places every session into a (day, slot) cell using the HiGHS ILP solver.
pub fn solve_assignment(
    time_slots: Vec<TimeSlot>,
    sessions: &[Session],
    options: &SolverOptions,
) -> Result<Timetable, TimetableError> {
    let num_slots = time_slots.len();
    let num_sessions = sessions.len();
    if num_sessions == 0 {
        return Err(TimetableError::NoSessions);
    }
    if num_sessions > num_slots * NUM_DAYS {
        return Err(TimetableError::CapacityExceeded {
            required: num_sessions,
            available: num_slots * NUM_DAYS,
        });
    }

    info!(
        "Setting up ILP model with {} sessions, {} days and {} slots per day...",
        num_sessions, NUM_DAYS, num_slots
    );
    let mut problem = ProblemVariables::new();
    let x = AssignmentVars {
        vars: problem.add_vector(variable().binary(), num_sessions * NUM_DAYS * num_slots),
        num_slots,
    };
    trace!("Generated {} assignment variables.", x.vars.len());

    // unassigned sessions form one "N/A" group like any other lecturer
    let lecturer_sessions = sessions
        .iter()
        .enumerate()
        .map(|(s, session)| (session.lecturer.as_str(), s))
        .into_group_map();

    // feasibility only
    let mut model = problem
        .minimise(Expression::from(0.0))
        .using(default_solver)
        .set_option("threads", 1)
        .set_option("random_seed", options.random_seed)
        .set_option("log_to_console", "false")
        .set_option("time_limit", options.time_limit.as_secs_f64());

    debug!("Adding 'session scheduled once' constraints...");
    for s in 0..num_sessions {
        let scheduled_once: Expression = iproduct!(0..NUM_DAYS, 0..num_slots)
            .map(|(d, t)| x.at(s, d, t))
            .sum();
        model.add_constraint(constraint!(scheduled_once == 1));
    }

    debug!("Adding 'one session per cell' constraints...");
    for (d, t) in iproduct!(0..NUM_DAYS, 0..num_slots) {
        let cell_occupancy: Expression = (0..num_sessions).map(|s| x.at(s, d, t)).sum();
        model.add_constraint(constraint!(cell_occupancy <= 1));
    }

    debug!("Adding 'no back-to-back per lecturer' constraints...");
    let mut back_to_back_constraints = 0usize;
    for (lecturer, own_sessions) in &lecturer_sessions {
        if own_sessions.len() < 2 {
            continue;
        }
        trace!("{} teaches {} sessions", lecturer, own_sessions.len());
        for (&s1, &s2) in own_sessions.iter().tuple_combinations() {
            for (d, t) in iproduct!(0..NUM_DAYS, 0..num_slots.saturating_sub(1)) {
                model.add_constraint(constraint!(x.at(s1, d, t) + x.at(s2, d, t + 1) <= 1));
                model.add_constraint(constraint!(x.at(s2, d, t) + x.at(s1, d, t + 1) <= 1));
                back_to_back_constraints += 2;
            }
        }
    }
    debug!("Added {} back-to-back constraints.", back_to_back_constraints);

    info!("Starting ILP solver...");
    let started = Instant::now();
    let result = model.solve();
    let elapsed = started.elapsed();

    let solution = result.map_err(|e| {
        warn!("Solver stopped after {:.2?}: {}", elapsed, e);
        resolution_failure(e, elapsed)
    })?;
    let status = solution.status();
    info!("Solver returned {:?} in {:.2?}", status, elapsed);

    let mut timetable = Timetable::empty(time_slots);
    for (s, d, t) in iproduct!(0..num_sessions, 0..NUM_DAYS, 0..num_slots) {
        if solution.value(x.at(s, d, t)) > 0.9 && timetable.grid[t][d].is_none() {
            timetable.grid[t][d] = Some(sessions[s].to_scheduled());
        }
    }

    let violations = find_violations(&timetable, sessions);
    if !violations.is_empty() {
        for violation in &violations {
            warn!("Rejected solver output: {}", violation);
        }
        return Err(match status {
            SolutionStatus::TimeLimit => TimetableError::Timeout {
                seconds: elapsed.as_secs_f64(),
            },
            _ => TimetableError::SolverFailure(format!(
                "{} constraint violations in a {:?} solution",
                violations.len(),
                status
            )),
        });
    }

    Ok(timetable)
}

/// Maps a failed solve to the engine's error kinds; only a proof counts as infeasible.
fn resolution_failure(error: ResolutionError, elapsed: Duration) -> TimetableError {
    match error {
        ResolutionError::Infeasible => TimetableError::Infeasible,
        ResolutionError::Other(NO_SOLUTION_FOUND) => TimetableError::Timeout {
            seconds: elapsed.as_secs_f64(),
        },
        other => TimetableError::SolverFailure(other.to_string()),
    }
}
