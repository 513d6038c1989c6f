use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;

// Type aliases for clarity
pub type SlotIndex = usize;
pub type DayIndex = usize;
pub type SessionIndex = usize;

/// Number of teaching days in the weekly grid (Monday..Friday).
pub const NUM_DAYS: usize = 5;

pub const DAY_NAMES: [&str; NUM_DAYS] = ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"];

/// Lecturer recorded for courses that name none. All such courses share it.
pub const UNASSIGNED_LECTURER: &str = "N/A";

/// Day boundaries, break window and period sizing for every teaching day.
///
/// Times are clock strings such as `"8:00 AM"`; durations are in hours.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DayConstraints {
    pub start_time: String,
    pub end_time: String,
    pub break_start: String,
    pub break_end: String,
    pub periods_per_day: u32,
    pub min_duration: f64,
    pub max_duration: f64,
}

impl Default for DayConstraints {
    fn default() -> Self {
        Self {
            start_time: "8:00 AM".to_string(),
            end_time: "4:00 PM".to_string(),
            break_start: "12:00 PM".to_string(),
            break_end: "1:00 PM".to_string(),
            periods_per_day: 6,
            min_duration: 1.0,
            max_duration: 2.0,
        }
    }
}

/// A course that needs `weekly_periods` sessions per week.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CourseRequest {
    pub name: String,
    #[serde(default)]
    pub lecturer: String,
    pub weekly_periods: u32,
}

impl CourseRequest {
    pub fn new(name: impl Into<String>, lecturer: impl Into<String>, weekly_periods: u32) -> Self {
        Self {
            name: name.into(),
            lecturer: lecturer.into(),
            weekly_periods,
        }
    }

    /// The trimmed lecturer name, or [`UNASSIGNED_LECTURER`] when blank.
    pub fn lecturer_label(&self) -> &str {
        match self.lecturer.trim() {
            "" => UNASSIGNED_LECTURER,
            name => name,
        }
    }
}

/// The complete input for one timetable request.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
    pub constraints: DayConstraints,
    pub courses: Vec<CourseRequest>,
}

/// One schedulable teaching occurrence of a course.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Session {
    pub course: String,
    pub lecturer: String,
}

impl Session {
    pub fn to_scheduled(&self) -> ScheduledSession {
        ScheduledSession {
            course: self.course.clone(),
            lecturer: self.lecturer.clone(),
        }
    }
}

/// A fixed time window within the teaching day, shared by all days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub index: SlotIndex,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub label: String,
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// What a filled grid cell shows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledSession {
    pub course: String,
    pub lecturer: String,
}

impl fmt::Display for ScheduledSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.course, self.lecturer)
    }
}

/// Grid indexed by `[slot][day]`.
pub type Grid = Vec<Vec<Option<ScheduledSession>>>;

/// The final output of the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timetable {
    pub days: Vec<String>,
    pub time_slots: Vec<TimeSlot>,
    pub grid: Grid,
}

impl Timetable {
    pub fn empty(time_slots: Vec<TimeSlot>) -> Self {
        let grid = vec![vec![None; NUM_DAYS]; time_slots.len()];
        Self {
            days: DAY_NAMES.iter().map(|d| d.to_string()).collect(),
            time_slots,
            grid,
        }
    }

    pub fn cell(&self, slot: SlotIndex, day: DayIndex) -> Option<&ScheduledSession> {
        self.grid.get(slot)?.get(day)?.as_ref()
    }

    /// Iterates over filled cells as `(slot, day, session)`.
    pub fn placements(&self) -> impl Iterator<Item = (SlotIndex, DayIndex, &ScheduledSession)> {
        self.grid.iter().enumerate().flat_map(|(slot, row)| {
            row.iter()
                .enumerate()
                .filter_map(move |(day, cell)| cell.as_ref().map(|s| (slot, day, s)))
        })
    }

    pub fn filled_cells(&self) -> usize {
        self.placements().count()
    }
}
