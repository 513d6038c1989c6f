//! Independent checks over a finished timetable.
//!
//! A timetable is valid iff:
//! - the grid has one row per time slot and one column per day,
//! - every requested session occupies exactly one cell (counted per
//!   `(course, lecturer)` pair, since sessions of one course are interchangeable),
//! - no lecturer teaches in slots `t` and `t + 1` of the same day.
//!
//! Unassigned sessions all share the `N/A` lecturer and are checked like any other.

use itertools::Itertools;
use std::collections::HashMap;
use std::fmt;

use crate::data::{DAY_NAMES, DayIndex, NUM_DAYS, ScheduledSession, Session, SlotIndex, Timetable};

/// A hard constraint broken by a timetable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    GridShape {
        expected_slots: usize,
        found_slots: usize,
    },
    RowWidth {
        slot: SlotIndex,
        width: usize,
    },
    SessionCount {
        session: ScheduledSession,
        expected: usize,
        found: usize,
    },
    BackToBack {
        lecturer: String,
        day: DayIndex,
        slot: SlotIndex,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::GridShape {
                expected_slots,
                found_slots,
            } => write!(f, "[Grid] expected {} slot rows, found {}", expected_slots, found_slots),
            Violation::RowWidth { slot, width } => {
                write!(f, "[Grid] slot {} has {} day columns, expected {}", slot, width, NUM_DAYS)
            }
            Violation::SessionCount {
                session,
                expected,
                found,
            } => write!(
                f,
                "[Coverage] {} should appear {} times, found {}",
                session, expected, found
            ),
            Violation::BackToBack { lecturer, day, slot } => write!(
                f,
                "[Back-to-Back] {} teaches slots {} and {} on {}",
                lecturer,
                slot,
                slot + 1,
                DAY_NAMES.get(*day).copied().unwrap_or("?")
            ),
        }
    }
}

/// Returns every hard-constraint violation of `timetable` against the requested `sessions`.
pub fn find_violations(timetable: &Timetable, sessions: &[Session]) -> Vec<Violation> {
    let mut violations = Vec::new();

    if timetable.grid.len() != timetable.time_slots.len() {
        violations.push(Violation::GridShape {
            expected_slots: timetable.time_slots.len(),
            found_slots: timetable.grid.len(),
        });
    }
    for (slot, row) in timetable.grid.iter().enumerate() {
        if row.len() != NUM_DAYS {
            violations.push(Violation::RowWidth {
                slot,
                width: row.len(),
            });
        }
    }

    let expected: HashMap<ScheduledSession, usize> =
        sessions.iter().map(Session::to_scheduled).counts();
    let found: HashMap<&ScheduledSession, usize> =
        timetable.placements().map(|(_, _, s)| s).counts();

    for (session, expected_count) in expected.iter().sorted() {
        let found_count = found.get(session).copied().unwrap_or(0);
        if found_count != *expected_count {
            violations.push(Violation::SessionCount {
                session: session.clone(),
                expected: *expected_count,
                found: found_count,
            });
        }
    }
    for (session, found_count) in found.iter().sorted() {
        if !expected.contains_key(*session) {
            violations.push(Violation::SessionCount {
                session: (*session).clone(),
                expected: 0,
                found: *found_count,
            });
        }
    }

    for day in 0..NUM_DAYS {
        for slot in 0..timetable.grid.len().saturating_sub(1) {
            let (Some(first), Some(second)) =
                (timetable.cell(slot, day), timetable.cell(slot + 1, day))
            else {
                continue;
            };
            if first.lecturer == second.lecturer {
                violations.push(Violation::BackToBack {
                    lecturer: first.lecturer.clone(),
                    day,
                    slot,
                });
            }
        }
    }

    violations
}
