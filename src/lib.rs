//! Weekly timetable construction.
//!
//! Courses are expanded into single-period sessions and placed onto a
//! Monday..Friday grid of equal-length time slots by an ILP model solved
//! with HiGHS. Every session is placed exactly once, no cell holds two
//! sessions, and no lecturer teaches two adjacent slots on the same day.
//!
//! The engine ([`slots`], [`solver`], [`validation`]) is synchronous and
//! stateless; [`server`] wraps it in an HTTP API.

pub mod config;
pub mod data;
pub mod error;
pub mod server;
pub mod slots;
pub mod solver;
pub mod upload;
pub mod validation;

pub use data::{CourseRequest, DayConstraints, ScheduledSession, Session, TimeSlot, Timetable};
pub use error::TimetableError;
pub use slots::{MAX_PERIODS_PER_DAY, build_time_slots};
pub use solver::{SolverOptions, schedule, schedule_with_options};
