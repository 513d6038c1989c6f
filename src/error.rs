use thiserror::Error;

/// Errors that can occur while building a timetable.
///
/// Every variant is caller-facing; nothing is recovered internally.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimetableError {
    #[error("Invalid time format: {0}. Use e.g. '8:00 AM'.")]
    InvalidTimeFormat(String),
    #[error("Invalid time ranges: {0}")]
    InvalidTimeRange(String),
    #[error("Periods per day must be between 1 and {max}, got {periods}")]
    InvalidPeriods { periods: u32, max: u32 },
    #[error("Invalid lecture duration bounds: min {min} h, max {max} h")]
    InvalidDurationBounds { min: f64, max: f64 },
    #[error("No available time after break")]
    NoAvailableTime,
    #[error("Lecture duration {duration:.2} hours is outside min/max range ({min}-{max})")]
    DurationOutOfRange { duration: f64, min: f64, max: f64 },
    #[error("Slot {slot} ({label}) exceeds the end of the day")]
    SlotExceedsEnd { slot: usize, label: String },
    #[error("Invalid course: {0}")]
    InvalidCourse(String),
    #[error("No periods to schedule")]
    NoSessions,
    #[error("Not enough slots available ({required} periods required, {available} available)")]
    CapacityExceeded { required: usize, available: usize },
    #[error("Could not generate timetable satisfying constraints")]
    Infeasible,
    #[error("Solver gave up after {seconds:.1}s without a valid timetable")]
    Timeout { seconds: f64 },
    #[error("Solver failed: {0}")]
    SolverFailure(String),
    #[error("Invalid upload: {0}")]
    InvalidUpload(String),
}

impl TimetableError {
    /// Stable identifier for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            TimetableError::InvalidTimeFormat(_) => "INVALID_TIME_FORMAT",
            TimetableError::InvalidTimeRange(_) => "INVALID_TIME_RANGE",
            TimetableError::InvalidPeriods { .. } => "INVALID_PERIODS",
            TimetableError::InvalidDurationBounds { .. } => "INVALID_DURATION_BOUNDS",
            TimetableError::NoAvailableTime => "NO_AVAILABLE_TIME",
            TimetableError::DurationOutOfRange { .. } => "DURATION_OUT_OF_RANGE",
            TimetableError::SlotExceedsEnd { .. } => "SLOT_EXCEEDS_END",
            TimetableError::InvalidCourse(_) => "INVALID_COURSE",
            TimetableError::NoSessions => "NO_SESSIONS",
            TimetableError::CapacityExceeded { .. } => "CAPACITY_EXCEEDED",
            TimetableError::Infeasible => "INFEASIBLE",
            TimetableError::Timeout { .. } => "TIMEOUT",
            TimetableError::SolverFailure(_) => "SOLVER_FAILURE",
            TimetableError::InvalidUpload(_) => "INVALID_UPLOAD",
        }
    }

    /// Whether the input itself was malformed, as opposed to well-formed but unschedulable.
    pub fn is_validation(&self) -> bool {
        !matches!(
            self,
            TimetableError::CapacityExceeded { .. }
                | TimetableError::Infeasible
                | TimetableError::Timeout { .. }
                | TimetableError::SolverFailure(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_problem() {
        let err = TimetableError::CapacityExceeded {
            required: 31,
            available: 30,
        };
        assert_eq!(
            err.to_string(),
            "Not enough slots available (31 periods required, 30 available)"
        );
        let err = TimetableError::DurationOutOfRange {
            duration: 0.6,
            min: 1.0,
            max: 2.0,
        };
        assert_eq!(
            err.to_string(),
            "Lecture duration 0.60 hours is outside min/max range (1-2)"
        );
    }

    #[test]
    fn feasibility_failures_are_not_validation_errors() {
        assert!(!TimetableError::Infeasible.is_validation());
        assert!(!TimetableError::Timeout { seconds: 1.0 }.is_validation());
        assert!(!TimetableError::SolverFailure("Unbounded".to_string()).is_validation());
        assert!(TimetableError::NoAvailableTime.is_validation());
        assert_eq!(TimetableError::Infeasible.code(), "INFEASIBLE");
    }
}
