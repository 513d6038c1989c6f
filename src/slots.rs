//! Slot builder: turns day boundaries and a break window into the ordered
//! list of equal-length teaching slots shared by every day of the week.
//!
//! Times are handled as milliseconds since midnight. The slot length is the
//! integer floor of `available / periods_per_day`, so a run of slots never
//! drifts past `end_time` through rounding.
//!
//! A slot that would overlap the break is moved wholesale to `break_end`;
//! no partial slot is placed before the break. Slot starts after the break
//! are therefore not aligned to `start_time + n * duration`.

use chrono::{NaiveTime, Timelike};
use log::{debug, trace};

use crate::data::{DayConstraints, TimeSlot};
use crate::error::TimetableError;

const MS_PER_HOUR: i64 = 3_600_000;

/// Upper bound on `periods_per_day`; keeps the model at most `5 * 24` columns per session.
pub const MAX_PERIODS_PER_DAY: u32 = 24;

/// Accepted clock formats, tried in order.
const CLOCK_FORMATS: [&str; 2] = ["%I:%M %p", "%H:%M"];

const LABEL_FORMAT: &str = "%I:%M %p";

/// Parses `"8:00 AM"`-style clock times, falling back to 24-hour `"13:30"`.
pub fn parse_clock_time(input: &str) -> Result<NaiveTime, TimetableError> {
    let trimmed = input.trim();
    CLOCK_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| TimetableError::InvalidTimeFormat(input.to_string()))
}

fn ms_of_day(time: NaiveTime) -> i64 {
    i64::from(time.num_seconds_from_midnight()) * 1000
}

fn time_of_ms(ms: i64) -> Option<NaiveTime> {
    let secs = u32::try_from(ms / 1000).ok()?;
    let nanos = u32::try_from((ms % 1000) * 1_000_000).ok()?;
    NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos)
}

fn check_duration_bounds(constraints: &DayConstraints) -> Result<(), TimetableError> {
    let (min, max) = (constraints.min_duration, constraints.max_duration);
    if !min.is_finite() || !max.is_finite() || min < 0.0 || min > max {
        return Err(TimetableError::InvalidDurationBounds { min, max });
    }
    Ok(())
}

/// Builds the `periods_per_day` slots of a teaching day, in chronological order.
pub fn build_time_slots(constraints: &DayConstraints) -> Result<Vec<TimeSlot>, TimetableError> {
    let start = ms_of_day(parse_clock_time(&constraints.start_time)?);
    let end = ms_of_day(parse_clock_time(&constraints.end_time)?);
    let break_start = ms_of_day(parse_clock_time(&constraints.break_start)?);
    let break_end = ms_of_day(parse_clock_time(&constraints.break_end)?);

    if break_start >= break_end {
        return Err(TimetableError::InvalidTimeRange(format!(
            "break start {} is not before break end {}",
            constraints.break_start, constraints.break_end
        )));
    }
    if start >= end {
        return Err(TimetableError::InvalidTimeRange(format!(
            "start {} is not before end {}",
            constraints.start_time, constraints.end_time
        )));
    }

    let available = (end - start) - (break_end - break_start);
    if available <= 0 {
        return Err(TimetableError::NoAvailableTime);
    }

    if constraints.periods_per_day == 0 || constraints.periods_per_day > MAX_PERIODS_PER_DAY {
        return Err(TimetableError::InvalidPeriods {
            periods: constraints.periods_per_day,
            max: MAX_PERIODS_PER_DAY,
        });
    }
    check_duration_bounds(constraints)?;

    let periods = i64::from(constraints.periods_per_day);
    let duration = available as f64 / MS_PER_HOUR as f64 / periods as f64;
    let slot_ms = available / periods;
    if slot_ms == 0
        || duration < constraints.min_duration
        || duration > constraints.max_duration
    {
        return Err(TimetableError::DurationOutOfRange {
            duration,
            min: constraints.min_duration,
            max: constraints.max_duration,
        });
    }
    debug!(
        "Building {} slots of {:.2}h between {} and {} (break {}-{})",
        periods,
        duration,
        constraints.start_time,
        constraints.end_time,
        constraints.break_start,
        constraints.break_end
    );

    let mut slots = Vec::with_capacity(constraints.periods_per_day as usize);
    let mut cursor = start;
    for index in 0..constraints.periods_per_day as usize {
        if cursor < break_end && cursor + slot_ms > break_start {
            trace!("Slot {} would overlap the break, moving it to break end", index);
            cursor = break_end;
        }
        let slot_end = cursor + slot_ms;
        let (slot_start_time, slot_end_time) = match (time_of_ms(cursor), time_of_ms(slot_end)) {
            (Some(s), Some(e)) if slot_end <= end => (s, e),
            (s, _) => {
                let label = s
                    .map(|s| format!("starting {}", s.format(LABEL_FORMAT)))
                    .unwrap_or_else(|| "past midnight".to_string());
                return Err(TimetableError::SlotExceedsEnd { slot: index, label });
            }
        };
        slots.push(TimeSlot {
            index,
            start: slot_start_time,
            end: slot_end_time,
            label: format!(
                "{} - {}",
                slot_start_time.format(LABEL_FORMAT),
                slot_end_time.format(LABEL_FORMAT)
            ),
        });
        cursor = slot_end;
    }

    Ok(slots)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constraints(periods_per_day: u32) -> DayConstraints {
        DayConstraints {
            periods_per_day,
            ..DayConstraints::default()
        }
    }

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn assert_slot_invariants(c: &DayConstraints, slots: &[TimeSlot]) {
        let start = parse_clock_time(&c.start_time).unwrap();
        let end = parse_clock_time(&c.end_time).unwrap();
        let break_start = parse_clock_time(&c.break_start).unwrap();
        let break_end = parse_clock_time(&c.break_end).unwrap();

        assert_eq!(slots.len(), c.periods_per_day as usize);
        let length = slots[0].end - slots[0].start;
        for (i, slot) in slots.iter().enumerate() {
            assert_eq!(slot.index, i);
            assert_eq!(slot.end - slot.start, length);
            assert!(slot.start >= start && slot.end <= end);
            assert!(
                slot.end <= break_start || slot.start >= break_end,
                "slot {} overlaps the break",
                slot.label
            );
        }
        for pair in slots.windows(2) {
            assert!(pair[0].end <= pair[1].start);
        }
    }

    #[test]
    fn parses_twelve_and_twenty_four_hour_clocks() {
        assert_eq!(parse_clock_time("8:00 AM").unwrap(), hm(8, 0));
        assert_eq!(parse_clock_time(" 12:30 pm ").unwrap(), hm(12, 30));
        assert_eq!(parse_clock_time("12:00 AM").unwrap(), hm(0, 0));
        assert_eq!(parse_clock_time("13:15").unwrap(), hm(13, 15));
    }

    #[test]
    fn rejects_unrecognised_clock_times() {
        for bad in ["", "noon", "25:00", "8 o'clock"] {
            assert_eq!(
                parse_clock_time(bad),
                Err(TimetableError::InvalidTimeFormat(bad.to_string()))
            );
        }
    }

    #[test]
    fn six_one_hour_slots_around_lunch() {
        let c = constraints(6);
        let slots = build_time_slots(&c).unwrap();
        assert_slot_invariants(&c, &slots);
        let labels: Vec<&str> = slots.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "08:00 AM - 09:00 AM",
                "09:00 AM - 10:00 AM",
                "10:00 AM - 11:00 AM",
                "11:00 AM - 12:00 PM",
                "01:00 PM - 02:00 PM",
                "02:00 PM - 03:00 PM",
            ]
        );
    }

    #[test]
    fn three_slots_sit_at_the_max_duration() {
        let c = constraints(3);
        let slots = build_time_slots(&c).unwrap();
        assert_slot_invariants(&c, &slots);
        assert_eq!(slots[0].start, hm(8, 0));
        assert_eq!(slots[1].start, hm(10, 0));
        assert_eq!(slots[2].start, hm(13, 0));
        assert_eq!(slots[2].end, hm(15, 0));
    }

    #[test]
    fn too_many_periods_falls_below_min_duration() {
        match build_time_slots(&constraints(10)) {
            Err(TimetableError::DurationOutOfRange { duration, min, max }) => {
                assert!((duration - 0.6).abs() < 1e-9);
                assert_eq!((min, max), (1.0, 2.0));
            }
            other => panic!("expected DurationOutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn straddling_slot_moves_past_the_break() {
        let c = constraints(4);
        let slots = build_time_slots(&c).unwrap();
        assert_slot_invariants(&c, &slots);
        assert_eq!(slots[1].end, hm(11, 0));
        assert_eq!(slots[2].start, hm(13, 0));
        assert_eq!(slots[3].end, hm(16, 0));
    }

    #[test]
    fn shifted_slots_can_overrun_the_day() {
        let c = DayConstraints {
            break_start: "11:30 AM".to_string(),
            break_end: "12:30 PM".to_string(),
            periods_per_day: 3,
            max_duration: 3.0,
            ..DayConstraints::default()
        };
        assert!(matches!(
            build_time_slots(&c),
            Err(TimetableError::SlotExceedsEnd { slot: 2, .. })
        ));
    }

    #[test]
    fn inverted_ranges_are_rejected() {
        let inverted_break = DayConstraints {
            break_start: "1:00 PM".to_string(),
            break_end: "12:00 PM".to_string(),
            ..DayConstraints::default()
        };
        assert!(matches!(
            build_time_slots(&inverted_break),
            Err(TimetableError::InvalidTimeRange(_))
        ));

        let inverted_day = DayConstraints {
            start_time: "4:00 PM".to_string(),
            end_time: "8:00 AM".to_string(),
            ..DayConstraints::default()
        };
        assert!(matches!(
            build_time_slots(&inverted_day),
            Err(TimetableError::InvalidTimeRange(_))
        ));
    }

    #[test]
    fn break_covering_the_day_leaves_no_time() {
        let c = DayConstraints {
            start_time: "8:00 AM".to_string(),
            end_time: "12:00 PM".to_string(),
            break_start: "8:00 AM".to_string(),
            break_end: "12:00 PM".to_string(),
            ..DayConstraints::default()
        };
        assert_eq!(build_time_slots(&c), Err(TimetableError::NoAvailableTime));
    }

    #[test]
    fn zero_periods_and_bad_bounds_are_rejected() {
        assert_eq!(
            build_time_slots(&constraints(0)),
            Err(TimetableError::InvalidPeriods { periods: 0, max: MAX_PERIODS_PER_DAY })
        );
        let c = DayConstraints {
            min_duration: 2.0,
            max_duration: 1.0,
            ..DayConstraints::default()
        };
        assert!(matches!(
            build_time_slots(&c),
            Err(TimetableError::InvalidDurationBounds { .. })
        ));
    }

    #[test]
    fn period_count_is_capped_even_with_no_minimum_duration() {
        let c = DayConstraints {
            periods_per_day: 1_000_000,
            min_duration: 0.0,
            ..DayConstraints::default()
        };
        let err = build_time_slots(&c).unwrap_err();
        assert_eq!(
            err,
            TimetableError::InvalidPeriods {
                periods: 1_000_000,
                max: MAX_PERIODS_PER_DAY,
            }
        );
        assert_eq!(
            err.to_string(),
            "Periods per day must be between 1 and 24, got 1000000"
        );

        // 16 quarter-hour slots before the break, 8 after
        let c = DayConstraints {
            end_time: "3:00 PM".to_string(),
            periods_per_day: MAX_PERIODS_PER_DAY,
            min_duration: 0.0,
            ..DayConstraints::default()
        };
        let slots = build_time_slots(&c).unwrap();
        assert_eq!(slots.len(), MAX_PERIODS_PER_DAY as usize);
        assert_eq!(slots[16].start, hm(13, 0));
        assert_eq!(slots[23].end, hm(15, 0));
    }

    #[test]
    fn bad_clock_string_is_reported_verbatim() {
        let c = DayConstraints {
            break_end: "lunchtime".to_string(),
            ..DayConstraints::default()
        };
        assert_eq!(
            build_time_slots(&c),
            Err(TimetableError::InvalidTimeFormat("lunchtime".to_string()))
        );
    }

    #[test]
    fn uneven_durations_keep_every_invariant() {
        for (periods, max) in [(5, 2.0), (7, 2.0), (4, 2.0)] {
            let c = DayConstraints {
                periods_per_day: periods,
                min_duration: 0.5,
                max_duration: max,
                ..DayConstraints::default()
            };
            let slots = build_time_slots(&c).unwrap();
            assert_slot_invariants(&c, &slots);
        }
    }
}
