//! Tabular input and output.
//!
//! Uploads use a fixed four-block CSV layout:
//!
//! ```text
//! StartTime,EndTime,BreakStart,BreakEnd,PeriodsPerDay,MinDuration,MaxDuration
//! 8:00 AM,4:00 PM,12:00 PM,1:00 PM,6,1.0,2.0
//! Course,Lecturer,WeeklyPeriods
//! Algorithms,Dr. Knuth,3
//! ```
//!
//! Fields may be double-quoted; `""` inside a quoted field is a literal quote,
//! and a quoted field may contain line breaks.

use log::debug;

use crate::data::{CourseRequest, DayConstraints, ScheduleRequest, Timetable};
use crate::error::TimetableError;

pub const CONSTRAINTS_HEADER: [&str; 7] = [
    "StartTime",
    "EndTime",
    "BreakStart",
    "BreakEnd",
    "PeriodsPerDay",
    "MinDuration",
    "MaxDuration",
];

pub const COURSES_HEADER: [&str; 3] = ["Course", "Lecturer", "WeeklyPeriods"];

/// Courses pre-filled into the downloadable template.
pub const DEFAULT_COURSES: [(&str, &str, u32); 5] = [
    ("Algorithms", "Dr. Knuth", 3),
    ("Data Structures", "Dr. Cormen", 4),
    ("Operating Systems", "Prof. Tanenbaum", 3),
    ("Database Systems", "Dr. Silberschatz", 3),
    ("Computer Networks", "Prof. Peterson", 3),
];

/// Splits a whole document into trimmed records.
///
/// A quoted field may span lines; `\r\n` and `\n` both end a record outside quotes.
fn parse_records(text: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, in_quotes) {
            ('"', true) if chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            ('"', _) => in_quotes = !in_quotes,
            (',', false) => record.push(std::mem::take(&mut field)),
            ('\r', false) if chars.peek() == Some(&'\n') => {}
            ('\n', false) => {
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            _ => field.push(c),
        }
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }
    records
        .into_iter()
        .map(|r| r.into_iter().map(|f| f.trim().to_string()).collect())
        .collect()
}

fn quote_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn join_record<S: AsRef<str>>(fields: &[S]) -> String {
    fields
        .iter()
        .map(|f| quote_field(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

fn parse_number<T: std::str::FromStr>(field: &str, column: &str) -> Result<T, TimetableError> {
    field
        .parse()
        .map_err(|_| TimetableError::InvalidUpload(format!("{} '{}' is not a number", column, field)))
}

fn field<'a>(record: &'a [String], index: usize, column: &str) -> Result<&'a str, TimetableError> {
    record
        .get(index)
        .map(String::as_str)
        .ok_or_else(|| TimetableError::InvalidUpload(format!("missing {} value", column)))
}

/// Parses an uploaded CSV document into constraints and courses.
pub fn parse_schedule_csv(text: &str) -> Result<ScheduleRequest, TimetableError> {
    let rows = parse_records(text.trim_start_matches('\u{feff}'));
    if rows.len() < 3 {
        return Err(TimetableError::InvalidUpload("invalid file format".to_string()));
    }
    if rows[0] != CONSTRAINTS_HEADER {
        return Err(TimetableError::InvalidUpload("invalid constraints header".to_string()));
    }

    let values = &rows[1];
    let constraints = DayConstraints {
        start_time: field(values, 0, CONSTRAINTS_HEADER[0])?.to_string(),
        end_time: field(values, 1, CONSTRAINTS_HEADER[1])?.to_string(),
        break_start: field(values, 2, CONSTRAINTS_HEADER[2])?.to_string(),
        break_end: field(values, 3, CONSTRAINTS_HEADER[3])?.to_string(),
        periods_per_day: parse_number(field(values, 4, CONSTRAINTS_HEADER[4])?, CONSTRAINTS_HEADER[4])?,
        min_duration: parse_number(field(values, 5, CONSTRAINTS_HEADER[5])?, CONSTRAINTS_HEADER[5])?,
        max_duration: parse_number(field(values, 6, CONSTRAINTS_HEADER[6])?, CONSTRAINTS_HEADER[6])?,
    };

    if rows[2] != COURSES_HEADER {
        return Err(TimetableError::InvalidUpload("invalid courses header".to_string()));
    }

    let mut courses = Vec::new();
    for row in &rows[3..] {
        if row.len() < 3 || row[0].is_empty() {
            continue;
        }
        courses.push(CourseRequest {
            name: row[0].clone(),
            lecturer: row[1].clone(),
            weekly_periods: parse_number(&row[2], COURSES_HEADER[2])?,
        });
    }
    if courses.is_empty() {
        return Err(TimetableError::InvalidUpload("no courses found".to_string()));
    }
    debug!("Parsed upload with {} courses", courses.len());

    Ok(ScheduleRequest {
        constraints,
        courses,
    })
}

/// The downloadable template, pre-filled with the default day and courses.
pub fn template_csv() -> String {
    let c = DayConstraints::default();
    let mut lines = vec![
        join_record(&CONSTRAINTS_HEADER),
        join_record(&[
            c.start_time,
            c.end_time,
            c.break_start,
            c.break_end,
            c.periods_per_day.to_string(),
            format!("{:.1}", c.min_duration),
            format!("{:.1}", c.max_duration),
        ]),
        join_record(&COURSES_HEADER),
    ];
    lines.extend(
        DEFAULT_COURSES
            .iter()
            .map(|(name, lecturer, periods)| {
                join_record(&[*name, *lecturer, periods.to_string().as_str()])
            }),
    );
    lines.join("\n") + "\n"
}

/// Renders the grid with days as columns and slots as rows.
pub fn timetable_to_csv(timetable: &Timetable) -> String {
    let mut header = vec!["Time".to_string()];
    header.extend(timetable.days.iter().cloned());
    let mut lines = vec![join_record(&header)];

    for (slot, row) in timetable.time_slots.iter().zip(&timetable.grid) {
        let mut record = vec![slot.label.clone()];
        record.extend(
            row.iter()
                .map(|cell| cell.as_ref().map(ToString::to_string).unwrap_or_default()),
        );
        lines.push(join_record(&record));
    }
    lines.join("\n") + "\n"
}
