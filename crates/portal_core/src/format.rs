//! crates/portal_core/src/format.rs
//!
//! Shapes raw store rows for the portal pages: canonical date text, the
//! entity's declared ordering, and a couple of presentation-only fields
//! derived from stored ones.

use chrono::{DateTime, Duration, SecondsFormat, Utc, Weekday};
use std::cmp::Ordering;
use tracing::debug;

use crate::domain::{AssignmentStatus, Record, Row, Value};
use crate::projection::Projection;
use crate::schema::{Column, Direction, EntityKind, SortKey, SEMESTER_TERMS};

/// Derived field: share (0-100) of the progress window before the due date
/// that has elapsed. An estimate from the calendar, not stored progress.
pub const PROGRESS_ESTIMATE: &str = "progress_estimate";
/// Derived field: a pending assignment falls due within the next week.
pub const DUE_THIS_WEEK: &str = "due_this_week";

pub const PROGRESS_WINDOW_DAYS: i64 = 14;
pub const UPCOMING_WINDOW_DAYS: i64 = 7;

/// Formats the rows of one listing. `now` is only read by the derived fields.
pub fn format_rows(projection: &Projection, rows: Vec<Row>, now: DateTime<Utc>) -> Vec<Record> {
    let entity = projection.entity();
    let mut rows: Vec<Row> = rows.into_iter().filter(|row| keep(entity, row)).collect();
    rows.sort_by(|a, b| compare_rows(entity.schema().ordering, a, b));
    rows.into_iter()
        .map(|row| format_row(projection, &row, now))
        .collect()
}

fn status_of(row: &Row) -> Option<AssignmentStatus> {
    row.get(Column::Status)
        .and_then(Value::as_text)
        .and_then(|s| s.parse().ok())
}

/// Past records never show work that is still in progress.
fn keep(entity: EntityKind, row: &Row) -> bool {
    if !entity.is_past() {
        return true;
    }
    match status_of(row) {
        Some(status) if !status.is_terminal() => {
            debug!(%entity, %status, "Dropping in-progress row from past listing");
            false
        }
        _ => true,
    }
}

fn compare_rows(ordering: &[SortKey], a: &Row, b: &Row) -> Ordering {
    ordering
        .iter()
        .map(|key| compare_cells(key, a.get(key.column), b.get(key.column)))
        .find(|ord| *ord != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

/// Nulls sort last in either direction.
fn compare_cells(key: &SortKey, a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => match key.column {
            Column::Day => compare_ranked(key.direction, x, y, weekday_rank),
            Column::Semester => compare_ranked(key.direction, x, y, semester_rank),
            _ => directed(key.direction, x.compare(y)),
        },
    }
}

fn directed(direction: Direction, ord: Ordering) -> Ordering {
    match direction {
        Direction::Ascending => ord,
        Direction::Descending => ord.reverse(),
    }
}

fn weekday_rank(value: &Value) -> Option<u32> {
    value
        .as_text()?
        .trim()
        .parse::<Weekday>()
        .ok()
        .map(|day| day.num_days_from_monday())
}

/// Chronological rank of a term label such as `Fall 2024` or `2024 Spring`.
fn semester_rank(value: &Value) -> Option<(i32, usize)> {
    let mut year = None;
    let mut term = None;
    for part in value.as_text()?.split_whitespace() {
        if let Ok(y) = part.parse::<i32>() {
            year = Some(y);
        } else {
            let part = part.to_ascii_lowercase();
            term = Some(SEMESTER_TERMS.iter().position(|t| *t == part)?);
        }
    }
    Some((year?, term?))
}

/// Like nulls, values without a rank sort last in either direction; two of
/// them fall back to their natural order.
fn compare_ranked<K: Ord>(
    direction: Direction,
    a: &Value,
    b: &Value,
    rank: fn(&Value) -> Option<K>,
) -> Ordering {
    match (rank(a), rank(b)) {
        (Some(x), Some(y)) => directed(direction, x.cmp(&y)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => directed(direction, a.compare(b)),
    }
}

fn format_row(projection: &Projection, row: &Row, now: DateTime<Utc>) -> Record {
    let mut record = Record::default();
    for column in projection.columns() {
        let value = row.get(*column).cloned().unwrap_or(Value::Null);
        record.push(column.name(), canonical(*column, value));
    }

    if projection.entity() == EntityKind::Assignment
        && projection.contains(Column::DueDate)
        && projection.contains(Column::Status)
    {
        let pending = status_of(row) == Some(AssignmentStatus::Pending);
        let due = row.get(Column::DueDate).and_then(Value::as_timestamp);

        let progress = match due {
            Some(due) if pending => Value::Integer(progress_estimate(due, now)),
            _ => Value::Null,
        };
        let upcoming = pending
            && due.is_some_and(|due| due >= now && due <= now + Duration::days(UPCOMING_WINDOW_DAYS));

        record.push(PROGRESS_ESTIMATE, progress);
        record.push(DUE_THIS_WEEK, Value::Bool(upcoming));
    }
    record
}

fn canonical(column: Column, value: Value) -> Value {
    match value {
        Value::Timestamp(ts) => Value::Text(ts.to_rfc3339_opts(SecondsFormat::Secs, true)),
        Value::Date(date) => Value::Text(date.format("%Y-%m-%d").to_string()),
        Value::Text(text) if column == Column::Status => match text.parse::<AssignmentStatus>() {
            Ok(status) => Value::Text(status.as_str().to_string()),
            Err(_) => Value::Text(text),
        },
        other => other,
    }
}

fn progress_estimate(due: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let window = Duration::days(PROGRESS_WINDOW_DAYS);
    let elapsed = now - (due - window);
    let share = elapsed.num_seconds() as f64 / window.num_seconds() as f64 * 100.0;
    share.clamp(0.0, 100.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::{ProjectionRegistry, DETAIL, LISTING};
    use chrono::{NaiveDate, TimeZone};

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn projection(entity: EntityKind, view: &str) -> std::sync::Arc<Projection> {
        ProjectionRegistry::portal().unwrap().resolve(entity, view).unwrap()
    }

    fn assignment(id: i64, due: DateTime<Utc>, status: &str) -> Row {
        Row::new()
            .with(Column::Id, id)
            .with(Column::Title, format!("Task {id}"))
            .with(Column::CourseCode, "CS101")
            .with(Column::CourseName, "Intro to CS")
            .with(Column::DueDate, due)
            .with(Column::Status, status)
            .with(Column::Grade, Value::Null)
    }

    fn due_dates(records: &[Record]) -> Vec<&str> {
        records
            .iter()
            .map(|r| r.get("due_date").and_then(Value::as_text).unwrap())
            .collect()
    }

    #[test]
    fn ongoing_assignments_sort_soonest_first() {
        let rows = vec![
            assignment(1, at(2024, 5, 1), "pending"),
            assignment(2, at(2024, 4, 10), "pending"),
            assignment(3, at(2024, 4, 20), "submitted"),
        ];
        let records = format_rows(&projection(EntityKind::Assignment, LISTING), rows, at(2024, 4, 1));
        assert_eq!(
            due_dates(&records),
            ["2024-04-10T00:00:00Z", "2024-04-20T00:00:00Z", "2024-05-01T00:00:00Z"]
        );
    }

    #[test]
    fn past_assignments_sort_most_recent_first() {
        let rows = vec![
            assignment(1, at(2024, 3, 1), "graded"),
            assignment(2, at(2024, 2, 15), "graded"),
        ];
        let records = format_rows(&projection(EntityKind::PastAssignment, LISTING), rows, at(2024, 4, 1));
        assert_eq!(
            due_dates(&records),
            ["2024-03-01T00:00:00Z", "2024-02-15T00:00:00Z"]
        );
    }

    #[test]
    fn graded_row_without_grade_keeps_null_grade() {
        let rows = vec![assignment(7, at(2024, 3, 1), "graded")];
        let records = format_rows(&projection(EntityKind::PastAssignment, LISTING), rows, at(2024, 4, 1));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("grade"), Some(&Value::Null));
        assert_eq!(records[0].get("status"), Some(&Value::from("graded")));
    }

    #[test]
    fn past_listing_drops_in_progress_rows() {
        let rows = vec![
            assignment(1, at(2024, 3, 1), "graded"),
            assignment(2, at(2024, 3, 2), "Pending"),
            assignment(3, at(2024, 3, 3), "submitted"),
        ];
        let records = format_rows(&projection(EntityKind::PastAssignment, LISTING), rows, at(2024, 4, 1));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("id"), Some(&Value::Integer(1)));
    }

    #[test]
    fn fields_follow_projection_then_derived() {
        let rows = vec![assignment(1, at(2024, 5, 1), "PENDING")];
        let records = format_rows(&projection(EntityKind::Assignment, DETAIL), rows, at(2024, 4, 1));
        let names: Vec<&str> = records[0].fields().map(|(n, _)| *n).collect();
        assert_eq!(
            names,
            [
                "id",
                "title",
                "course_code",
                "course_name",
                "due_date",
                "status",
                "grade",
                "description",
                PROGRESS_ESTIMATE,
                DUE_THIS_WEEK
            ]
        );
        assert_eq!(records[0].get("status"), Some(&Value::from("pending")));
        assert_eq!(records[0].get("description"), Some(&Value::Null));
    }

    #[test]
    fn derived_fields_only_for_pending_work() {
        let now = at(2024, 4, 24);
        let rows = vec![
            assignment(1, at(2024, 5, 1), "pending"),
            assignment(2, at(2024, 5, 1), "submitted"),
            assignment(3, at(2024, 6, 1), "pending"),
        ];
        let records = format_rows(&projection(EntityKind::Assignment, LISTING), rows, now);

        // 7 of 14 days elapsed.
        assert_eq!(records[0].get(PROGRESS_ESTIMATE), Some(&Value::Integer(50)));
        assert_eq!(records[0].get(DUE_THIS_WEEK), Some(&Value::Bool(true)));
        assert_eq!(records[1].get(PROGRESS_ESTIMATE), Some(&Value::Null));
        assert_eq!(records[1].get(DUE_THIS_WEEK), Some(&Value::Bool(false)));
        assert_eq!(records[2].get(PROGRESS_ESTIMATE), Some(&Value::Integer(0)));
        assert_eq!(records[2].get(DUE_THIS_WEEK), Some(&Value::Bool(false)));
    }

    #[test]
    fn overdue_pending_work_is_not_upcoming() {
        let rows = vec![assignment(1, at(2024, 4, 1), "pending")];
        let records = format_rows(&projection(EntityKind::Assignment, LISTING), rows, at(2024, 4, 5));
        assert_eq!(records[0].get(PROGRESS_ESTIMATE), Some(&Value::Integer(100)));
        assert_eq!(records[0].get(DUE_THIS_WEEK), Some(&Value::Bool(false)));
    }

    #[test]
    fn schedule_sorts_by_weekday_then_time() {
        let entry = |day: &str, time: &str| {
            Row::new()
                .with(Column::Day, day)
                .with(Column::Time, time)
                .with(Column::CourseCode, "CS101")
        };
        let rows = vec![
            entry("Wednesday", "09:00 - 10:30"),
            entry("Monday", "13:00 - 14:30"),
            entry("Monday", "09:00 - 10:30"),
            entry("Friday", "11:00 - 12:00"),
        ];
        let records = format_rows(&projection(EntityKind::Schedule, LISTING), rows, at(2024, 4, 1));
        let order: Vec<(&str, &str)> = records
            .iter()
            .map(|r| {
                (
                    r.get("day").and_then(Value::as_text).unwrap(),
                    r.get("time").and_then(Value::as_text).unwrap(),
                )
            })
            .collect();
        assert_eq!(
            order,
            [
                ("Monday", "09:00 - 10:30"),
                ("Monday", "13:00 - 14:30"),
                ("Wednesday", "09:00 - 10:30"),
                ("Friday", "11:00 - 12:00"),
            ]
        );
    }

    #[test]
    fn dates_and_null_sort_keys() {
        let event = |title: &str, date: Option<NaiveDate>| {
            Row::new()
                .with(Column::Title, title)
                .with(Column::Date, date)
                .with(Column::Time, "10:00")
        };
        let rows = vec![
            event("unscheduled", None),
            event("fair", NaiveDate::from_ymd_opt(2024, 6, 2)),
            event("orientation", NaiveDate::from_ymd_opt(2024, 5, 20)),
        ];
        let records = format_rows(&projection(EntityKind::ScheduleEvent, LISTING), rows, at(2024, 4, 1));
        let titles: Vec<&str> = records
            .iter()
            .map(|r| r.get("title").and_then(Value::as_text).unwrap())
            .collect();
        assert_eq!(titles, ["orientation", "fair", "unscheduled"]);
        assert_eq!(records[0].get("date"), Some(&Value::from("2024-05-20")));
    }

    #[test]
    fn past_courses_sort_by_most_recent_term() {
        let course = |code: &str, semester: Option<&str>| {
            Row::new()
                .with(Column::CourseCode, code)
                .with(Column::Semester, semester)
        };
        let rows = vec![
            course("CS101", Some("Fall 2023")),
            course("MATH201", Some("Spring 2024")),
            course("PHYS150", Some("Fall 2024")),
            course("ART100", None),
            course("HIST110", Some("Summer 2024")),
            course("BIO120", Some("spring 2024")),
        ];
        let records = format_rows(&projection(EntityKind::PastCourse, LISTING), rows, at(2024, 12, 20));
        let order: Vec<&str> = records
            .iter()
            .map(|r| r.get("course_code").and_then(Value::as_text).unwrap())
            .collect();
        assert_eq!(
            order,
            ["PHYS150", "HIST110", "BIO120", "MATH201", "CS101", "ART100"]
        );
    }

    #[test]
    fn unrecognized_semester_labels_sort_after_known_terms() {
        assert_eq!(semester_rank(&Value::from("Fall 2024")), Some((2024, 3)));
        assert_eq!(semester_rank(&Value::from("2023 Winter")), Some((2023, 0)));
        assert_eq!(semester_rank(&Value::from("Term 3")), None);
        assert_eq!(semester_rank(&Value::from("Fall")), None);
        for direction in [Direction::Ascending, Direction::Descending] {
            assert_eq!(
                compare_ranked(
                    direction,
                    &Value::from("Fall 2020"),
                    &Value::from("Term 3"),
                    semester_rank
                ),
                Ordering::Less
            );
        }
    }
}
