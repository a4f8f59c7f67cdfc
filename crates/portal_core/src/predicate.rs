//! crates/portal_core/src/predicate.rs
//!
//! Compiles normalized criteria into a conjunctive, order-stable predicate.
//! The compiler is a pure function of its input and never touches the store.

use std::cmp::Ordering;

use crate::criteria::{weekday_name, Bounds, Criteria};
use crate::domain::{Row, Value};
use crate::schema::Column;

/// Declared column priority. Conditions are always emitted in this order.
pub const FILTER_PRIORITY: [Column; 12] = [
    Column::StudentId,
    Column::CourseCode,
    Column::Status,
    Column::Semester,
    Column::Day,
    Column::Instructor,
    Column::Grade,
    Column::CourseName,
    Column::Title,
    Column::Credits,
    Column::AttendancePercentage,
    Column::DueDate,
];

/// How a column is compared against its operand(s). Bounds are inclusive.
///
/// Date operands applied to a timestamp column compare against the
/// timestamp's UTC calendar date.
#[derive(Debug, Clone, PartialEq)]
pub enum Comparison {
    Equals(Value),
    /// Case-sensitive substring match.
    Contains(String),
    AtLeast(Value),
    AtMost(Value),
    Between(Value, Value),
}

impl Comparison {
    pub fn matches(&self, value: &Value) -> bool {
        if value.is_null() {
            return false;
        }
        match self {
            Comparison::Equals(expected) => cmp_operand(value, expected) == Ordering::Equal,
            Comparison::Contains(needle) => value
                .as_text()
                .is_some_and(|haystack| haystack.contains(needle.as_str())),
            Comparison::AtLeast(lo) => cmp_operand(value, lo) != Ordering::Less,
            Comparison::AtMost(hi) => cmp_operand(value, hi) != Ordering::Greater,
            Comparison::Between(lo, hi) => {
                cmp_operand(value, lo) != Ordering::Less
                    && cmp_operand(value, hi) != Ordering::Greater
            }
        }
    }
}

fn cmp_operand(value: &Value, operand: &Value) -> Ordering {
    match (value, operand) {
        (Value::Timestamp(ts), Value::Date(d)) => ts.date_naive().cmp(d),
        _ => value.compare(operand),
    }
}

/// A single column-level condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: Column,
    pub comparison: Comparison,
}

/// A conjunction of conditions with at most one condition per column.
/// The empty predicate matches every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    conditions: Vec<Condition>,
}

impl Predicate {
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn is_unconditional(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn condition_for(&self, column: Column) -> Option<&Comparison> {
        self.conditions
            .iter()
            .find(|c| c.column == column)
            .map(|c| &c.comparison)
    }

    /// Evaluates the predicate against a row; a missing column reads as null.
    pub fn matches(&self, row: &Row) -> bool {
        self.conditions.iter().all(|condition| {
            let value = row.get(condition.column).unwrap_or(&Value::Null);
            condition.comparison.matches(value)
        })
    }
}

pub fn compile(criteria: &Criteria) -> Predicate {
    let conditions = FILTER_PRIORITY
        .into_iter()
        .filter_map(|column| {
            comparison_for(criteria, column).map(|comparison| Condition { column, comparison })
        })
        .collect();
    Predicate { conditions }
}

fn comparison_for(criteria: &Criteria, column: Column) -> Option<Comparison> {
    let equals = |text: &Option<String>| text.as_deref().map(|t| Comparison::Equals(t.into()));
    let contains = |text: &Option<String>| text.clone().map(Comparison::Contains);

    match column {
        Column::StudentId => criteria
            .student_id
            .as_ref()
            .map(|id| Comparison::Equals(id.as_str().into())),
        Column::CourseCode => equals(&criteria.course_code),
        Column::Status => criteria
            .status
            .map(|status| Comparison::Equals(status.as_str().into())),
        Column::Semester => equals(&criteria.semester),
        Column::Day => criteria
            .day
            .map(|day| Comparison::Equals(weekday_name(day).into())),
        Column::Instructor => equals(&criteria.instructor),
        Column::Grade => equals(&criteria.grade),
        Column::CourseName => contains(&criteria.course_name),
        Column::Title => contains(&criteria.title),
        Column::Credits => criteria.credits.and_then(range),
        Column::AttendancePercentage => criteria.attendance.and_then(range),
        Column::DueDate => criteria.due.and_then(range),
        _ => None,
    }
}

fn range<T: Into<Value>>(bounds: Bounds<T>) -> Option<Comparison> {
    match (bounds.min, bounds.max) {
        (Some(lo), Some(hi)) => Some(Comparison::Between(lo.into(), hi.into())),
        (Some(lo), None) => Some(Comparison::AtLeast(lo.into())),
        (None, Some(hi)) => Some(Comparison::AtMost(hi.into())),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AssignmentStatus, StudentId};
    use chrono::{NaiveDate, TimeZone, Utc, Weekday};

    fn student(id: &str) -> Criteria {
        Criteria::for_student(StudentId::parse(id).unwrap())
    }

    fn full_criteria() -> Criteria {
        Criteria {
            course_code: Some("CS101".into()),
            course_name: Some("Intro".into()),
            title: Some("Lab".into()),
            instructor: Some("Dr. Smith".into()),
            status: Some(AssignmentStatus::Pending),
            grade: Some("A".into()),
            semester: Some("Fall 2023".into()),
            day: Some(Weekday::Tue),
            credits: Some(Bounds { min: Some(3), max: Some(4) }),
            attendance: Some(Bounds { min: Some(75.0), max: None }),
            due: Some(Bounds {
                min: None,
                max: NaiveDate::from_ymd_opt(2024, 5, 1),
            }),
            ..student("S1")
        }
    }

    #[test]
    fn student_only_compiles_to_single_equals() {
        let predicate = compile(&student("S1"));
        assert_eq!(
            predicate.conditions(),
            &[Condition {
                column: Column::StudentId,
                comparison: Comparison::Equals(Value::from("S1")),
            }]
        );
    }

    #[test]
    fn empty_criteria_is_unconditional() {
        let predicate = compile(&Criteria::default());
        assert!(predicate.is_unconditional());
        assert!(predicate.matches(&Row::new().with(Column::Grade, "F")));
    }

    #[test]
    fn compilation_is_deterministic_and_follows_priority() {
        let criteria = full_criteria();
        let first = compile(&criteria);
        let second = compile(&criteria.clone());
        assert_eq!(first, second);

        let columns: Vec<Column> = first.conditions().iter().map(|c| c.column).collect();
        assert_eq!(columns, FILTER_PRIORITY.to_vec());
    }

    #[test]
    fn ranges_collapse_to_one_condition_per_column() {
        let predicate = compile(&full_criteria());
        assert_eq!(
            predicate.condition_for(Column::Credits),
            Some(&Comparison::Between(Value::Integer(3), Value::Integer(4)))
        );
        assert_eq!(
            predicate.condition_for(Column::AttendancePercentage),
            Some(&Comparison::AtLeast(Value::Float(75.0)))
        );
        assert!(matches!(
            predicate.condition_for(Column::DueDate),
            Some(Comparison::AtMost(Value::Date(_)))
        ));
    }

    #[test]
    fn between_is_inclusive_at_both_bounds() {
        let between = Comparison::Between(Value::Integer(3), Value::Integer(4));
        assert!(between.matches(&Value::Integer(3)));
        assert!(between.matches(&Value::Integer(4)));
        assert!(!between.matches(&Value::Integer(5)));
        assert!(!between.matches(&Value::Null));
    }

    #[test]
    fn date_bounds_compare_calendar_day_of_timestamps() {
        let upto = Comparison::AtMost(Value::Date(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()));
        let late_on_the_day = Utc.with_ymd_and_hms(2024, 5, 1, 23, 59, 0).unwrap();
        let next_day = Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap();
        assert!(upto.matches(&Value::Timestamp(late_on_the_day)));
        assert!(!upto.matches(&Value::Timestamp(next_day)));
    }

    #[test]
    fn contains_is_case_sensitive() {
        let contains = Comparison::Contains("Data".into());
        assert!(contains.matches(&Value::from("Intro to Data Science")));
        assert!(!contains.matches(&Value::from("big data")));
    }
}
