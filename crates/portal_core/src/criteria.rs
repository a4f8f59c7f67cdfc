//! crates/portal_core/src/criteria.rs
//!
//! Turns loosely-typed request parameters into a typed `Criteria` record.
//! Every field of the result is either absent or valid.

use chrono::{NaiveDate, Weekday};
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

use crate::domain::{AssignmentStatus, StudentId};
use crate::error::ValidationError;
use crate::schema::{Column, EntityKind};

/// Inclusive bounds of a range filter. At least one side is present.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds<T> {
    pub min: Option<T>,
    pub max: Option<T>,
}

/// Normalized lookup criteria for one listing query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    pub student_id: Option<StudentId>,
    pub course_code: Option<String>,
    pub course_name: Option<String>,
    pub title: Option<String>,
    pub instructor: Option<String>,
    pub status: Option<AssignmentStatus>,
    pub grade: Option<String>,
    pub semester: Option<String>,
    pub day: Option<Weekday>,
    pub credits: Option<Bounds<i64>>,
    pub attendance: Option<Bounds<f64>>,
    pub due: Option<Bounds<NaiveDate>>,
}

impl Criteria {
    pub fn for_student(student_id: StudentId) -> Self {
        Self {
            student_id: Some(student_id),
            ..Self::default()
        }
    }
}

/// Request parameter names and the column each one constrains.
const PARAMS: &[(&str, Column)] = &[
    ("studentId", Column::StudentId),
    ("courseCode", Column::CourseCode),
    ("courseName", Column::CourseName),
    ("title", Column::Title),
    ("instructor", Column::Instructor),
    ("status", Column::Status),
    ("grade", Column::Grade),
    ("semester", Column::Semester),
    ("day", Column::Day),
    ("minCredits", Column::Credits),
    ("maxCredits", Column::Credits),
    ("minAttendance", Column::AttendancePercentage),
    ("maxAttendance", Column::AttendancePercentage),
    ("dueFrom", Column::DueDate),
    ("dueTo", Column::DueDate),
];

/// Full weekday name as stored in the schedule table.
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Validates `params` against what `entity` can be filtered on.
///
/// Fails on the first offending parameter. Unknown and inapplicable
/// parameters are checked first, in name order, so the reported field does
/// not depend on map iteration order.
pub fn normalize(
    entity: EntityKind,
    params: &HashMap<String, String>,
) -> Result<Criteria, ValidationError> {
    let schema = entity.schema();

    let mut keys: Vec<&String> = params.keys().collect();
    keys.sort();
    for key in keys {
        let column = PARAMS
            .iter()
            .find(|(name, _)| *name == key.as_str())
            .map(|(_, column)| *column)
            .ok_or_else(|| ValidationError::new(key.as_str(), "is not a recognized filter"))?;
        if !schema.filters_on(column) {
            return Err(ValidationError::new(
                key.as_str(),
                format!("cannot be used to filter {entity}"),
            ));
        }
    }

    let reader = ParamReader { params };

    let student_id = match reader.text("studentId") {
        Some(raw) => StudentId::parse(&raw),
        None => None,
    };
    if student_id.is_none() && schema.filters_on(Column::StudentId) {
        return Err(ValidationError::new("studentId", "is required"));
    }

    let status = reader.parsed::<AssignmentStatus>("status", |raw| {
        format!("`{raw}` is not one of pending, submitted, graded")
    })?;
    if entity.is_past() && matches!(status, Some(s) if !s.is_terminal()) {
        return Err(ValidationError::new(
            "status",
            "past assignments are always graded",
        ));
    }

    let day = reader.parsed::<Weekday>("day", |raw| format!("`{raw}` is not a day of the week"))?;

    let credits = reader.range("minCredits", "maxCredits", |key, raw| {
        let n = raw
            .parse::<i64>()
            .map_err(|_| ValidationError::new(key, format!("expected a whole number, got `{raw}`")))?;
        if n < 0 {
            return Err(ValidationError::new(key, "must not be negative"));
        }
        Ok(n)
    })?;

    let attendance = reader.range("minAttendance", "maxAttendance", |key, raw| {
        let n = raw
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| ValidationError::new(key, format!("expected a number, got `{raw}`")))?;
        if !(0.0..=100.0).contains(&n) {
            return Err(ValidationError::new(key, "must be between 0 and 100"));
        }
        Ok(n)
    })?;

    let due = reader.range("dueFrom", "dueTo", |key, raw| {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
            ValidationError::new(key, format!("expected a YYYY-MM-DD date, got `{raw}`"))
        })
    })?;

    Ok(Criteria {
        student_id,
        course_code: reader.text("courseCode"),
        course_name: reader.text("courseName"),
        title: reader.text("title"),
        instructor: reader.text("instructor"),
        status,
        grade: reader.text("grade"),
        semester: reader.text("semester"),
        day,
        credits,
        attendance,
        due,
    })
}

struct ParamReader<'a> {
    params: &'a HashMap<String, String>,
}

impl ParamReader<'_> {
    /// The trimmed value of `key`, treating blank values as absent.
    fn text(&self, key: &str) -> Option<String> {
        self.params
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    fn parsed<T: FromStr>(
        &self,
        key: &str,
        describe: impl Fn(&str) -> String,
    ) -> Result<Option<T>, ValidationError> {
        self.text(key)
            .map(|raw| {
                raw.parse::<T>()
                    .map_err(|_| ValidationError::new(key, describe(&raw)))
            })
            .transpose()
    }

    fn range<T: PartialOrd + Display + Copy>(
        &self,
        min_key: &str,
        max_key: &str,
        parse: impl Fn(&str, &str) -> Result<T, ValidationError>,
    ) -> Result<Option<Bounds<T>>, ValidationError> {
        let min = self.text(min_key).map(|raw| parse(min_key, &raw)).transpose()?;
        let max = self.text(max_key).map(|raw| parse(max_key, &raw)).transpose()?;
        if let (Some(lo), Some(hi)) = (min, max) {
            if lo > hi {
                return Err(ValidationError::new(
                    min_key,
                    format!("{lo} is greater than `{max_key}` ({hi})"),
                ));
            }
        }
        Ok(if min.is_none() && max.is_none() {
            None
        } else {
            Some(Bounds { min, max })
        })
    }
}
