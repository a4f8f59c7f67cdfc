//! crates/portal_core/src/summary.rs
//!
//! Dashboard headline metrics computed from formatted course and assignment
//! records.

use crate::domain::{Record, Value};
use crate::format::DUE_THIS_WEEK;

#[derive(Debug, Clone, PartialEq)]
pub struct AcademicSummary {
    /// Credit-weighted over letter-graded courses, two decimals.
    pub gpa: f64,
    pub total_credits: i64,
    pub average_attendance: i64,
    pub upcoming_assignments: usize,
}

/// Grade points for letter grades. Anything else (pending, pass/fail,
/// numeric scores) does not count toward the GPA.
pub fn grade_points(grade: &str) -> Option<f64> {
    let points = match grade.trim() {
        "A" => 4.0,
        "A-" => 3.7,
        "B+" => 3.3,
        "B" => 3.0,
        "B-" => 2.7,
        "C+" => 2.3,
        "C" => 2.0,
        "C-" => 1.7,
        "D+" => 1.3,
        "D" => 1.0,
        "D-" => 0.7,
        "F" => 0.0,
        _ => return None,
    };
    Some(points)
}

pub fn summarize(courses: &[Record], assignments: &[Record]) -> AcademicSummary {
    let credits_of = |course: &Record| course.get("credits").and_then(Value::as_i64).unwrap_or(0);

    let (points, graded_credits) = courses
        .iter()
        .filter_map(|course| {
            let grade = course.get("grade").and_then(Value::as_text)?;
            Some((grade_points(grade)?, credits_of(course)))
        })
        .fold((0.0, 0_i64), |(points, credits), (grade, c)| {
            (points + grade * c as f64, credits + c)
        });
    let gpa = if graded_credits > 0 {
        (points / graded_credits as f64 * 100.0).round() / 100.0
    } else {
        0.0
    };

    let total_credits = courses.iter().map(credits_of).sum();

    let attendance: Vec<f64> = courses
        .iter()
        .filter_map(|course| course.get("attendance_percentage").and_then(Value::as_f64))
        .collect();
    let average_attendance = if attendance.is_empty() {
        0
    } else {
        (attendance.iter().sum::<f64>() / attendance.len() as f64).round() as i64
    };

    let upcoming_assignments = assignments
        .iter()
        .filter(|a| a.get(DUE_THIS_WEEK).and_then(Value::as_bool) == Some(true))
        .count();

    AcademicSummary {
        gpa,
        total_credits,
        average_attendance,
        upcoming_assignments,
    }
}
