use std::sync::Arc;

use api_lib::adapters::MemoryAdapter;
use api_lib::web::{router, state::AppState};
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use chrono::{DateTime, Duration, Utc};
use http_body_util::BodyExt;
use portal_core::{Column, EntityKind, Row};
use tower::ServiceExt;

pub const STUDENT: &str = "S1";

/// Build the full application router over the given in-memory store.
///
/// This is the same route table the `api` binary serves, minus CORS and the
/// Swagger UI.
pub fn build_test_app(store: MemoryAdapter) -> Router {
    let state = AppState::new(Arc::new(store)).expect("portal listings bind");
    router(Arc::new(state))
}

/// A store seeded with a small, deliberately unordered data set for `S1`
/// plus one row belonging to another student.
pub fn seeded_store() -> MemoryAdapter {
    let now = Utc::now();
    MemoryAdapter::new()
        .with_rows(
            EntityKind::Course,
            [
                course("MATH201", "Linear Algebra", 3, Some("B"), 80.0),
                course("CS101", "Intro to Programming", 4, Some("A"), 90.0),
                course("PHYS150", "Mechanics", 4, None, 95.0),
                Row::new()
                    .with(Column::StudentId, "S2")
                    .with(Column::CourseCode, "ART100")
                    .with(Column::CourseName, "Drawing")
                    .with(Column::Credits, 2_i64),
            ],
        )
        .with_rows(
            EntityKind::Assignment,
            [
                assignment(1, "Essay", now + Duration::days(20), "pending"),
                assignment(2, "Problem Set", now + Duration::days(3), "pending"),
                assignment(3, "Lab Report", now + Duration::days(5), "submitted"),
            ],
        )
        .with_rows(
            EntityKind::PastAssignment,
            [
                past_assignment(10, "Quiz 1", "2024-02-01T09:00:00Z", "graded", Some("A")),
                past_assignment(11, "Quiz 2", "2024-03-01T09:00:00Z", "graded", None),
                past_assignment(12, "Draft", "2024-03-10T09:00:00Z", "pending", None),
            ],
        )
        .with_rows(
            EntityKind::Schedule,
            [
                schedule("Wednesday", "09:00", "CS101"),
                schedule("Monday", "13:00", "MATH201"),
                schedule("Monday", "09:00", "PHYS150"),
            ],
        )
        .with_rows(
            EntityKind::ProfilePersonal,
            [Row::new()
                .with(Column::StudentId, STUDENT)
                .with(Column::Name, "Ada Lovelace")
                .with(Column::Email, "ada@example.edu")],
        )
}

fn course(code: &str, name: &str, credits: i64, grade: Option<&str>, attendance: f64) -> Row {
    Row::new()
        .with(Column::StudentId, STUDENT)
        .with(Column::CourseCode, code)
        .with(Column::CourseName, name)
        .with(Column::Credits, credits)
        .with(Column::Grade, grade)
        .with(Column::AttendancePercentage, attendance)
        .with(Column::Instructor, "Dr. Smith")
        .with(Column::Description, format!("About {name}"))
}

fn assignment(id: i64, title: &str, due: DateTime<Utc>, status: &str) -> Row {
    Row::new()
        .with(Column::Id, id)
        .with(Column::StudentId, STUDENT)
        .with(Column::Title, title)
        .with(Column::CourseCode, "CS101")
        .with(Column::CourseName, "Intro to Programming")
        .with(Column::DueDate, due)
        .with(Column::Status, status)
}

fn past_assignment(id: i64, title: &str, due: &str, status: &str, grade: Option<&str>) -> Row {
    let due: DateTime<Utc> = due.parse().expect("valid timestamp");
    Row::new()
        .with(Column::Id, id)
        .with(Column::StudentId, STUDENT)
        .with(Column::Title, title)
        .with(Column::CourseCode, "CS101")
        .with(Column::DueDate, due)
        .with(Column::Status, status)
        .with(Column::Grade, grade)
}

fn schedule(day: &str, time: &str, code: &str) -> Row {
    Row::new()
        .with(Column::StudentId, STUDENT)
        .with(Column::Day, day)
        .with(Column::Time, time)
        .with(Column::CourseCode, code)
}

/// Issue a GET request against the router.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Collect a response body as text, for assertions on field order.
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}
