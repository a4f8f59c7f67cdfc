pub mod rest;
pub mod state;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use rest::{
    assignments_handler, assignments_ongoing_handler, assignments_past_handler,
    course_current_handler, course_past_handler, courses_handler, dashboard_summary_handler,
    future_schedule_handler, health_handler, profile_academic_handler, profile_personal_handler,
    schedule_current_handler,
};
use state::AppState;

/// Builds the portal's route table over the shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/course-current", get(course_current_handler))
        .route("/courses", get(courses_handler))
        .route("/course-past", get(course_past_handler))
        .route("/assignments-ongoing", get(assignments_ongoing_handler))
        .route("/assignments", get(assignments_handler))
        .route("/assignments-past", get(assignments_past_handler))
        .route("/schedule-current", get(schedule_current_handler))
        .route("/future-schedule", get(future_schedule_handler))
        .route("/profile-personal", get(profile_personal_handler))
        .route("/profile-academic", get(profile_academic_handler))
        .route("/dashboard-summary", get(dashboard_summary_handler));

    Router::new()
        .nest("/api", api)
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
