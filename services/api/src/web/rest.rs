//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the portal's REST endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::state::AppState;
use axum::{
    extract::{FromRequestParts, Query, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Json, Response},
};
use chrono::{SecondsFormat, Utc};
use portal_core::{summarize, Listing, QueryError, Record, ValidationError, Value};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error};
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        course_current_handler,
        courses_handler,
        course_past_handler,
        assignments_ongoing_handler,
        assignments_handler,
        assignments_past_handler,
        schedule_current_handler,
        future_schedule_handler,
        profile_personal_handler,
        profile_academic_handler,
        dashboard_summary_handler,
        health_handler,
    ),
    components(
        schemas(ErrorResponse, DashboardSummaryResponse)
    ),
    tags(
        (name = "Student Portal API", description = "Read-only listings behind the student dashboard.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// The body of every failed request.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    /// The request parameter at fault, for validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

type Failure = (StatusCode, Json<ErrorResponse>);

fn bad_request(field: &str, message: String) -> Failure {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message,
            field: Some(field.to_string()),
        }),
    )
}

fn internal_error() -> Failure {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "Internal server error".to_string(),
            field: None,
        }),
    )
}

/// Maps a listing failure to its HTTP response. Store and configuration
/// details are logged, never sent to the client.
pub fn failure_response(err: QueryError) -> Failure {
    match err {
        QueryError::Validation(e) => {
            debug!(field = %e.field, reason = %e.reason, "Rejected listing request");
            bad_request(&e.field, e.to_string())
        }
        QueryError::Store(e) => {
            error!("Listing query failed: {:?}", e);
            internal_error()
        }
        QueryError::Configuration(e) => {
            error!("Listing misconfigured: {:?}", e);
            internal_error()
        }
    }
}

/// A formatted record, serialized as a JSON object in field order.
pub struct RecordBody(pub Record);

impl Serialize for RecordBody {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in self.0.fields() {
            map.serialize_entry(name, &ValueBody(value))?;
        }
        map.end()
    }
}

struct ValueBody<'a>(&'a Value);

impl Serialize for ValueBody<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Value::Null => serializer.serialize_none(),
            Value::Text(text) => serializer.serialize_str(text),
            Value::Integer(n) => serializer.serialize_i64(*n),
            Value::Float(n) => serializer.serialize_f64(*n),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Date(date) => serializer.collect_str(&date.format("%Y-%m-%d")),
            Value::Timestamp(ts) => {
                serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Secs, true))
            }
        }
    }
}

/// Headline numbers for the dashboard.
#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardSummaryResponse {
    /// Credit-weighted GPA over letter-graded current courses.
    pub gpa: f64,
    pub total_credits: i64,
    /// Mean attendance percentage, rounded.
    pub average_attendance: i64,
    /// Pending assignments due within the next seven days.
    pub upcoming_assignments: usize,
}

//=========================================================================================
// Extractors
//=========================================================================================

/// The raw query string parameters of a listing request. Each name may
/// appear once; a repeated name is rejected rather than resolved.
pub struct FilterParams(pub HashMap<String, String>);

impl<S: Send + Sync> FromRequestParts<S> for FilterParams {
    type Rejection = Failure;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(pairs) = Query::<Vec<(String, String)>>::from_request_parts(parts, state)
            .await
            .map_err(|e| bad_request("query", e.body_text()))?;

        let mut params = HashMap::with_capacity(pairs.len());
        for (key, value) in pairs {
            if params.contains_key(&key) {
                let err = ValidationError::new(key, "must not be repeated");
                return Err(failure_response(err.into()));
            }
            params.insert(key, value);
        }
        Ok(Self(params))
    }
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

async fn list(
    state: &AppState,
    listing: &Listing,
    params: HashMap<String, String>,
) -> Result<Json<Vec<RecordBody>>, Failure> {
    let records = listing
        .run(state.store.as_ref(), params, Utc::now())
        .await
        .map_err(failure_response)?;
    debug!(entity = %listing.entity(), rows = records.len(), "Served listing");
    Ok(Json(records.into_iter().map(RecordBody).collect()))
}

/// Serves a single-row listing as one object, or 404 when the row is absent.
async fn single(
    state: &AppState,
    listing: &Listing,
    params: HashMap<String, String>,
    missing: &str,
) -> Result<Response, Failure> {
    let Json(mut rows) = list(state, listing, params).await?;
    if rows.is_empty() {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: missing.to_string(),
                field: None,
            }),
        ));
    }
    Ok(Json(rows.swap_remove(0)).into_response())
}

/// List the student's current courses.
#[utoipa::path(
    get,
    path = "/api/course-current",
    params(
        ("studentId" = String, Query, description = "The student whose courses to list."),
        ("view" = Option<String>, Query, description = "`listing` (default) or `detail`."),
        ("courseCode" = Option<String>, Query, description = "Exact course code."),
        ("courseName" = Option<String>, Query, description = "Substring of the course name."),
        ("instructor" = Option<String>, Query, description = "Exact instructor name."),
        ("grade" = Option<String>, Query, description = "Exact grade."),
        ("minCredits" = Option<i64>, Query, description = "Inclusive lower credit bound."),
        ("maxCredits" = Option<i64>, Query, description = "Inclusive upper credit bound."),
        ("minAttendance" = Option<f64>, Query, description = "Inclusive lower attendance bound (0-100)."),
        ("maxAttendance" = Option<f64>, Query, description = "Inclusive upper attendance bound (0-100)."),
    ),
    responses(
        (status = 200, description = "Courses ordered by course code"),
        (status = 400, description = "Invalid or missing parameter", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn course_current_handler(
    State(state): State<Arc<AppState>>,
    FilterParams(params): FilterParams,
) -> Result<Json<Vec<RecordBody>>, Failure> {
    list(&state, &state.listings.course_current, params).await
}

/// List current courses with descriptions. Accepts the same filters as
/// `/api/course-current`.
#[utoipa::path(
    get,
    path = "/api/courses",
    params(
        ("studentId" = String, Query, description = "The student whose courses to list."),
        ("view" = Option<String>, Query, description = "`detail` (default) or `listing`."),
    ),
    responses(
        (status = 200, description = "Courses ordered by course code"),
        (status = 400, description = "Invalid or missing parameter", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn courses_handler(
    State(state): State<Arc<AppState>>,
    FilterParams(params): FilterParams,
) -> Result<Json<Vec<RecordBody>>, Failure> {
    list(&state, &state.listings.courses, params).await
}

/// List the student's completed courses.
#[utoipa::path(
    get,
    path = "/api/course-past",
    params(
        ("studentId" = String, Query, description = "The student whose courses to list."),
        ("courseCode" = Option<String>, Query, description = "Exact course code."),
        ("courseName" = Option<String>, Query, description = "Substring of the course name."),
        ("semester" = Option<String>, Query, description = "Exact semester label."),
        ("grade" = Option<String>, Query, description = "Exact grade."),
        ("minCredits" = Option<i64>, Query, description = "Inclusive lower credit bound."),
        ("maxCredits" = Option<i64>, Query, description = "Inclusive upper credit bound."),
    ),
    responses(
        (status = 200, description = "Courses, most recent semester first"),
        (status = 400, description = "Invalid or missing parameter", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn course_past_handler(
    State(state): State<Arc<AppState>>,
    FilterParams(params): FilterParams,
) -> Result<Json<Vec<RecordBody>>, Failure> {
    list(&state, &state.listings.course_past, params).await
}

/// List ongoing assignments, soonest due first.
///
/// Pending rows carry a `progress_estimate` derived from the calendar and a
/// `due_this_week` flag.
#[utoipa::path(
    get,
    path = "/api/assignments-ongoing",
    params(
        ("studentId" = String, Query, description = "The student whose assignments to list."),
        ("view" = Option<String>, Query, description = "`listing` (default) or `detail`."),
        ("courseCode" = Option<String>, Query, description = "Exact course code."),
        ("status" = Option<String>, Query, description = "pending, submitted or graded."),
        ("title" = Option<String>, Query, description = "Substring of the title."),
        ("dueFrom" = Option<String>, Query, description = "Inclusive earliest due date, YYYY-MM-DD."),
        ("dueTo" = Option<String>, Query, description = "Inclusive latest due date, YYYY-MM-DD."),
    ),
    responses(
        (status = 200, description = "Assignments ordered by ascending due date"),
        (status = 400, description = "Invalid or missing parameter", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn assignments_ongoing_handler(
    State(state): State<Arc<AppState>>,
    FilterParams(params): FilterParams,
) -> Result<Json<Vec<RecordBody>>, Failure> {
    list(&state, &state.listings.assignments_ongoing, params).await
}

/// List ongoing assignments with descriptions. Accepts the same filters as
/// `/api/assignments-ongoing`.
#[utoipa::path(
    get,
    path = "/api/assignments",
    params(
        ("studentId" = String, Query, description = "The student whose assignments to list."),
        ("view" = Option<String>, Query, description = "`detail` (default) or `listing`."),
    ),
    responses(
        (status = 200, description = "Assignments ordered by ascending due date"),
        (status = 400, description = "Invalid or missing parameter", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn assignments_handler(
    State(state): State<Arc<AppState>>,
    FilterParams(params): FilterParams,
) -> Result<Json<Vec<RecordBody>>, Failure> {
    list(&state, &state.listings.assignments, params).await
}

/// List past assignments, most recently due first.
#[utoipa::path(
    get,
    path = "/api/assignments-past",
    params(
        ("studentId" = String, Query, description = "The student whose assignments to list."),
        ("courseCode" = Option<String>, Query, description = "Exact course code."),
        ("grade" = Option<String>, Query, description = "Exact grade."),
        ("title" = Option<String>, Query, description = "Substring of the title."),
        ("dueFrom" = Option<String>, Query, description = "Inclusive earliest due date, YYYY-MM-DD."),
        ("dueTo" = Option<String>, Query, description = "Inclusive latest due date, YYYY-MM-DD."),
    ),
    responses(
        (status = 200, description = "Graded assignments ordered by descending due date"),
        (status = 400, description = "Invalid or missing parameter", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn assignments_past_handler(
    State(state): State<Arc<AppState>>,
    FilterParams(params): FilterParams,
) -> Result<Json<Vec<RecordBody>>, Failure> {
    list(&state, &state.listings.assignments_past, params).await
}

/// The student's weekly class timetable.
#[utoipa::path(
    get,
    path = "/api/schedule-current",
    params(
        ("studentId" = String, Query, description = "The student whose timetable to list."),
        ("day" = Option<String>, Query, description = "Day of the week."),
        ("courseCode" = Option<String>, Query, description = "Exact course code."),
        ("instructor" = Option<String>, Query, description = "Exact instructor name."),
    ),
    responses(
        (status = 200, description = "Entries ordered Monday first, then by time"),
        (status = 400, description = "Invalid or missing parameter", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn schedule_current_handler(
    State(state): State<Arc<AppState>>,
    FilterParams(params): FilterParams,
) -> Result<Json<Vec<RecordBody>>, Failure> {
    list(&state, &state.listings.schedule_current, params).await
}

/// Upcoming one-off events on the student's calendar.
#[utoipa::path(
    get,
    path = "/api/future-schedule",
    params(
        ("studentId" = String, Query, description = "The student whose events to list."),
        ("title" = Option<String>, Query, description = "Substring of the event title."),
    ),
    responses(
        (status = 200, description = "Events ordered by date"),
        (status = 400, description = "Invalid or missing parameter", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn future_schedule_handler(
    State(state): State<Arc<AppState>>,
    FilterParams(params): FilterParams,
) -> Result<Json<Vec<RecordBody>>, Failure> {
    list(&state, &state.listings.future_schedule, params).await
}

/// The student's personal profile.
#[utoipa::path(
    get,
    path = "/api/profile-personal",
    params(
        ("studentId" = String, Query, description = "The student to look up."),
    ),
    responses(
        (status = 200, description = "Personal profile"),
        (status = 400, description = "Missing studentId", body = ErrorResponse),
        (status = 404, description = "No profile for this student", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn profile_personal_handler(
    State(state): State<Arc<AppState>>,
    FilterParams(params): FilterParams,
) -> Result<Response, Failure> {
    single(&state, &state.listings.profile_personal, params, "Profile not found").await
}

/// The student's academic standing and advisor.
#[utoipa::path(
    get,
    path = "/api/profile-academic",
    params(
        ("studentId" = String, Query, description = "The student to look up."),
    ),
    responses(
        (status = 200, description = "Academic profile"),
        (status = 400, description = "Missing studentId", body = ErrorResponse),
        (status = 404, description = "No academic profile for this student", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn profile_academic_handler(
    State(state): State<Arc<AppState>>,
    FilterParams(params): FilterParams,
) -> Result<Response, Failure> {
    single(
        &state,
        &state.listings.profile_academic,
        params,
        "Academic profile not found",
    )
    .await
}

/// Headline metrics for the dashboard: GPA, credits, attendance and the
/// number of pending assignments due this week.
#[utoipa::path(
    get,
    path = "/api/dashboard-summary",
    params(
        ("studentId" = String, Query, description = "The student to summarize."),
    ),
    responses(
        (status = 200, description = "Dashboard summary", body = DashboardSummaryResponse),
        (status = 400, description = "Missing studentId", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn dashboard_summary_handler(
    State(state): State<Arc<AppState>>,
    FilterParams(params): FilterParams,
) -> Result<Json<DashboardSummaryResponse>, Failure> {
    let scoped: HashMap<String, String> = params
        .into_iter()
        .filter(|(key, _)| key == "studentId")
        .collect();
    let now = Utc::now();
    let store = state.store.as_ref();

    let (courses, assignments) = tokio::try_join!(
        state.listings.course_current.run(store, scoped.clone(), now),
        state.listings.assignments_ongoing.run(store, scoped, now),
    )
    .map_err(failure_response)?;

    let summary = summarize(&courses, &assignments);
    Ok(Json(DashboardSummaryResponse {
        gpa: summary.gpa,
        total_credits: summary.total_credits,
        average_attendance: summary.average_attendance,
        upcoming_assignments: summary.upcoming_assignments,
    }))
}

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up")
    )
)]
pub async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}
