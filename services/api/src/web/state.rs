//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the listings each route serves.

use portal_core::{
    ConfigurationError, EntityKind, Listing, ProjectionRegistry, QueryExecutor, DETAIL, LISTING,
};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn QueryExecutor>,
    pub listings: Arc<Listings>,
}

impl AppState {
    /// Binds every route's listing against the portal views. Fails before any
    /// traffic is served if a route names a view that is not registered.
    pub fn new(store: Arc<dyn QueryExecutor>) -> Result<Self, ConfigurationError> {
        let registry = ProjectionRegistry::portal()?;
        Ok(Self {
            store,
            listings: Arc::new(Listings::bind(&registry)?),
        })
    }
}

//=========================================================================================
// Listings (One Per Route)
//=========================================================================================

pub struct Listings {
    pub course_current: Listing,
    pub courses: Listing,
    pub course_past: Listing,
    pub assignments_ongoing: Listing,
    pub assignments: Listing,
    pub assignments_past: Listing,
    pub schedule_current: Listing,
    pub future_schedule: Listing,
    pub profile_personal: Listing,
    pub profile_academic: Listing,
}

impl Listings {
    pub fn bind(registry: &ProjectionRegistry) -> Result<Self, ConfigurationError> {
        Ok(Self {
            course_current: Listing::bind(registry, EntityKind::Course, LISTING, &[DETAIL])?,
            courses: Listing::bind(registry, EntityKind::Course, DETAIL, &[LISTING])?,
            course_past: Listing::bind(registry, EntityKind::PastCourse, LISTING, &[])?,
            assignments_ongoing: Listing::bind(
                registry,
                EntityKind::Assignment,
                LISTING,
                &[DETAIL],
            )?,
            assignments: Listing::bind(registry, EntityKind::Assignment, DETAIL, &[LISTING])?,
            assignments_past: Listing::bind(registry, EntityKind::PastAssignment, LISTING, &[])?,
            schedule_current: Listing::bind(registry, EntityKind::Schedule, LISTING, &[])?,
            future_schedule: Listing::bind(registry, EntityKind::ScheduleEvent, LISTING, &[])?,
            profile_personal: Listing::bind(registry, EntityKind::ProfilePersonal, DETAIL, &[])?,
            profile_academic: Listing::bind(registry, EntityKind::ProfileAcademic, DETAIL, &[])?,
        })
    }
}
