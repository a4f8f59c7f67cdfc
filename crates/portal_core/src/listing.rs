//! crates/portal_core/src/listing.rs
//!
//! A listing ties one entity to the views a route offers and runs the whole
//! request pipeline: normalize, compile, project, execute, format.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::debug;

use crate::criteria::normalize;
use crate::domain::Record;
use crate::error::{ConfigurationError, QueryError, ValidationError};
use crate::format::format_rows;
use crate::ports::QueryExecutor;
use crate::predicate::compile;
use crate::projection::{Projection, ProjectionRegistry};
use crate::schema::EntityKind;

/// Reserved request parameter selecting the view.
pub const VIEW_PARAM: &str = "view";

/// The views of one entity a route serves, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Listing {
    entity: EntityKind,
    default_view: Arc<Projection>,
    views: BTreeMap<String, Arc<Projection>>,
}

impl Listing {
    /// Resolves every view up front so an unregistered pair fails here, at
    /// startup, rather than on a request.
    pub fn bind(
        registry: &ProjectionRegistry,
        entity: EntityKind,
        default_view: &str,
        other_views: &[&str],
    ) -> Result<Self, ConfigurationError> {
        let default_projection = registry.resolve(entity, default_view)?;
        let mut views = BTreeMap::new();
        views.insert(default_view.to_string(), default_projection.clone());
        for view in other_views {
            views.insert(view.to_string(), registry.resolve(entity, view)?);
        }
        Ok(Self {
            entity,
            default_view: default_projection,
            views,
        })
    }

    pub fn entity(&self) -> EntityKind {
        self.entity
    }

    pub fn view_names(&self) -> impl Iterator<Item = &str> {
        self.views.keys().map(String::as_str)
    }

    /// The projection for a requested view. Absent or blank means the
    /// default; a view this route does not offer is a caller error.
    pub fn projection_for(&self, view: Option<&str>) -> Result<&Arc<Projection>, ValidationError> {
        match view.map(str::trim).filter(|v| !v.is_empty()) {
            None => Ok(&self.default_view),
            Some(name) => self.views.get(name).ok_or_else(|| {
                let offered: Vec<&str> = self.view_names().collect();
                ValidationError::new(
                    VIEW_PARAM,
                    format!("`{name}` is not one of {}", offered.join(", ")),
                )
            }),
        }
    }

    /// Runs one listing request. Store failures propagate unchanged; nothing
    /// is retried.
    pub async fn run(
        &self,
        executor: &dyn QueryExecutor,
        mut params: HashMap<String, String>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Record>, QueryError> {
        let view = params.remove(VIEW_PARAM);
        let projection = self.projection_for(view.as_deref())?;
        let criteria = normalize(self.entity, &params)?;
        let predicate = compile(&criteria);

        debug!(
            entity = %self.entity,
            view = projection.view(),
            conditions = predicate.conditions().len(),
            "Executing listing query"
        );
        let rows = executor
            .execute(&predicate, projection, self.entity.schema().ordering)
            .await?;
        Ok(format_rows(projection, rows, now))
    }
}
