//! crates/portal_core/src/error.rs
//!
//! Error taxonomy for the listing pipeline.

use crate::ports::StoreError;
use crate::schema::{Column, EntityKind};

/// Bad or missing caller input. Surfaced to the caller as a client error and
/// never retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid `{field}`: {reason}")]
pub struct ValidationError {
    /// The request parameter at fault, as the caller spelled it.
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// A programming error in how projections or listings are declared. Raised
/// while registering at startup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("no view `{view}` is registered for {entity}")]
    UnknownView { entity: EntityKind, view: String },
    #[error("view `{view}` for {entity} is already registered")]
    DuplicateView { entity: EntityKind, view: String },
    #[error("view `{view}` for {entity} selects no columns")]
    EmptyProjection { entity: EntityKind, view: String },
    #[error("view `{view}` for {entity} selects `{column}` more than once")]
    DuplicateColumn {
        entity: EntityKind,
        view: String,
        column: Column,
    },
    #[error("view `{view}` selects `{column}`, which {entity} does not have")]
    ForeignColumn {
        entity: EntityKind,
        view: String,
        column: Column,
    },
    #[error("view `{view}` for {entity} omits sort column `{column}`")]
    MissingSortColumn {
        entity: EntityKind,
        view: String,
        column: Column,
    },
}

/// Any failure of a listing request.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
