//! crates/portal_core/src/ports.rs
//!
//! Defines the contract the listing pipeline calls the relational store
//! through. Adapters (Postgres, in-memory) live outside the core crate.

use async_trait::async_trait;

use crate::domain::Row;
use crate::predicate::Predicate;
use crate::projection::Projection;
use crate::schema::SortKey;

//=========================================================================================
// Store Error and Result Types
//=========================================================================================

/// A failure reported by the store. The core propagates it unchanged and
/// never retries on the adapter's behalf.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Store query timed out")]
    Timeout,
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("An unexpected store error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, StoreError>`.
pub type StoreResult<T> = Result<T, StoreError>;

//=========================================================================================
// Query Executor Port
//=========================================================================================

#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Fetches the rows of `projection.entity()` that satisfy `predicate`,
    /// each holding exactly the projected columns.
    ///
    /// `ordering` is a hint; the formatter applies the declared order again.
    async fn execute(
        &self,
        predicate: &Predicate,
        projection: &Projection,
        ordering: &[SortKey],
    ) -> StoreResult<Vec<Row>>;
}
