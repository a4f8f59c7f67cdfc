pub mod criteria;
pub mod domain;
pub mod error;
pub mod format;
pub mod listing;
pub mod ports;
pub mod predicate;
pub mod projection;
pub mod schema;
pub mod summary;

pub use criteria::{normalize, Bounds, Criteria};
pub use domain::{AssignmentStatus, Record, Row, StudentId, Value};
pub use error::{ConfigurationError, QueryError, ValidationError};
pub use listing::{Listing, VIEW_PARAM};
pub use ports::{QueryExecutor, StoreError, StoreResult};
pub use predicate::{compile, Comparison, Condition, Predicate};
pub use projection::{Projection, ProjectionRegistry, DETAIL, LISTING};
pub use schema::{
    Column, ColumnType, Direction, EntityKind, EntitySchema, SortKey, SEMESTER_TERMS,
};
pub use summary::{summarize, AcademicSummary};
