//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `QueryExecutor` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use portal_core::{
    Column, ColumnType, Comparison, Direction, EntityKind, Predicate, Projection, QueryExecutor,
    Row, SortKey, StoreError, StoreResult, Value, SEMESTER_TERMS,
};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row as _};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `QueryExecutor` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
    timeout: Duration,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`. Every query is bounded by `timeout`.
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

//=========================================================================================
// SQL Construction
//=========================================================================================

const WEEKDAYS: &str =
    "ARRAY['Monday','Tuesday','Wednesday','Thursday','Friday','Saturday','Sunday']";

fn ident(column: Column) -> String {
    format!("\"{}\"", column.name())
}

fn sql_type(column_type: ColumnType) -> &'static str {
    match column_type {
        ColumnType::Text => "TEXT",
        ColumnType::Integer => "BIGINT",
        ColumnType::Float => "DOUBLE PRECISION",
        ColumnType::Date => "DATE",
        ColumnType::Timestamp => "TIMESTAMPTZ",
    }
}

/// The left-hand side of a comparison. Date operands against a timestamp
/// column compare the UTC calendar day.
fn operand_target(column: Column, operand: &Value) -> String {
    match (column.column_type(), operand) {
        (ColumnType::Timestamp, Value::Date(_)) => {
            format!("({} AT TIME ZONE 'UTC')::DATE", ident(column))
        }
        _ => ident(column),
    }
}

fn push_value(builder: &mut QueryBuilder<'static, Postgres>, value: &Value) {
    match value.clone() {
        Value::Null => builder.push("NULL"),
        Value::Text(text) => builder.push_bind(text),
        Value::Integer(n) => builder.push_bind(n),
        Value::Float(n) => builder.push_bind(n),
        Value::Bool(b) => builder.push_bind(b),
        Value::Date(date) => builder.push_bind(date),
        Value::Timestamp(ts) => builder.push_bind(ts),
    };
}

/// The expressions one sort key orders by. Weekdays and semester labels sort
/// chronologically rather than alphabetically.
fn sort_targets(column: Column) -> Vec<String> {
    let col = ident(column);
    match column {
        Column::Day => vec![format!("array_position({WEEKDAYS}, {col})")],
        Column::Semester => {
            let terms = SEMESTER_TERMS
                .iter()
                .map(|t| format!("'{t}'"))
                .collect::<Vec<_>>()
                .join(",");
            vec![
                format!("substring({col} from '[0-9]{{4}}')::INT"),
                format!("array_position(ARRAY[{terms}], lower(substring({col} from '[A-Za-z]+')))"),
            ]
        }
        _ => vec![col],
    }
}

/// Builds the SELECT for one listing. Table and column names come from the
/// static schema; every operand is a bound parameter.
pub fn build_select(
    predicate: &Predicate,
    projection: &Projection,
    ordering: &[SortKey],
) -> QueryBuilder<'static, Postgres> {
    let schema = projection.entity().schema();
    let mut builder = QueryBuilder::new("SELECT ");

    let mut select = builder.separated(", ");
    for column in projection.columns() {
        select.push(format!(
            "{}::{} AS {}",
            ident(*column),
            sql_type(column.column_type()),
            ident(*column)
        ));
    }
    builder.push(format!(" FROM {}", schema.table));

    for (i, condition) in predicate.conditions().iter().enumerate() {
        builder.push(if i == 0 { " WHERE " } else { " AND " });
        let column = condition.column;
        match &condition.comparison {
            Comparison::Equals(value) => {
                builder.push(format!("{} = ", operand_target(column, value)));
                push_value(&mut builder, value);
            }
            Comparison::Contains(needle) => {
                builder.push(format!("strpos({}, ", ident(column)));
                builder.push_bind(needle.clone());
                builder.push(") > 0");
            }
            Comparison::AtLeast(value) => {
                builder.push(format!("{} >= ", operand_target(column, value)));
                push_value(&mut builder, value);
            }
            Comparison::AtMost(value) => {
                builder.push(format!("{} <= ", operand_target(column, value)));
                push_value(&mut builder, value);
            }
            Comparison::Between(lo, hi) => {
                builder.push(format!("{} BETWEEN ", operand_target(column, lo)));
                push_value(&mut builder, lo);
                builder.push(" AND ");
                push_value(&mut builder, hi);
            }
        }
    }

    if !ordering.is_empty() {
        builder.push(" ORDER BY ");
        let mut order = builder.separated(", ");
        for key in ordering {
            let direction = match key.direction {
                Direction::Ascending => "ASC",
                Direction::Descending => "DESC",
            };
            for target in sort_targets(key.column) {
                order.push(format!("{target} {direction} NULLS LAST"));
            }
        }
    }
    builder
}

//=========================================================================================
// Row Decoding
//=========================================================================================

fn decode_row(record: &PgRow, projection: &Projection) -> Result<Row, sqlx::Error> {
    let mut row = Row::new();
    for (idx, column) in projection.columns().iter().enumerate() {
        let value = match column.column_type() {
            ColumnType::Text => Value::from(record.try_get::<Option<String>, _>(idx)?),
            ColumnType::Integer => Value::from(record.try_get::<Option<i64>, _>(idx)?),
            ColumnType::Float => Value::from(record.try_get::<Option<f64>, _>(idx)?),
            ColumnType::Date => Value::from(record.try_get::<Option<NaiveDate>, _>(idx)?),
            ColumnType::Timestamp => {
                Value::from(record.try_get::<Option<DateTime<Utc>>, _>(idx)?)
            }
        };
        row.set(*column, value);
    }
    Ok(row)
}

fn to_store_error(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(e.to_string())
        }
        _ => StoreError::Unexpected(e.to_string()),
    }
}

/// Runs one store round-trip within `timeout`. Expiry is `StoreError::Timeout`;
/// the abandoned query is dropped, not retried.
async fn bounded<T>(
    timeout: Duration,
    entity: EntityKind,
    query: impl Future<Output = Result<T, sqlx::Error>>,
) -> StoreResult<T> {
    tokio::time::timeout(timeout, query)
        .await
        .map_err(|_| {
            warn!(
                %entity,
                timeout_ms = timeout.as_millis() as u64,
                "Store query timed out"
            );
            StoreError::Timeout
        })?
        .map_err(to_store_error)
}

//=========================================================================================
// `QueryExecutor` Trait Implementation
//=========================================================================================

#[async_trait]
impl QueryExecutor for DbAdapter {
    async fn execute(
        &self,
        predicate: &Predicate,
        projection: &Projection,
        ordering: &[SortKey],
    ) -> StoreResult<Vec<Row>> {
        let mut builder = build_select(predicate, projection, ordering);
        debug!(sql = builder.sql(), "Executing store query");

        let records = bounded(
            self.timeout,
            projection.entity(),
            builder.build().fetch_all(&self.pool),
        )
        .await?;

        records
            .iter()
            .map(|record| decode_row(record, projection))
            .collect::<Result<Vec<_>, _>>()
            .map_err(to_store_error)
    }
}
