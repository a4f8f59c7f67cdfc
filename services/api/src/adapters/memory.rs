//! services/api/src/adapters/memory.rs
//!
//! An in-process `QueryExecutor` over fixed rows, for exercising the HTTP
//! layer without a database.

use async_trait::async_trait;
use portal_core::{
    EntityKind, Predicate, Projection, QueryExecutor, Row, SortKey, StoreError, StoreResult,
    Value,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Holds complete rows per entity and answers queries by filtering and
/// projecting them. Rows come back in insertion order; ordering is left to
/// the formatter.
#[derive(Default)]
pub struct MemoryAdapter {
    tables: HashMap<EntityKind, Vec<Row>>,
    failure: Option<StoreError>,
    calls: AtomicUsize,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// An adapter whose every query fails with `error`.
    pub fn failing(error: StoreError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    pub fn with_rows(mut self, entity: EntityKind, rows: impl IntoIterator<Item = Row>) -> Self {
        self.tables.entry(entity).or_default().extend(rows);
        self
    }

    /// How many queries have been executed.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueryExecutor for MemoryAdapter {
    async fn execute(
        &self,
        predicate: &Predicate,
        projection: &Projection,
        _ordering: &[SortKey],
    ) -> StoreResult<Vec<Row>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        let rows = self
            .tables
            .get(&projection.entity())
            .map(Vec::as_slice)
            .unwrap_or_default();

        Ok(rows
            .iter()
            .filter(|row| predicate.matches(row))
            .map(|row| {
                projection.columns().iter().fold(Row::new(), |acc, column| {
                    acc.with(*column, row.get(*column).cloned().unwrap_or(Value::Null))
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_core::{compile, normalize, Column, ProjectionRegistry, LISTING};

    #[tokio::test]
    async fn filters_then_projects() {
        let adapter = MemoryAdapter::new().with_rows(
            EntityKind::PastCourse,
            [
                Row::new()
                    .with(Column::StudentId, "S1")
                    .with(Column::CourseCode, "CS101")
                    .with(Column::Semester, "Fall 2023"),
                Row::new()
                    .with(Column::StudentId, "S2")
                    .with(Column::CourseCode, "MATH201")
                    .with(Column::Semester, "Fall 2023"),
            ],
        );
        let registry = ProjectionRegistry::portal().unwrap();
        let projection = registry.resolve(EntityKind::PastCourse, LISTING).unwrap();
        let params = HashMap::from([("studentId".to_string(), "S1".to_string())]);
        let predicate = compile(&normalize(EntityKind::PastCourse, &params).unwrap());

        let rows = adapter.execute(&predicate, &projection, &[]).await.unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get(Column::CourseCode), Some(&Value::from("CS101")));
        assert_eq!(rows[0].get(Column::StudentId), None);
        assert_eq!(rows[0].get(Column::Credits), Some(&Value::Null));
        assert_eq!(adapter.calls(), 1);
    }
}
