//! crates/portal_core/src/projection.rs
//!
//! The single source of truth for which columns each consumer-facing view of
//! an entity returns. Views are validated when registered so a bad
//! declaration stops the service at startup instead of failing a request.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::ConfigurationError;
use crate::schema::{Column, EntityKind};

pub const LISTING: &str = "listing";
pub const DETAIL: &str = "detail";

/// The exact column set fetched and returned for one `(entity, view)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    entity: EntityKind,
    view: String,
    columns: Vec<Column>,
}

impl Projection {
    pub fn entity(&self) -> EntityKind {
        self.entity
    }

    pub fn view(&self) -> &str {
        &self.view
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn contains(&self, column: Column) -> bool {
        self.columns.contains(&column)
    }
}

#[derive(Debug, Default)]
pub struct ProjectionRegistry {
    views: BTreeMap<(EntityKind, String), Arc<Projection>>,
}

impl ProjectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a view, rejecting empty or duplicate column sets, columns the
    /// entity does not have, views that omit a column the entity sorts by,
    /// and pairs that are already registered.
    pub fn register(
        &mut self,
        entity: EntityKind,
        view: &str,
        columns: &[Column],
    ) -> Result<&mut Self, ConfigurationError> {
        let schema = entity.schema();
        let key = (entity, view.to_string());

        if self.views.contains_key(&key) {
            return Err(ConfigurationError::DuplicateView {
                entity,
                view: view.to_string(),
            });
        }
        if columns.is_empty() {
            return Err(ConfigurationError::EmptyProjection {
                entity,
                view: view.to_string(),
            });
        }
        for (i, column) in columns.iter().enumerate() {
            if !schema.has_column(*column) {
                return Err(ConfigurationError::ForeignColumn {
                    entity,
                    view: view.to_string(),
                    column: *column,
                });
            }
            if columns[..i].contains(column) {
                return Err(ConfigurationError::DuplicateColumn {
                    entity,
                    view: view.to_string(),
                    column: *column,
                });
            }
        }
        if let Some(key) = schema.ordering.iter().find(|k| !columns.contains(&k.column)) {
            return Err(ConfigurationError::MissingSortColumn {
                entity,
                view: view.to_string(),
                column: key.column,
            });
        }

        let projection = Projection {
            entity,
            view: view.to_string(),
            columns: columns.to_vec(),
        };
        self.views.insert(key, Arc::new(projection));
        Ok(self)
    }

    pub fn resolve(
        &self,
        entity: EntityKind,
        view: &str,
    ) -> Result<Arc<Projection>, ConfigurationError> {
        self.views
            .get(&(entity, view.to_string()))
            .cloned()
            .ok_or_else(|| ConfigurationError::UnknownView {
                entity,
                view: view.to_string(),
            })
    }

    pub fn projections(&self) -> impl Iterator<Item = &Projection> {
        self.views.values().map(|p| p.as_ref())
    }

    /// The views the portal pages consume.
    pub fn portal() -> Result<Self, ConfigurationError> {
        use Column::*;

        const COURSE_LISTING: &[Column] = &[
            CourseCode,
            CourseName,
            Credits,
            Grade,
            AttendancePercentage,
            Instructor,
        ];
        const ASSIGNMENT_LISTING: &[Column] =
            &[Id, Title, CourseCode, CourseName, DueDate, Status, Grade];

        let mut registry = Self::new();
        registry
            .register(EntityKind::Course, LISTING, COURSE_LISTING)?
            .register(
                EntityKind::Course,
                DETAIL,
                &[COURSE_LISTING, &[Description][..]].concat(),
            )?
            .register(
                EntityKind::PastCourse,
                LISTING,
                &[CourseCode, CourseName, Credits, Grade, Semester],
            )?
            .register(EntityKind::Assignment, LISTING, ASSIGNMENT_LISTING)?
            .register(
                EntityKind::Assignment,
                DETAIL,
                &[ASSIGNMENT_LISTING, &[Description][..]].concat(),
            )?
            .register(
                EntityKind::PastAssignment,
                LISTING,
                &[Id, Title, CourseCode, DueDate, Status, Grade],
            )?
            .register(
                EntityKind::Schedule,
                LISTING,
                &[Day, Time, CourseCode, CourseName, Instructor, Room],
            )?
            .register(
                EntityKind::ScheduleEvent,
                LISTING,
                &[Title, Date, Time, Location],
            )?
            .register(
                EntityKind::ProfilePersonal,
                DETAIL,
                &[StudentId, Name, Email, Phone, Address, Department, Bio],
            )?
            .register(
                EntityKind::ProfileAcademic,
                DETAIL,
                &[
                    Program,
                    AcademicStatus,
                    EnrollmentStatus,
                    AcademicAdvisor,
                    AdvisorEmail,
                    ExpectedGraduation,
                ],
            )?;
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn portal_views_are_non_empty_and_duplicate_free() {
        let registry = ProjectionRegistry::portal().unwrap();
        let mut count = 0;
        for projection in registry.projections() {
            let unique: HashSet<_> = projection.columns().iter().collect();
            assert!(!projection.columns().is_empty());
            assert_eq!(unique.len(), projection.columns().len(), "{}", projection.view());
            count += 1;
        }
        assert_eq!(count, 10);
    }

    #[test]
    fn unregistered_pair_is_a_configuration_error() {
        let registry = ProjectionRegistry::portal().unwrap();
        let err = registry.resolve(EntityKind::PastCourse, DETAIL).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::UnknownView {
                entity: EntityKind::PastCourse,
                view: DETAIL.to_string(),
            }
        );
    }

    #[test]
    fn resolve_returns_exact_columns() {
        let registry = ProjectionRegistry::portal().unwrap();
        let projection = registry.resolve(EntityKind::PastCourse, LISTING).unwrap();
        assert_eq!(projection.entity(), EntityKind::PastCourse);
        assert_eq!(
            projection.columns(),
            &[
                Column::CourseCode,
                Column::CourseName,
                Column::Credits,
                Column::Grade,
                Column::Semester
            ]
        );
    }

    #[test]
    fn registration_rejects_bad_declarations() {
        let mut registry = ProjectionRegistry::new();
        assert!(matches!(
            registry.register(EntityKind::Course, "empty", &[]),
            Err(ConfigurationError::EmptyProjection { .. })
        ));
        assert!(matches!(
            registry.register(EntityKind::Course, "dup", &[Column::CourseCode, Column::CourseCode]),
            Err(ConfigurationError::DuplicateColumn { .. })
        ));
        assert!(matches!(
            registry.register(EntityKind::Course, "foreign", &[Column::CourseCode, Column::DueDate]),
            Err(ConfigurationError::ForeignColumn { column: Column::DueDate, .. })
        ));
        assert!(matches!(
            registry.register(EntityKind::Assignment, "unsorted", &[Column::Title]),
            Err(ConfigurationError::MissingSortColumn { .. })
        ));

        registry
            .register(EntityKind::Course, "codes", &[Column::CourseCode])
            .unwrap();
        assert!(matches!(
            registry.register(EntityKind::Course, "codes", &[Column::CourseCode]),
            Err(ConfigurationError::DuplicateView { .. })
        ));
    }
}
