//! crates/portal_core/src/schema.rs
//!
//! Static description of the entities the portal reads: which table each one
//! lives in, which columns it has, which of those a caller may filter on, and
//! the order its rows are presented in.

use std::fmt;

/// Every entity kind a listing can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Course,
    PastCourse,
    Assignment,
    PastAssignment,
    Schedule,
    ScheduleEvent,
    ProfilePersonal,
    ProfileAcademic,
}

impl EntityKind {
    pub const ALL: [EntityKind; 8] = [
        EntityKind::Course,
        EntityKind::PastCourse,
        EntityKind::Assignment,
        EntityKind::PastAssignment,
        EntityKind::Schedule,
        EntityKind::ScheduleEvent,
        EntityKind::ProfilePersonal,
        EntityKind::ProfileAcademic,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Course => "course",
            EntityKind::PastCourse => "past_course",
            EntityKind::Assignment => "assignment",
            EntityKind::PastAssignment => "past_assignment",
            EntityKind::Schedule => "schedule",
            EntityKind::ScheduleEvent => "schedule_event",
            EntityKind::ProfilePersonal => "profile_personal",
            EntityKind::ProfileAcademic => "profile_academic",
        }
    }

    /// Past-record entities never show rows that are still in progress.
    pub fn is_past(self) -> bool {
        matches!(self, EntityKind::PastCourse | EntityKind::PastAssignment)
    }

    pub fn schema(self) -> &'static EntitySchema {
        match self {
            EntityKind::Course => &COURSE,
            EntityKind::PastCourse => &PAST_COURSE,
            EntityKind::Assignment => &ASSIGNMENT,
            EntityKind::PastAssignment => &PAST_ASSIGNMENT,
            EntityKind::Schedule => &SCHEDULE,
            EntityKind::ScheduleEvent => &SCHEDULE_EVENT,
            EntityKind::ProfilePersonal => &PROFILE_PERSONAL,
            EntityKind::ProfileAcademic => &PROFILE_ACADEMIC,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The storage type of a column, used by adapters to decode values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Integer,
    Float,
    Date,
    Timestamp,
}

/// Every column known to the portal schema. The output field name of a
/// column is its snake_case database name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    Id,
    StudentId,
    Title,
    CourseCode,
    CourseName,
    Credits,
    Grade,
    AttendancePercentage,
    Instructor,
    Description,
    Semester,
    DueDate,
    Status,
    Day,
    Time,
    Room,
    Date,
    Location,
    Name,
    Email,
    Phone,
    Address,
    Department,
    Bio,
    Program,
    AcademicStatus,
    EnrollmentStatus,
    AcademicAdvisor,
    AdvisorEmail,
    ExpectedGraduation,
}

impl Column {
    pub fn name(self) -> &'static str {
        match self {
            Column::Id => "id",
            Column::StudentId => "student_id",
            Column::Title => "title",
            Column::CourseCode => "course_code",
            Column::CourseName => "course_name",
            Column::Credits => "credits",
            Column::Grade => "grade",
            Column::AttendancePercentage => "attendance_percentage",
            Column::Instructor => "instructor",
            Column::Description => "description",
            Column::Semester => "semester",
            Column::DueDate => "due_date",
            Column::Status => "status",
            Column::Day => "day",
            Column::Time => "time",
            Column::Room => "room",
            Column::Date => "date",
            Column::Location => "location",
            Column::Name => "name",
            Column::Email => "email",
            Column::Phone => "phone",
            Column::Address => "address",
            Column::Department => "department",
            Column::Bio => "bio",
            Column::Program => "program",
            Column::AcademicStatus => "academic_status",
            Column::EnrollmentStatus => "enrollment_status",
            Column::AcademicAdvisor => "academic_advisor",
            Column::AdvisorEmail => "advisor_email",
            Column::ExpectedGraduation => "expected_graduation",
        }
    }

    pub fn column_type(self) -> ColumnType {
        match self {
            Column::Id | Column::Credits => ColumnType::Integer,
            Column::AttendancePercentage => ColumnType::Float,
            Column::DueDate => ColumnType::Timestamp,
            Column::Date => ColumnType::Date,
            _ => ColumnType::Text,
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Academic terms in calendar order, as they appear in semester labels
/// (`Fall 2024`), lowercased.
pub const SEMESTER_TERMS: [&str; 4] = ["winter", "spring", "summer", "fall"];

/// One component of an entity's declared presentation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub column: Column,
    pub direction: Direction,
}

impl SortKey {
    pub const fn asc(column: Column) -> Self {
        Self {
            column,
            direction: Direction::Ascending,
        }
    }

    pub const fn desc(column: Column) -> Self {
        Self {
            column,
            direction: Direction::Descending,
        }
    }
}

/// Static metadata for one entity kind.
#[derive(Debug)]
pub struct EntitySchema {
    pub kind: EntityKind,
    pub table: &'static str,
    pub columns: &'static [Column],
    pub filters: &'static [Column],
    pub ordering: &'static [SortKey],
}

impl EntitySchema {
    pub fn has_column(&self, column: Column) -> bool {
        self.columns.contains(&column)
    }

    pub fn filters_on(&self, column: Column) -> bool {
        self.filters.contains(&column)
    }
}

//=========================================================================================
// Entity Definitions
//=========================================================================================

static COURSE: EntitySchema = EntitySchema {
    kind: EntityKind::Course,
    table: "courses_current",
    columns: &[
        Column::StudentId,
        Column::CourseCode,
        Column::CourseName,
        Column::Credits,
        Column::Grade,
        Column::AttendancePercentage,
        Column::Instructor,
        Column::Description,
    ],
    filters: &[
        Column::StudentId,
        Column::CourseCode,
        Column::CourseName,
        Column::Instructor,
        Column::Grade,
        Column::Credits,
        Column::AttendancePercentage,
    ],
    ordering: &[SortKey::asc(Column::CourseCode)],
};

static PAST_COURSE: EntitySchema = EntitySchema {
    kind: EntityKind::PastCourse,
    table: "courses_past",
    columns: &[
        Column::StudentId,
        Column::CourseCode,
        Column::CourseName,
        Column::Credits,
        Column::Grade,
        Column::Semester,
    ],
    filters: &[
        Column::StudentId,
        Column::CourseCode,
        Column::CourseName,
        Column::Grade,
        Column::Semester,
        Column::Credits,
    ],
    ordering: &[SortKey::desc(Column::Semester), SortKey::asc(Column::CourseCode)],
};

static ASSIGNMENT: EntitySchema = EntitySchema {
    kind: EntityKind::Assignment,
    table: "assignments",
    columns: &[
        Column::Id,
        Column::StudentId,
        Column::Title,
        Column::CourseCode,
        Column::CourseName,
        Column::DueDate,
        Column::Status,
        Column::Grade,
        Column::Description,
    ],
    filters: &[
        Column::StudentId,
        Column::CourseCode,
        Column::Status,
        Column::Grade,
        Column::CourseName,
        Column::Title,
        Column::DueDate,
    ],
    ordering: &[SortKey::asc(Column::DueDate), SortKey::asc(Column::Id)],
};

static PAST_ASSIGNMENT: EntitySchema = EntitySchema {
    kind: EntityKind::PastAssignment,
    table: "assignments_past",
    columns: &[
        Column::Id,
        Column::StudentId,
        Column::Title,
        Column::CourseCode,
        Column::DueDate,
        Column::Status,
        Column::Grade,
    ],
    filters: &[
        Column::StudentId,
        Column::CourseCode,
        Column::Status,
        Column::Grade,
        Column::Title,
        Column::DueDate,
    ],
    ordering: &[SortKey::desc(Column::DueDate), SortKey::asc(Column::Id)],
};

static SCHEDULE: EntitySchema = EntitySchema {
    kind: EntityKind::Schedule,
    table: "schedule_current",
    columns: &[
        Column::StudentId,
        Column::Day,
        Column::Time,
        Column::CourseCode,
        Column::CourseName,
        Column::Instructor,
        Column::Room,
    ],
    filters: &[
        Column::StudentId,
        Column::CourseCode,
        Column::Day,
        Column::Instructor,
        Column::CourseName,
    ],
    ordering: &[SortKey::asc(Column::Day), SortKey::asc(Column::Time)],
};

static SCHEDULE_EVENT: EntitySchema = EntitySchema {
    kind: EntityKind::ScheduleEvent,
    table: "schedule_events",
    columns: &[
        Column::StudentId,
        Column::Title,
        Column::Date,
        Column::Time,
        Column::Location,
    ],
    filters: &[Column::StudentId, Column::Title],
    ordering: &[SortKey::asc(Column::Date), SortKey::asc(Column::Time)],
};

static PROFILE_PERSONAL: EntitySchema = EntitySchema {
    kind: EntityKind::ProfilePersonal,
    table: "profile_personal",
    columns: &[
        Column::StudentId,
        Column::Name,
        Column::Email,
        Column::Phone,
        Column::Address,
        Column::Department,
        Column::Bio,
    ],
    filters: &[Column::StudentId],
    ordering: &[],
};

static PROFILE_ACADEMIC: EntitySchema = EntitySchema {
    kind: EntityKind::ProfileAcademic,
    table: "profile_academic",
    columns: &[
        Column::StudentId,
        Column::Program,
        Column::AcademicStatus,
        Column::EnrollmentStatus,
        Column::AcademicAdvisor,
        Column::AdvisorEmail,
        Column::ExpectedGraduation,
    ],
    filters: &[Column::StudentId],
    ordering: &[],
};
