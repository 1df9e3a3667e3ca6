//! Persistence seam: the `Store` trait and its PostgreSQL and in-memory backends.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::{ensure_database_exists, ensure_tables, PgStore};

use crate::error::AppError;
use crate::model::{Course, CoursePatch, ListFilter, NewCourse, NewStudent, Student, StudentPatch};
use async_trait::async_trait;

/// Relational CRUD over courses, students and their enrollment links.
///
/// Every method is one atomic operation. Lists are ordered by ascending id.
/// `update_*` returns `None` and `delete_*` returns `false` when the id is absent.
#[async_trait]
pub trait Store: Send + Sync {
    /// Cheap liveness check used by `/ready`.
    async fn ping(&self) -> Result<(), AppError>;

    async fn list_courses(&self, filter: &ListFilter) -> Result<Vec<Course>, AppError>;
    async fn get_course(&self, id: i64) -> Result<Option<Course>, AppError>;
    async fn insert_course(&self, new: NewCourse) -> Result<Course, AppError>;
    async fn update_course(&self, id: i64, patch: CoursePatch) -> Result<Option<Course>, AppError>;
    async fn delete_course(&self, id: i64) -> Result<bool, AppError>;
    async fn count_courses(&self) -> Result<u64, AppError>;

    async fn list_students(&self, filter: &ListFilter) -> Result<Vec<Student>, AppError>;
    async fn get_student(&self, id: i64) -> Result<Option<Student>, AppError>;
    async fn insert_student(&self, new: NewStudent) -> Result<Student, AppError>;
    async fn update_student(&self, id: i64, patch: StudentPatch) -> Result<Option<Student>, AppError>;
    /// Removes the student and its enrollment links; courses stay.
    async fn delete_student(&self, id: i64) -> Result<bool, AppError>;
    async fn count_students(&self) -> Result<u64, AppError>;

    /// Ids from `ids` with no matching student, ascending.
    async fn missing_students(&self, ids: &[i64]) -> Result<Vec<i64>, AppError>;
}
