//! Course and student operations over any `Store`.

use crate::error::AppError;
use crate::model::{Course, CoursePatch, ListFilter, NewCourse, NewStudent, Student, StudentPatch};
use crate::store::Store;

pub struct CourseService;

impl CourseService {
    pub async fn list(store: &dyn Store, filter: &ListFilter) -> Result<Vec<Course>, AppError> {
        store.list_courses(filter).await
    }

    pub async fn read(store: &dyn Store, id: i64) -> Result<Course, AppError> {
        store
            .get_course(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("course {}", id)))
    }

    /// Insert a course; every referenced student must already exist.
    pub async fn create(store: &dyn Store, new: NewCourse) -> Result<Course, AppError> {
        ensure_students_exist(store, &new.students).await?;
        let course = store.insert_course(new).await?;
        tracing::info!(course_id = course.id, students = course.students.len(), "course created");
        Ok(course)
    }

    /// A missing course is reported before any problem with the patch's students.
    pub async fn update(store: &dyn Store, id: i64, patch: CoursePatch) -> Result<Course, AppError> {
        if let Some(students) = &patch.students {
            Self::read(store, id).await?;
            ensure_students_exist(store, students).await?;
        }
        let course = store
            .update_course(id, patch)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("course {}", id)))?;
        tracing::info!(course_id = id, "course updated");
        Ok(course)
    }

    pub async fn delete(store: &dyn Store, id: i64) -> Result<(), AppError> {
        if !store.delete_course(id).await? {
            return Err(AppError::NotFound(format!("course {}", id)));
        }
        tracing::info!(course_id = id, "course deleted");
        Ok(())
    }
}

pub struct StudentService;

impl StudentService {
    pub async fn list(store: &dyn Store, filter: &ListFilter) -> Result<Vec<Student>, AppError> {
        store.list_students(filter).await
    }

    pub async fn read(store: &dyn Store, id: i64) -> Result<Student, AppError> {
        store
            .get_student(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("student {}", id)))
    }

    pub async fn create(store: &dyn Store, new: NewStudent) -> Result<Student, AppError> {
        let student = store.insert_student(new).await?;
        tracing::info!(student_id = student.id, "student created");
        Ok(student)
    }

    pub async fn update(store: &dyn Store, id: i64, patch: StudentPatch) -> Result<Student, AppError> {
        let student = store
            .update_student(id, patch)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("student {}", id)))?;
        tracing::info!(student_id = id, "student updated");
        Ok(student)
    }

    /// Delete a student; courses it was enrolled in lose the link.
    pub async fn delete(store: &dyn Store, id: i64) -> Result<(), AppError> {
        if !store.delete_student(id).await? {
            return Err(AppError::NotFound(format!("student {}", id)));
        }
        tracing::info!(student_id = id, "student deleted");
        Ok(())
    }
}

async fn ensure_students_exist(store: &dyn Store, ids: &[i64]) -> Result<(), AppError> {
    let missing = store.missing_students(ids).await?;
    if !missing.is_empty() {
        return Err(AppError::Validation(format!("unknown student ids: {:?}", missing)));
    }
    Ok(())
}
