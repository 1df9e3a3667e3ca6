//! In-process store: ordered maps behind one async lock.

use super::Store;
use crate::error::AppError;
use crate::model::{normalize_ids, Course, CoursePatch, ListFilter, NewCourse, NewStudent, Student, StudentPatch};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    courses: BTreeMap<i64, CourseRow>,
    students: BTreeMap<i64, Student>,
    next_course_id: i64,
    next_student_id: i64,
}

struct CourseRow {
    name: String,
    students: BTreeSet<i64>,
}

impl CourseRow {
    fn to_course(&self, id: i64) -> Course {
        Course {
            id,
            name: self.name.clone(),
            students: self.students.iter().copied().collect(),
        }
    }
}

/// Allocate an id the way a serial column would: explicit ids push the counter past themselves.
fn allocate(next: &mut i64, explicit: Option<i64>) -> Result<i64, AppError> {
    let id = match explicit {
        Some(id) => id,
        None => next
            .checked_add(1)
            .ok_or_else(|| AppError::Validation("id space exhausted".into()))?,
    };
    *next = (*next).max(id);
    Ok(id)
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn check_students(tables: &Tables, ids: &[i64]) -> Result<(), AppError> {
    match ids.iter().find(|id| !tables.students.contains_key(id)) {
        Some(id) => Err(AppError::Validation(format!("student {} does not exist", id))),
        None => Ok(()),
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn list_courses(&self, filter: &ListFilter) -> Result<Vec<Course>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .courses
            .iter()
            .filter(|(id, row)| filter.matches(**id, &row.name))
            .map(|(id, row)| row.to_course(*id))
            .collect())
    }

    async fn get_course(&self, id: i64) -> Result<Option<Course>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.courses.get(&id).map(|row| row.to_course(id)))
    }

    async fn insert_course(&self, new: NewCourse) -> Result<Course, AppError> {
        let mut tables = self.tables.write().await;
        check_students(&tables, &new.students)?;
        if let Some(id) = new.id {
            if tables.courses.contains_key(&id) {
                return Err(AppError::Validation(format!("course {} already exists", id)));
            }
        }
        let id = allocate(&mut tables.next_course_id, new.id)?;
        let row = CourseRow {
            name: new.name,
            students: new.students.into_iter().collect(),
        };
        let course = row.to_course(id);
        tables.courses.insert(id, row);
        Ok(course)
    }

    async fn update_course(&self, id: i64, patch: CoursePatch) -> Result<Option<Course>, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.courses.contains_key(&id) {
            return Ok(None);
        }
        if let Some(ids) = &patch.students {
            check_students(&tables, ids)?;
        }
        let Some(row) = tables.courses.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = patch.name {
            row.name = name;
        }
        if let Some(ids) = patch.students {
            row.students = ids.into_iter().collect();
        }
        Ok(Some(row.to_course(id)))
    }

    async fn delete_course(&self, id: i64) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables.courses.remove(&id).is_some())
    }

    async fn count_courses(&self) -> Result<u64, AppError> {
        Ok(self.tables.read().await.courses.len() as u64)
    }

    async fn list_students(&self, filter: &ListFilter) -> Result<Vec<Student>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .students
            .values()
            .filter(|s| filter.matches(s.id, &s.name))
            .cloned()
            .collect())
    }

    async fn get_student(&self, id: i64) -> Result<Option<Student>, AppError> {
        Ok(self.tables.read().await.students.get(&id).cloned())
    }

    async fn insert_student(&self, new: NewStudent) -> Result<Student, AppError> {
        let mut tables = self.tables.write().await;
        if let Some(id) = new.id {
            if tables.students.contains_key(&id) {
                return Err(AppError::Validation(format!("student {} already exists", id)));
            }
        }
        let id = allocate(&mut tables.next_student_id, new.id)?;
        let student = Student {
            id,
            name: new.name,
            birth_date: new.birth_date,
        };
        tables.students.insert(id, student.clone());
        Ok(student)
    }

    async fn update_student(&self, id: i64, patch: StudentPatch) -> Result<Option<Student>, AppError> {
        let mut tables = self.tables.write().await;
        let Some(student) = tables.students.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = patch.name {
            student.name = name;
        }
        if let Some(birth_date) = patch.birth_date {
            student.birth_date = birth_date;
        }
        Ok(Some(student.clone()))
    }

    async fn delete_student(&self, id: i64) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        if tables.students.remove(&id).is_none() {
            return Ok(false);
        }
        for row in tables.courses.values_mut() {
            row.students.remove(&id);
        }
        Ok(true)
    }

    async fn count_students(&self) -> Result<u64, AppError> {
        Ok(self.tables.read().await.students.len() as u64)
    }

    async fn missing_students(&self, ids: &[i64]) -> Result<Vec<i64>, AppError> {
        let tables = self.tables.read().await;
        Ok(normalize_ids(
            ids.iter().copied().filter(|id| !tables.students.contains_key(id)).collect(),
        ))
    }
}
