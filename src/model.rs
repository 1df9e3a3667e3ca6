//! Course and student records plus the inputs the store accepts.

use chrono::NaiveDate;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Course {
    pub id: i64,
    pub name: String,
    /// Enrolled student ids, ascending.
    pub students: Vec<i64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Student {
    pub id: i64,
    pub name: String,
    pub birth_date: Option<NaiveDate>,
}

/// Exact-match filter for list endpoints. Unset fields match everything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub id: Option<i64>,
    pub name: Option<String>,
}

impl ListFilter {
    pub fn matches(&self, id: i64, name: &str) -> bool {
        self.id.map_or(true, |want| want == id) && self.name.as_deref().map_or(true, |want| want == name)
    }
}

#[derive(Clone, Debug, Default)]
pub struct NewCourse {
    /// Explicit id; `None` lets the store assign one.
    pub id: Option<i64>,
    pub name: String,
    pub students: Vec<i64>,
}

#[derive(Clone, Debug, Default)]
pub struct CoursePatch {
    pub name: Option<String>,
    /// Replaces the whole enrollment when set.
    pub students: Option<Vec<i64>>,
}

#[derive(Clone, Debug, Default)]
pub struct NewStudent {
    pub id: Option<i64>,
    pub name: String,
    pub birth_date: Option<NaiveDate>,
}

#[derive(Clone, Debug, Default)]
pub struct StudentPatch {
    pub name: Option<String>,
    /// Outer `None` leaves the date alone, `Some(None)` clears it.
    pub birth_date: Option<Option<NaiveDate>>,
}

/// Sort and de-duplicate a student id list.
pub fn normalize_ids(mut ids: Vec<i64>) -> Vec<i64> {
    ids.sort_unstable();
    ids.dedup();
    ids
}
