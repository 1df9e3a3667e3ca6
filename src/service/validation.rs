//! Request validation: JSON bodies and query strings into typed store inputs.

use crate::error::AppError;
use crate::model::{normalize_ids, CoursePatch, ListFilter, NewCourse, NewStudent, StudentPatch};
use chrono::NaiveDate;
use serde_json::{Map, Value};
use std::collections::HashMap;

pub struct RequestValidator;

impl RequestValidator {
    /// `id` must parse as an integer; `name` is taken verbatim. Other params are ignored.
    pub fn list_filter(params: &HashMap<String, String>) -> Result<ListFilter, AppError> {
        let id = match params.get("id") {
            Some(raw) => Some(
                raw.trim()
                    .parse::<i64>()
                    .map_err(|_| AppError::Validation(format!("id filter must be an integer, got '{}'", raw)))?,
            ),
            None => None,
        };
        Ok(ListFilter {
            id,
            name: params.get("name").cloned(),
        })
    }

    /// Full course body for create. `name` is required; `id` is read-only and ignored.
    pub fn new_course(body: Value, max_students: usize) -> Result<NewCourse, AppError> {
        let body = body_to_map(body)?;
        let name = name_field(&body)?.ok_or_else(|| AppError::Validation("name is required".into()))?;
        let students = students_field(&body, max_students)?.unwrap_or_default();
        Ok(NewCourse {
            id: None,
            name,
            students,
        })
    }

    /// Partial course body for PATCH. Only fields present are validated.
    pub fn course_patch(body: Value, max_students: usize) -> Result<CoursePatch, AppError> {
        let body = body_to_map(body)?;
        Ok(CoursePatch {
            name: name_field(&body)?,
            students: students_field(&body, max_students)?,
        })
    }

    pub fn new_student(body: Value) -> Result<NewStudent, AppError> {
        let body = body_to_map(body)?;
        let name = name_field(&body)?.ok_or_else(|| AppError::Validation("name is required".into()))?;
        Ok(NewStudent {
            id: None,
            name,
            birth_date: birth_date_field(&body)?.flatten(),
        })
    }

    pub fn student_patch(body: Value) -> Result<StudentPatch, AppError> {
        let body = body_to_map(body)?;
        Ok(StudentPatch {
            name: name_field(&body)?,
            birth_date: birth_date_field(&body)?,
        })
    }
}

fn body_to_map(value: Value) -> Result<Map<String, Value>, AppError> {
    match value {
        Value::Object(m) => Ok(m),
        _ => Err(AppError::BadRequest("body must be a JSON object".into())),
    }
}

fn name_field(body: &Map<String, Value>) -> Result<Option<String>, AppError> {
    match body.get("name") {
        None => Ok(None),
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(Some(s.clone())),
        Some(Value::String(_)) => Err(AppError::Validation("name may not be blank".into())),
        Some(_) => Err(AppError::Validation("name must be a string".into())),
    }
}

fn students_field(body: &Map<String, Value>, max_students: usize) -> Result<Option<Vec<i64>>, AppError> {
    let items = match body.get("students") {
        None => return Ok(None),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(AppError::Validation("students must be an array of ids".into())),
    };
    let ids = items
        .iter()
        .map(|v| {
            v.as_i64()
                .ok_or_else(|| AppError::Validation(format!("invalid student id: {}", v)))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let ids = normalize_ids(ids);
    if ids.len() > max_students {
        return Err(AppError::Validation(format!(
            "a course may have at most {} students",
            max_students
        )));
    }
    Ok(Some(ids))
}

/// Outer `None` when absent; `Some(None)` when explicitly null.
fn birth_date_field(body: &Map<String, Value>) -> Result<Option<Option<NaiveDate>>, AppError> {
    match body.get("birth_date") {
        None => Ok(None),
        Some(Value::Null) => Ok(Some(None)),
        Some(Value::String(s)) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(|d| Some(Some(d)))
            .map_err(|_| AppError::Validation(format!("birth_date must be YYYY-MM-DD, got '{}'", s))),
        Some(_) => Err(AppError::Validation("birth_date must be a string".into())),
    }
}
