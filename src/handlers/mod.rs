//! HTTP handlers for the course and student resources.

pub mod course;
pub mod student;

use crate::error::AppError;

/// Path ids that are not integers can never match a row, so they are reported as missing.
fn parse_id(kind: &str, id_str: &str) -> Result<i64, AppError> {
    id_str
        .parse()
        .map_err(|_| AppError::NotFound(format!("{} {}", kind, id_str)))
}
