//! Student handlers, same surface as courses.

use super::parse_id;
use crate::error::AppError;
use crate::service::{RequestValidator, StudentService};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::Value;
use std::collections::HashMap;

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let filter = RequestValidator::list_filter(&params)?;
    let students = StudentService::list(state.store.as_ref(), &filter).await?;
    Ok(Json(students))
}

pub async fn read(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id("student", &id_str)?;
    Ok(Json(StudentService::read(state.store.as_ref(), id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = payload?;
    let new = RequestValidator::new_student(body)?;
    let student = StudentService::create(state.store.as_ref(), new).await?;
    Ok((StatusCode::CREATED, Json(student)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id("student", &id_str)?;
    let Json(body) = payload?;
    let patch = RequestValidator::student_patch(body)?;
    Ok(Json(StudentService::update(state.store.as_ref(), id, patch).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id("student", &id_str)?;
    StudentService::delete(state.store.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
