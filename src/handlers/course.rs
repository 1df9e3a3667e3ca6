//! Course handlers: list, retrieve, create, partial update, delete.

use super::parse_id;
use crate::error::AppError;
use crate::service::{CourseService, RequestValidator};
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
    let courses = CourseService::list(state.store.as_ref(), &filter).await?;
    Ok(Json(courses))
}

pub async fn read(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id("course", &id_str)?;
    let course = CourseService::read(state.store.as_ref(), id).await?;
    Ok(Json(course))
}

pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = payload?;
    let new = RequestValidator::new_course(body, state.max_students_per_course)?;
    let course = CourseService::create(state.store.as_ref(), new).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id("course", &id_str)?;
    let Json(body) = payload?;
    let patch = RequestValidator::course_patch(body, state.max_students_per_course)?;
    let course = CourseService::update(state.store.as_ref(), id, patch).await?;
    Ok(Json(course))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id("course", &id_str)?;
    CourseService::delete(state.store.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
