//! Resource routes, mounted under `/api/v1`. Paths keep their trailing slash.

use crate::handlers::{course, student};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/courses/", get(course::list).post(course::create))
        .route(
            "/courses/:id/",
            get(course::read).patch(course::update).delete(course::delete),
        )
        .route("/students/", get(student::list).post(student::create))
        .route(
            "/students/:id/",
            get(student::read).patch(student::update).delete(student::delete),
        )
        .with_state(state)
}
