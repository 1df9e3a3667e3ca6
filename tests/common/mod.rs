#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use students_api::{app, AppState, MemoryStore, NewCourse, NewStudent, Settings, Store};
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    pub fn with_settings(settings: Settings) -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(store.clone(), &settings);
        Self {
            router: app(state, settings.body_limit_bytes),
            store,
        }
    }

    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        match body {
            Some(json) => self.send_raw(method, uri, Some("application/json"), json.to_string()).await,
            None => self.send_raw(method, uri, None, String::new()).await,
        }
    }

    /// Send `body` verbatim with an optional content type.
    pub async fn send_raw(
        &self,
        method: Method,
        uri: &str,
        content_type: Option<&str>,
        body: String,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        let body = if body.is_empty() { Body::empty() } else { Body::from(body) };
        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PATCH, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, None).await
    }

    /// Five students, then `quantity` courses built by `make` and enrolled with all of them.
    pub async fn seed_courses<F>(&self, quantity: usize, make: F) -> Vec<students_api::Course>
    where
        F: Fn(usize) -> NewCourse,
    {
        let students = self.seed_students(5).await;
        let ids: Vec<i64> = students.iter().map(|s| s.id).collect();
        let mut courses = Vec::with_capacity(quantity);
        for i in 0..quantity {
            let mut new = make(i);
            new.students = ids.clone();
            courses.push(self.store.insert_course(new).await.unwrap());
        }
        courses
    }

    pub async fn seed_students(&self, quantity: usize) -> Vec<students_api::Student> {
        let mut students = Vec::with_capacity(quantity);
        for i in 0..quantity {
            let new = NewStudent {
                name: format!("student-{}", i),
                ..Default::default()
            };
            students.push(self.store.insert_student(new).await.unwrap());
        }
        students
    }
}

pub fn named(i: usize) -> NewCourse {
    NewCourse {
        name: format!("course-{}", i),
        ..Default::default()
    }
}
