mod common;

use axum::http::{header, Method, Request, StatusCode};
use common::{named, TestApp};
use serde_json::json;
use students_api::{NewCourse, Settings, Store};
use tower::ServiceExt;

#[tokio::test]
async fn get_course() {
    let app = TestApp::new();
    let courses = app.seed_courses(1, named).await;

    let (status, data) = app.get(&format!("/api/v1/courses/{}/", courses[0].id)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(data["id"], courses[0].id);
    assert_eq!(data["name"], "course-0");
    assert_eq!(data["students"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn get_courses_in_creation_order() {
    let app = TestApp::new();
    let courses = app.seed_courses(10, named).await;

    let (status, data) = app.get("/api/v1/courses/").await;

    assert_eq!(status, StatusCode::OK);
    let data = data.as_array().unwrap();
    assert_eq!(data.len(), courses.len());
    for (item, course) in data.iter().zip(&courses) {
        assert_eq!(item["name"], course.name.as_str());
        assert_eq!(item["id"], course.id);
    }
}

#[tokio::test]
async fn filter_courses_by_id() {
    let app = TestApp::new();
    app.seed_courses(10, |i| NewCourse {
        id: Some(i as i64 + 1),
        ..named(i)
    })
    .await;

    let (status, data) = app.get("/api/v1/courses/?id=3").await;

    assert_eq!(status, StatusCode::OK);
    let data = data.as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["id"], 3);

    let (status, data) = app.get("/api/v1/courses/?id=300").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data, json!([]));
}

#[tokio::test]
async fn filter_courses_by_name() {
    let app = TestApp::new();
    app.seed_courses(3, named).await;
    let python = app
        .seed_courses(10, |_| NewCourse {
            name: "Python".into(),
            ..Default::default()
        })
        .await;

    let (status, data) = app.get("/api/v1/courses/?name=Python").await;

    assert_eq!(status, StatusCode::OK);
    let data = data.as_array().unwrap();
    assert_eq!(data.len(), python.len());
    for (item, course) in data.iter().zip(&python) {
        assert_eq!(item["name"], "Python");
        assert_eq!(item["id"], course.id);
    }
}

#[tokio::test]
async fn filters_combine_and_reject_bad_ids() {
    let app = TestApp::new();
    let courses = app.seed_courses(4, named).await;

    let (_, data) = app
        .get(&format!("/api/v1/courses/?id={}&name=course-1", courses[1].id))
        .await;
    assert_eq!(data.as_array().unwrap().len(), 1);

    let (_, data) = app
        .get(&format!("/api/v1/courses/?id={}&name=course-2", courses[1].id))
        .await;
    assert_eq!(data, json!([]));

    let (status, body) = app.get("/api/v1/courses/?id=abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "validation_error");
}

#[tokio::test]
async fn create_course() {
    let app = TestApp::new();
    let count = app.store.count_courses().await.unwrap();

    let (status, data) = app.post("/api/v1/courses/", json!({"name": "test_course"})).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(app.store.count_courses().await.unwrap(), count + 1);
    assert_eq!(data["name"], "test_course");
    assert_eq!(data["students"], json!([]));
    let id = data["id"].as_i64().unwrap();
    assert!(app.store.get_course(id).await.unwrap().is_some());
}

#[tokio::test]
async fn create_course_with_students() {
    let app = TestApp::new();
    let students = app.seed_students(3).await;
    let ids: Vec<i64> = students.iter().rev().map(|s| s.id).collect();

    let (status, data) = app
        .post("/api/v1/courses/", json!({"name": "Rust", "students": ids}))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(data["students"], json!([students[0].id, students[1].id, students[2].id]));
}

#[tokio::test]
async fn create_course_ignores_client_id() {
    let app = TestApp::new();
    app.seed_courses(1, |i| NewCourse { id: Some(1), ..named(i) }).await;

    let (status, data) = app.post("/api/v1/courses/", json!({"id": 1, "name": "clash"})).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(data["id"], 2);
    assert_eq!(app.store.count_courses().await.unwrap(), 2);
}

#[tokio::test]
async fn create_course_validation() {
    let app = TestApp::with_settings(Settings {
        max_students_per_course: 2,
        ..Settings::default()
    });
    let students = app.seed_students(3).await;
    let ids: Vec<i64> = students.iter().map(|s| s.id).collect();

    let (status, _) = app.post("/api/v1/courses/", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.post("/api/v1/courses/", json!({"name": ""})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .post("/api/v1/courses/", json!({"name": "full", "students": ids}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"].as_str().unwrap().contains("at most 2"));

    let (status, body) = app
        .post("/api/v1/courses/", json!({"name": "ghosts", "students": [999]}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"].as_str().unwrap().contains("999"));

    let (status, _) = app.post("/api/v1/courses/", json!("test_course")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(app.store.count_courses().await.unwrap(), 0);
}

#[tokio::test]
async fn update_course() {
    let app = TestApp::new();
    let seeded = app
        .seed_courses(1, |_| NewCourse {
            id: Some(1),
            name: "first name".into(),
            ..Default::default()
        })
        .await;
    let count = app.store.count_courses().await.unwrap();

    let (status, data) = app.patch("/api/v1/courses/1/", json!({"name": "second name"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(data["name"], "second name");
    assert_eq!(data["id"], 1);
    assert_eq!(data["students"], json!(seeded[0].students));
    assert_eq!(app.store.count_courses().await.unwrap(), count);
}

#[tokio::test]
async fn update_course_students_replaces_set() {
    let app = TestApp::new();
    let seeded = app.seed_courses(1, named).await;
    let keep = seeded[0].students[4];

    let (status, data) = app
        .patch(&format!("/api/v1/courses/{}/", seeded[0].id), json!({"students": [keep]}))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(data["students"], json!([keep]));
    assert_eq!(data["name"], "course-0");
}

#[tokio::test]
async fn update_missing_course() {
    let app = TestApp::new();
    let (status, body) = app.patch("/api/v1/courses/42/", json!({"name": "x"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn update_missing_course_with_unknown_students() {
    let app = TestApp::new();
    let (status, body) = app.patch("/api/v1/courses/42/", json!({"students": [999]})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn unreadable_bodies_are_bad_requests() {
    let app = TestApp::new();
    let cases = [
        (Some("application/json"), "{\"name\": "),
        (None, "{\"name\": \"test_course\"}"),
        (Some("application/x-www-form-urlencoded"), "name=test_course"),
    ];

    for (content_type, body) in cases {
        let (status, data) = app
            .send_raw(Method::POST, "/api/v1/courses/", content_type, body.to_string())
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{:?} {}", content_type, body);
        assert_eq!(data["error"]["code"], "bad_request");
        assert!(data["error"]["message"].is_string());
    }

    let seeded = app.seed_courses(1, named).await;
    let (status, data) = app
        .send_raw(
            Method::PATCH,
            &format!("/api/v1/courses/{}/", seeded[0].id),
            Some("application/json"),
            "not json".to_string(),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(data["error"]["code"], "bad_request");
    assert_eq!(app.store.count_courses().await.unwrap(), 1);
}

#[tokio::test]
async fn delete_course() {
    let app = TestApp::new();
    app.seed_courses(1, |i| NewCourse { id: Some(1), ..named(i) }).await;
    let count = app.store.count_courses().await.unwrap();

    let (status, body) = app.delete("/api/v1/courses/1/").await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, serde_json::Value::Null);
    assert_eq!(app.store.count_courses().await.unwrap(), count - 1);
    assert_eq!(app.store.count_students().await.unwrap(), 5);

    let (status, _) = app.get("/api/v1/courses/1/").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.delete("/api/v1/courses/1/").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn non_numeric_id_is_not_found() {
    let app = TestApp::new();
    let (status, _) = app.get("/api/v1/courses/abc/").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let app = TestApp::with_settings(Settings {
        body_limit_bytes: 16,
        ..Settings::default()
    });
    let body = json!({"name": "a course name well past sixteen bytes"}).to_string();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/courses/")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_LENGTH, body.len())
        .body(axum::body::Body::from(body))
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(app.store.count_courses().await.unwrap(), 0);
}

#[tokio::test]
async fn operational_routes() {
    let app = TestApp::new();
    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = app.get("/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "ok");

    let (_, body) = app.get("/version").await;
    assert_eq!(body["name"], "students-api");
}
