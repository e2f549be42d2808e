#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::util::ServiceExt;

use scorebookd::{config::Config, db, routes, state::AppState};

pub fn temp_db_path(prefix: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir.join("scorebook.sqlite3")
}

pub fn test_config(db_path: PathBuf) -> Config {
    Config {
        db_path,
        port: 0,
        jwt_secret: "test-secret".to_string(),
        // Low cost keeps the hashing fast; production tuning is irrelevant
        // to these assertions.
        bcrypt_cost: 4,
        token_ttl_hours: 24,
    }
}

/// A fresh app over a fresh temp-dir database. The path is returned so a
/// test can inspect the store directly.
pub fn test_app(prefix: &str) -> (Router, PathBuf) {
    let db_path = temp_db_path(prefix);
    let conn = db::open_db(&db_path).expect("open db");
    let state = Arc::new(AppState::new(conn, test_config(db_path.clone())));
    (routes::build_router(state), db_path)
}

pub async fn request(
    app: &Router,
    method: &str,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let auth_header = token.map(|t| format!("Bearer {t}"));
    request_raw(app, method, path, auth_header.as_deref(), body).await
}

/// Like `request`, but the Authorization header value is passed verbatim,
/// for exercising malformed schemes.
pub async fn request_raw(
    app: &Router,
    method: &str,
    path: &str,
    auth_header: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(value) = auth_header {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    let request = match body {
        Some(v) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(v.to_string()))
            .expect("build request"),
        None => builder.body(Body::empty()).expect("build request"),
    };

    let response = app.clone().oneshot(request).await.expect("run request");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("collect body")
        .to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("parse response json")
    };
    (status, value)
}

/// Sign up a fixed user and return a token the gate accepts.
pub async fn signup_and_login(app: &Router) -> String {
    let (status, _) = request(
        app,
        "POST",
        "/api/auth/signup",
        None,
        Some(json!({ "name": "Test User", "email": "test@example.com", "password": "pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "signup failed");

    let (status, body) = request(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "test@example.com", "password": "pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body.get("token")
        .and_then(|v| v.as_str())
        .expect("token in login response")
        .to_string()
}

/// Create a student via the API and return its JSON record.
pub async fn create_student(app: &Router, token: &str, body: Value) -> Value {
    let (status, student) = request(app, "POST", "/api/students", Some(token), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {student}");
    student
}

pub fn student_id(student: &Value) -> String {
    student
        .get("id")
        .and_then(|v| v.as_str())
        .expect("student id")
        .to_string()
}
