//! HTTP surface: the route table and the handlers binding it to the
//! services. This layer parses bodies, invokes services, and maps results
//! to statuses; error translation lives on `ApiError` itself.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Redirect},
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use tower_http::{cors::CorsLayer, services::ServeDir};

use crate::auth::{self, LoginRequest, SignupRequest};
use crate::error::ApiError;
use crate::state::AppState;
use crate::students::{self, MarksPatch, NewStudent, StudentPatch};

#[derive(Debug, Serialize)]
struct MessageResponse {
    message: String,
}

#[derive(Debug, Serialize)]
struct TokenResponse {
    token: String,
}

async fn health() -> impl IntoResponse {
    Json(json!({ "version": env!("CARGO_PKG_VERSION") }))
}

async fn signup(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let conn = state.conn()?;
    auth::signup(&conn, &state.config, body)?;
    Ok(Json(MessageResponse {
        message: "Signup success".into(),
    }))
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let conn = state.conn()?;
    let token = auth::login(&conn, &state.config, body)?;
    Ok(Json(TokenResponse { token }))
}

async fn list_students(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let conn = state.conn()?;
    Ok(Json(students::list(&conn)?))
}

async fn create_student(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewStudent>,
) -> Result<impl IntoResponse, ApiError> {
    let conn = state.conn()?;
    let student = students::create(&conn, body)?;
    Ok((StatusCode::CREATED, Json(student)))
}

async fn update_student(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<StudentPatch>,
) -> Result<impl IntoResponse, ApiError> {
    let conn = state.conn()?;
    Ok(Json(students::update(&conn, &id, body)?))
}

async fn delete_student(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let conn = state.conn()?;
    students::remove(&conn, &id)?;
    Ok(Json(MessageResponse {
        message: "Deleted".into(),
    }))
}

async fn update_marks(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<MarksPatch>,
) -> Result<impl IntoResponse, ApiError> {
    let conn = state.conn()?;
    Ok(Json(students::update_marks(&conn, &id, body)?))
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let student_routes = Router::new()
        .route("/", get(list_students).post(create_student))
        .route("/:id", put(update_student).delete(delete_student))
        .route("/:id/marks", put(update_marks))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    Router::new()
        .route("/", get(|| async { Redirect::permanent("/app/") }))
        .route("/api/health", get(health))
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/login", post(login))
        .nest("/api/students", student_routes)
        .nest_service("/app", ServeDir::new("static/app"))
        .nest_service("/crime", ServeDir::new("static/crime"))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
