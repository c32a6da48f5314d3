use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{delete, get},
    Json, Router,
};
use serde::Deserialize;

use crate::application::{AppError, WatchRegistry};
use crate::domain::WatchType;

#[derive(Clone)]
pub struct ApiState {
    pub registry: Arc<dyn WatchRegistry>,
    pub api_token: Option<String>,
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/watches", get(list_watches).post(add_watch))
        .route("/watches/*id", delete(remove_watch))
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn list_watches(State(state): State<ApiState>, headers: HeaderMap) -> impl IntoResponse {
    if let Err((code, msg)) = check_auth(&headers, &state.api_token) {
        return (code, msg).into_response();
    }
    match state.registry.list().await {
        Ok(v) => Json(v).into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Deserialize)]
struct AddWatchBody {
    r#type: String,
    target: String,
    channel: Option<String>,
}

async fn add_watch(
    State(state): State<ApiState>,
    headers: HeaderMap,
    body: Result<Json<AddWatchBody>, JsonRejection>,
) -> impl IntoResponse {
    if let Err((code, msg)) = check_auth(&headers, &state.api_token) {
        return (code, msg).into_response();
    }
    let body = match body {
        Ok(Json(body)) => body,
        Err(rejection) => {
            return (StatusCode::BAD_REQUEST, rejection.body_text()).into_response();
        }
    };
    let Some(kind) = WatchType::parse(&body.r#type) else {
        return (
            StatusCode::BAD_REQUEST,
            "invalid type (user/repo)".to_string(),
        )
            .into_response();
    };
    match state.registry.add(kind, &body.target, body.channel).await {
        Ok(watch) => (StatusCode::CREATED, Json(watch)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Ids of repo watches contain a slash (`repo:owner/name`), hence the
/// wildcard route.
async fn remove_watch(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if let Err((code, msg)) = check_auth(&headers, &state.api_token) {
        return (code, msg).into_response();
    }
    let id = id.trim_start_matches('/');
    match state.registry.remove(id).await {
        Ok(watch) => Json(watch).into_response(),
        Err(e) => error_response(e),
    }
}

fn error_response(e: AppError) -> axum::response::Response {
    let code = match &e {
        AppError::Conflict(_) => StatusCode::CONFLICT,
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        AppError::InvalidWatch(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (code, format!("error: {e}")).into_response()
}

fn check_auth(headers: &HeaderMap, token: &Option<String>) -> Result<(), (StatusCode, String)> {
    let Some(expected) = token else {
        return Ok(());
    }; // no token configured: open access
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let ok = auth == format!("Bearer {}", expected);
    if ok {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "unauthorized".to_string()))
    }
}
