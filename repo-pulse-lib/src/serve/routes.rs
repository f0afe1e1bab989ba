use super::push::{PushDriver, handle_socket};
use crate::facts::{FetchOutcome, RepoReport, RepoSpec};
use axum::Json;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use std::sync::Arc;

const LOG_TARGET: &str = "    routes";

// ── Error Handling ──

/// A failed request, rendered as `{"detail": ...}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "detail": self.detail });
        (self.status, Json(body)).into_response()
    }
}

fn parse_spec(owner: &str, repo: &str) -> Result<RepoSpec, ApiError> {
    RepoSpec::new(owner, repo).map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, e.to_string()))
}

// ── Health ──

pub async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "GitHub Stats API is running" }))
}

// ── GET /repo/{owner}/{repo} ──

pub async fn get_repo(State(driver): State<Arc<PushDriver>>, Path((owner, repo)): Path<(String, String)>) -> Result<Json<RepoReport>, ApiError> {
    let spec = parse_spec(&owner, &repo)?;

    match driver.collector().collect(&spec, Utc::now()).await {
        FetchOutcome::Found(report) => Ok(Json(report)),
        FetchOutcome::NotFound => Err(ApiError::new(StatusCode::NOT_FOUND, "Repository not found")),
        FetchOutcome::Error(e) => Err(ApiError::new(StatusCode::BAD_GATEWAY, format!("{e:#}"))),
    }
}

// ── GET /test/{owner}/{repo} ──

pub async fn test_repo(State(driver): State<Arc<PushDriver>>, Path((owner, repo)): Path<(String, String)>) -> Json<serde_json::Value> {
    let outcome = match RepoSpec::new(&owner, &repo) {
        Ok(spec) => driver.collector().collect(&spec, Utc::now()).await,
        Err(e) => FetchOutcome::Error(Arc::new(e)),
    };

    let body = match outcome {
        FetchOutcome::Found(report) => serde_json::json!({ "success": true, "repo": report.full_name, "stars": report.stars }),
        FetchOutcome::NotFound => serde_json::json!({ "success": false, "error": "Repository not found" }),
        FetchOutcome::Error(e) => serde_json::json!({ "success": false, "error": e.to_string() }),
    };

    Json(body)
}

// ── GET /trending ──

pub async fn trending(State(driver): State<Arc<PushDriver>>) -> Result<Json<serde_json::Value>, ApiError> {
    driver.collector().trending(Utc::now()).await.map(Json).map_err(|e| {
        log::error!(target: LOG_TARGET, "Could not fetch trending repositories: {e:#}");
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch trending repositories")
    })
}

// ── GET /ws/{owner}/{repo} ──

pub async fn websocket(
    ws: WebSocketUpgrade,
    State(driver): State<Arc<PushDriver>>,
    Path((owner, repo)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let spec = parse_spec(&owner, &repo)?;
    Ok(ws.on_upgrade(move |socket| async move { handle_socket(socket, &driver, spec).await }))
}
