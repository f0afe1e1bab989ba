//! The HTTP and WebSocket surface.
//!
//! Routes map directly onto [`Collector`] operations. WebSocket clients are tracked by a
//! [`ConnectionRegistry`] owned by the [`PushDriver`], which refreshes every watched repository
//! on a fixed interval.

mod push;
mod registry;
mod routes;

pub use push::{PushDriver, error_frame, handle_socket};
pub use registry::{ConnectionId, ConnectionRegistry};
pub use routes::ApiError;

use crate::Result;
use crate::facts::Collector;
use axum::Router;
use axum::http::HeaderValue;
use axum::routing::get;
use core::time::Duration;
use ohno::IntoAppError;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

const LOG_TARGET: &str = "     serve";

// ── Config ──

#[derive(Debug, Clone)]
pub struct ServeOptions {
    pub bind: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub refresh_interval: Duration,
}

impl Default for ServeOptions {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8000,
            allowed_origins: vec!["http://localhost:3000".to_string()],
            refresh_interval: Duration::from_secs(30),
        }
    }
}

// ── Entrypoint ──

/// Run the server until the listener fails.
pub async fn serve(collector: Collector, options: ServeOptions) -> Result<()> {
    let driver = Arc::new(PushDriver::new(collector, options.refresh_interval));

    let refresher = Arc::clone(&driver);
    let refresh_task = tokio::spawn(async move { refresher.run().await });

    let app = router(Arc::clone(&driver), &options.allowed_origins);

    let addr = format!("{}:{}", options.bind, options.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .into_app_err_with(|| format!("binding to {addr}"))?;
    log::info!(target: LOG_TARGET, "Listening on http://{addr}");

    let result = axum::serve(listener, app).await.into_app_err("serving HTTP requests");
    refresh_task.abort();
    result
}

/// Build the router (for testing without binding to a port).
pub fn router(driver: Arc<PushDriver>, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(routes::root))
        .route("/repo/{owner}/{repo}", get(routes::get_repo))
        .route("/test/{owner}/{repo}", get(routes::test_repo))
        .route("/trending", get(routes::trending))
        .route("/ws/{owner}/{repo}", get(routes::websocket))
        .layer(cors_layer(allowed_origins))
        .with_state(driver)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                log::warn!(target: LOG_TARGET, "Ignoring invalid CORS origin '{origin}'");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
