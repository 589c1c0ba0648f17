//! Axum HTTP server: router, listener, graceful shutdown.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Router};
use reqlog::{context, RequestId, RequestIdSettings};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub service_name: String,
    pub jobs_started: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            service_name: config.tracing.service_name.clone(),
            jobs_started: Arc::new(AtomicU64::new(0)),
        }
    }
}

/// Router with the request id middleware outermost, so the HTTP trace layer
/// and every handler log inside the request scope.
pub fn router(state: AppState, settings: RequestIdSettings) -> Router {
    let app = Router::new()
        .route("/health", get(handle_health))
        .route("/api/echo", get(handle_echo))
        .route("/api/jobs", post(handle_start_job))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state));

    reqlog::with_request_id(app, settings)
}

/// Build and run the HTTP server.
pub async fn run(config: AppConfig, settings: RequestIdSettings) -> anyhow::Result<()> {
    let listen_addr = config.server.listen_address.clone();
    let app = router(AppState::new(&config), settings);

    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    tracing::info!(address = %listen_addr, "reqlog-server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("reqlog-server shut down gracefully");
    Ok(())
}

/// GET /api/echo: return the request id as the handler sees it.
async fn handle_echo(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
) -> Response {
    tracing::info!("Echo request received");
    axum::Json(serde_json::json!({
        "request_id": request_id,
        "service": state.service_name,
    }))
    .into_response()
}

/// POST /api/jobs: start a background job that keeps logging under the
/// request id after the response has gone out.
async fn handle_start_job(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
) -> Response {
    let job = state.jobs_started.fetch_add(1, Ordering::Relaxed) + 1;

    tokio::spawn(context::carry(async move {
        tracing::info!(job, "Background job started");
        tokio::task::yield_now().await;
        tracing::info!(job, "Background job finished");
    }));

    (
        StatusCode::ACCEPTED,
        axum::Json(serde_json::json!({ "request_id": request_id, "job": job })),
    )
        .into_response()
}

/// Health check endpoint.
async fn handle_health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Wait for SIGINT (Ctrl+C) for graceful shutdown.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for CTRL+C, shutting down");
        return;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
