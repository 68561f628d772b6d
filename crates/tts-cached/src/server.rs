//! HTTP server for the TTS daemon
//!
//! Provides POST /tts, GET /healthz and GET /health.

use crate::orchestrator::TtsService;
use crate::types::{ErrorResponse, HealthResponse, TtsRequest, TtsResponse};
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

/// Shared state for the HTTP server
pub struct ServerState {
    pub service: TtsService,
    pub started_at: DateTime<Utc>,
}

impl ServerState {
    pub fn new(service: TtsService) -> Self {
        Self {
            service,
            started_at: Utc::now(),
        }
    }
}

pub type SharedState = Arc<ServerState>;

/// Create the HTTP router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/tts", post(tts))
        .route("/healthz", get(healthz))
        .route("/health", get(health))
        // Text has no length cap
        .layer(DefaultBodyLimit::disable())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the HTTP server and run until SIGINT or SIGTERM
pub async fn start_server(state: SharedState, addr: SocketAddr) -> std::io::Result<()> {
    let router = create_router(state);
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("Shutdown signal received");
}

/// Speak the posted text, from cache when possible.
///
/// The body is decoded as JSON whatever its content type.
async fn tts(State(state): State<SharedState>, body: Bytes) -> Response {
    let request: TtsRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "Rejected malformed TTS request");
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "invalid json".to_string(),
                }),
            )
                .into_response();
        }
    };

    match state.service.speak(&request.text).await {
        Ok(outcome) => {
            info!(
                status = outcome.status.as_str(),
                key = %outcome.key,
                file = %outcome.file,
                "Served TTS request"
            );
            Json(TtsResponse::from(outcome)).into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// Liveness probe; always OK, logs when the cache directory is unreachable
async fn healthz(State(state): State<SharedState>) -> &'static str {
    let cache_dir = state.service.store().cache_dir();
    if let Err(e) = tokio::fs::metadata(cache_dir).await {
        error!(cache_dir = ?cache_dir, error = %e, "Cache dir check failed");
    }
    "OK\n"
}

/// Health check endpoint with cache and request statistics
async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let cache = match state.service.store().stats().await {
        Ok(stats) => Some(stats),
        Err(e) => {
            warn!(error = %e, "Failed to collect cache stats");
            None
        }
    };
    let uptime_secs = (Utc::now() - state.started_at).num_seconds() as u64;

    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs,
        voice_id: state.service.voice_id().to_string(),
        cache,
        requests: state.service.request_stats(),
    })
}
