//! HTTP server for speech synthesis endpoints
//!
//! Provides /health and POST /synthesize.

use crate::types::{HealthResponse, SynthesizeRequest, SynthesizeResponse};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use speech_cache::{response, CacheManager};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

/// Shared state for the HTTP server
pub struct ServerState {
    pub manager: CacheManager,
    pub started_at: DateTime<Utc>,
}

impl ServerState {
    pub fn new(manager: CacheManager) -> Self {
        Self {
            manager,
            started_at: Utc::now(),
        }
    }
}

pub type SharedState = Arc<ServerState>;

/// Create the HTTP router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/synthesize", post(synthesize))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(state: SharedState, port: u16) -> std::io::Result<()> {
    let router = create_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await
}

/// Health check endpoint
async fn health(State(state): State<SharedState>) -> Response {
    let uptime_secs = (Utc::now() - state.started_at).num_seconds() as u64;
    let engine = state.manager.engine().name().to_string();

    match state.manager.stats().await {
        Ok(cache) => Json(HealthResponse {
            status: "ok".to_string(),
            uptime_secs,
            engine,
            cache,
        })
        .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to read cache statistics");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "degraded".to_string(),
                    uptime_secs,
                    engine,
                    cache: Default::default(),
                }),
            )
                .into_response()
        }
    }
}

/// Synthesize text, serving from the cache when possible
async fn synthesize(
    State(state): State<SharedState>,
    Json(request): Json<SynthesizeRequest>,
) -> Json<SynthesizeResponse> {
    let outcome = state
        .manager
        .synthesize_text(&request.text, request.metadata.as_deref())
        .await;

    let result = response::render(&outcome);
    if response::is_exception(&result) {
        warn!(result = %result, "Synthesis request failed");
    } else if let Ok(served) = &outcome {
        info!(
            status = ?served.status,
            path = ?served.output.audio_file,
            "Synthesis served"
        );
    }

    Json(SynthesizeResponse { result })
}
