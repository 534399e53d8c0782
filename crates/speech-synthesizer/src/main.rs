//! Speech Synthesizer - cached text-to-speech service
//!
//! Serves synthesis requests over HTTP, reusing previously generated audio
//! from a size-bounded disk cache and calling the configured engine only on
//! a miss.

mod error;
mod server;
mod types;

use crate::error::{Result, ServiceError};
use crate::server::{start_server, ServerState, SharedState};
use crate::types::ServiceConfig;
use audio_cache_db::CacheStore;
use speech_cache::{CacheConfig, CacheManager};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use synthesis_engine::{build_engine, EngineKind, EngineSettings};
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let env_filter = EnvFilter::from_default_env()
        .add_directive("speech_synthesizer=info".parse()?)
        .add_directive("speech_cache=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    };

    info!("Starting Speech Synthesizer...");

    // Load configuration from environment
    let config = load_config()?;
    info!("Port: {}", config.port);
    info!("Cache dir: {:?}", config.cache_dir);
    info!("Max cache size: {} bytes", config.max_cache_bytes);
    info!("Engine: {}", config.engine);

    let engine = build_engine(
        config.engine,
        &EngineSettings {
            service_url: config.engine_service_url.clone(),
            timeout: config.engine_timeout,
            library_command: config.library_command.clone(),
        },
    )?;

    // The default database lives inside the cache directory
    tokio::fs::create_dir_all(&config.cache_dir).await?;
    let store = CacheStore::open(&config.database_url()).await?;

    let manager = CacheManager::open(
        store,
        engine,
        CacheConfig {
            cache_dir: config.cache_dir,
            max_cache_bytes: config.max_cache_bytes,
            engine_timeout: config.engine_timeout,
        },
    )
    .await?;

    let stats = manager.stats().await?;
    info!(
        entries = stats.entries,
        total_size = stats.total_size,
        "Cache loaded"
    );

    // Create shared state
    let state: SharedState = Arc::new(ServerState::new(manager));

    // Start HTTP server (blocking)
    start_server(state, config.port)
        .await
        .map_err(|e| ServiceError::Config(format!("Server error: {}", e)))?;

    Ok(())
}

fn load_config() -> Result<ServiceConfig> {
    let defaults = ServiceConfig::default();

    let port = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(defaults.port);

    let cache_dir = std::env::var("CACHE_DIR")
        .map(PathBuf::from)
        .unwrap_or(defaults.cache_dir);

    let database_url = std::env::var("CACHE_DATABASE_URL").ok();

    let max_cache_bytes = std::env::var("MAX_CACHE_BYTES")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(defaults.max_cache_bytes);

    let engine = match std::env::var("ENGINE") {
        Ok(name) => name.parse::<EngineKind>()?,
        Err(_) => defaults.engine,
    };

    let engine_service_url =
        std::env::var("ENGINE_SERVICE_URL").unwrap_or(defaults.engine_service_url);

    let engine_timeout = std::env::var("ENGINE_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(defaults.engine_timeout);

    let library_command = std::env::var("LIBRARY_COMMAND").unwrap_or(defaults.library_command);

    Ok(ServiceConfig {
        port,
        cache_dir,
        database_url,
        max_cache_bytes,
        engine,
        engine_service_url,
        engine_timeout,
        library_command,
    })
}
