//! Core types for the speech synthesizer service

use serde::{Deserialize, Serialize};
use speech_cache::CacheStats;
use std::path::PathBuf;
use std::time::Duration;
use synthesis_engine::EngineKind;

/// Configuration for the speech synthesizer
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub port: u16,
    pub cache_dir: PathBuf,
    /// Defaults to a `cache.db` inside `cache_dir`
    pub database_url: Option<String>,
    pub max_cache_bytes: u64,
    pub engine: EngineKind,
    pub engine_service_url: String,
    pub engine_timeout: Duration,
    pub library_command: String,
}

impl ServiceConfig {
    pub fn database_url(&self) -> String {
        self.database_url
            .clone()
            .unwrap_or_else(|| format!("sqlite://{}", self.cache_dir.join("cache.db").display()))
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: 3005,
            cache_dir: PathBuf::from("./cache/speech"),
            database_url: None,
            max_cache_bytes: 100_000_000, // 100MB
            engine: EngineKind::Service,
            engine_service_url: "http://localhost:3006".to_string(),
            engine_timeout: Duration::from_secs(30),
            library_command: "espeak-ng --stdout -v {voice}".to_string(),
        }
    }
}

/// Body of `POST /synthesize`
#[derive(Debug, Deserialize)]
pub struct SynthesizeRequest {
    pub text: String,
    /// JSON object serialized as a string
    #[serde(default)]
    pub metadata: Option<String>,
}

/// Rendered outcome of a synthesis request
#[derive(Debug, Serialize)]
pub struct SynthesizeResponse {
    pub result: String,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
    pub engine: String,
    pub cache: CacheStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServiceConfig::default();
        assert_eq!(config.port, 3005);
        assert_eq!(config.cache_dir, PathBuf::from("./cache/speech"));
        assert_eq!(config.max_cache_bytes, 100_000_000);
        assert_eq!(config.engine, EngineKind::Service);
        assert_eq!(config.engine_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_database_url_follows_cache_dir() {
        let config = ServiceConfig {
            cache_dir: PathBuf::from("/var/cache/tts"),
            ..Default::default()
        };
        assert_eq!(config.database_url(), "sqlite:///var/cache/tts/cache.db");

        let config = ServiceConfig {
            database_url: Some("sqlite::memory:".to_string()),
            ..config
        };
        assert_eq!(config.database_url(), "sqlite::memory:");
    }

    #[test]
    fn test_synthesize_request_metadata_optional() {
        let request: SynthesizeRequest = serde_json::from_str(r#"{"text": "hi"}"#).unwrap();
        assert_eq!(request.text, "hi");
        assert!(request.metadata.is_none());
    }

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "ok".to_string(),
            uptime_secs: 3600,
            engine: "dummy".to_string(),
            cache: CacheStats {
                entries: 4,
                total_size: 400,
                max_size: 401,
                ..Default::default()
            },
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["engine"], "dummy");
        assert_eq!(json["cache"]["max_size"], 401);
    }
}
