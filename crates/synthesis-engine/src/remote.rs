//! Remote speech provider engine

use crate::engine::SynthesisEngine;
use crate::error::{EngineFailure, FailureCategory, Result};
use crate::types::{SynthesisOutput, SynthesisParams};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::{debug, warn};

/// Response headers that carry the provider's request id
const REQUEST_ID_HEADERS: [&str; 2] = ["x-amzn-requestid", "x-request-id"];

/// Engine that asks a speech provider service to synthesize audio
///
/// The service receives the canonical parameters as JSON at
/// `{base_url}/synthesize` and answers with the raw audio body.
pub struct RemoteEngine {
    client: Client,
    base_url: String,
}

impl RemoteEngine {
    /// Create a remote engine with a request timeout
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl SynthesisEngine for RemoteEngine {
    fn name(&self) -> &'static str {
        "service"
    }

    async fn synthesize(
        &self,
        params: &SynthesisParams,
        output_path: &Path,
    ) -> std::result::Result<SynthesisOutput, EngineFailure> {
        let url = format!("{}/synthesize", self.base_url);
        debug!(url = %url, voice = %params.voice_id, "Requesting synthesis from provider");

        let response = self.client.post(&url).json(params).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, url = %url, "Provider rejected synthesis request");
            let category = if status.is_client_error() {
                FailureCategory::Rejected
            } else {
                FailureCategory::Backend
            };
            return Err(EngineFailure::new(
                category,
                format!("provider returned status {}: {}", status, body),
            ));
        }

        let audio_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(params.output_format.as_str())
            .to_string();

        let request_id = REQUEST_ID_HEADERS.iter().find_map(|name| {
            response
                .headers()
                .get(*name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        });

        let audio = response.bytes().await?;
        fs::write(output_path, &audio)
            .await
            .map_err(|e| EngineFailure::io(&e))?;

        debug!(
            size = audio.len(),
            audio_type = %audio_type,
            path = ?output_path,
            "Wrote provider audio"
        );

        Ok(SynthesisOutput {
            audio_file: output_path.to_path_buf(),
            audio_type,
            provider_metadata: json!({
                "HTTPStatusCode": status.as_u16(),
                "RequestId": request_id,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::{header, StatusCode},
        routing::post,
        Json, Router,
    };
    use tempfile::tempdir;

    /// Serve `router` on an ephemeral loopback port and return its base URL
    async fn spawn_provider(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let engine = RemoteEngine::new("http://localhost:3006/", Duration::from_secs(5)).unwrap();
        assert_eq!(engine.base_url(), "http://localhost:3006");
        assert_eq!(engine.name(), "service");
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_a_failure() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("out.ogg");
        // Port 9 (discard) on loopback is not expected to accept connections
        let engine = RemoteEngine::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();

        let result = engine
            .synthesize(&SynthesisParams::new("hello"), &output)
            .await;

        let failure = result.unwrap_err();
        assert!(matches!(
            failure.category,
            FailureCategory::Disconnected | FailureCategory::Timeout | FailureCategory::Backend
        ));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_provider_audio_is_written() {
        let router = Router::new().route(
            "/synthesize",
            post(|Json(params): Json<SynthesisParams>| async move {
                (
                    [
                        (header::CONTENT_TYPE, "audio/ogg"),
                        (header::HeaderName::from_static("x-request-id"), "req-42"),
                    ],
                    params.text.into_bytes(),
                )
            }),
        );
        let base_url = spawn_provider(router).await;

        let dir = tempdir().unwrap();
        let output = dir.path().join("out.ogg");
        let engine = RemoteEngine::new(&base_url, Duration::from_secs(5)).unwrap();

        let result = engine
            .synthesize(&SynthesisParams::new("hello"), &output)
            .await
            .unwrap();

        assert_eq!(result.audio_file, output);
        assert_eq!(result.audio_type, "audio/ogg");
        assert_eq!(result.provider_metadata["HTTPStatusCode"], 200);
        assert_eq!(result.provider_metadata["RequestId"], "req-42");
        assert_eq!(std::fs::read(&output).unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_provider_rejection_is_a_failure() {
        let router = Router::new().route(
            "/synthesize",
            post(|| async { (StatusCode::BAD_REQUEST, "unsupported voice") }),
        );
        let base_url = spawn_provider(router).await;

        let dir = tempdir().unwrap();
        let output = dir.path().join("out.ogg");
        let engine = RemoteEngine::new(&base_url, Duration::from_secs(5)).unwrap();

        let failure = engine
            .synthesize(&SynthesisParams::new("hello"), &output)
            .await
            .unwrap_err();

        assert_eq!(failure.category, FailureCategory::Rejected);
        assert!(failure.detail.contains("unsupported voice"));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_provider_error_is_backend_failure() {
        let router = Router::new().route(
            "/synthesize",
            post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        );
        let base_url = spawn_provider(router).await;

        let dir = tempdir().unwrap();
        let engine = RemoteEngine::new(&base_url, Duration::from_secs(5)).unwrap();

        let failure = engine
            .synthesize(&SynthesisParams::new("hello"), &dir.path().join("out.ogg"))
            .await
            .unwrap_err();

        assert_eq!(failure.category, FailureCategory::Backend);
    }
}
