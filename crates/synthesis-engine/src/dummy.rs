//! Deterministic engine double

use crate::engine::SynthesisEngine;
use crate::error::EngineFailure;
use crate::types::{SynthesisOutput, SynthesisParams};
use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::fs;

const DEFAULT_FILE_SIZE: u64 = 50_000;

/// Engine that writes placeholder files of a configurable size
///
/// It can act connected or disconnected, and optionally sleeps before
/// writing so concurrency and timeout behavior can be exercised.
pub struct DummyEngine {
    connected: AtomicBool,
    file_size: AtomicU64,
    delay_ms: AtomicU64,
    calls: AtomicUsize,
}

impl DummyEngine {
    pub fn new() -> Self {
        Self {
            connected: AtomicBool::new(true),
            file_size: AtomicU64::new(DEFAULT_FILE_SIZE),
            delay_ms: AtomicU64::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    /// Act connected (write files) or disconnected (report a failure)
    pub fn set_connection(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Size in bytes of files written from now on
    pub fn set_file_size(&self, size: u64) {
        self.file_size.store(size, Ordering::SeqCst);
    }

    /// Latency added before every synthesis
    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Number of synthesize calls received so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for DummyEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SynthesisEngine for DummyEngine {
    fn name(&self) -> &'static str {
        "dummy"
    }

    async fn synthesize(
        &self,
        params: &SynthesisParams,
        output_path: &Path,
    ) -> Result<SynthesisOutput, EngineFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        if !self.connected.load(Ordering::SeqCst) {
            return Err(EngineFailure::disconnected("dummy engine is disconnected"));
        }

        let size = self.file_size.load(Ordering::SeqCst) as usize;
        fs::write(output_path, vec![0u8; size])
            .await
            .map_err(|e| EngineFailure::io(&e))?;

        Ok(SynthesisOutput {
            audio_file: output_path.to_path_buf(),
            audio_type: params.output_format.clone(),
            provider_metadata: serde_json::json!({ "engine": "dummy" }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureCategory;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_connected_writes_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("voice.ogg");
        let engine = DummyEngine::new();
        engine.set_file_size(100);

        let output = engine
            .synthesize(&SynthesisParams::new("hello"), &path)
            .await
            .unwrap();

        assert_eq!(output.audio_file, path);
        assert_eq!(output.audio_type, "ogg_vorbis");
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 100);
        assert_eq!(engine.calls(), 1);
    }

    #[tokio::test]
    async fn test_disconnected_reports_failure() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("voice.ogg");
        let engine = DummyEngine::new();
        engine.set_connection(false);

        let failure = engine
            .synthesize(&SynthesisParams::new("hello"), &path)
            .await
            .unwrap_err();

        assert_eq!(failure.category, FailureCategory::Disconnected);
        assert!(!path.exists());
        assert_eq!(engine.calls(), 1);
    }
}
