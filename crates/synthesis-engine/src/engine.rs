//! The engine capability trait

use crate::error::EngineFailure;
use crate::types::{SynthesisOutput, SynthesisParams};
use async_trait::async_trait;
use std::path::Path;

/// Turns canonical synthesis parameters into an audio file at `output_path`.
///
/// Engine-level problems (network, quota, bad parameters) are returned as an
/// [`EngineFailure`] value so callers can inspect and report them.
#[async_trait]
pub trait SynthesisEngine: Send + Sync {
    /// Short engine name for logs and health output
    fn name(&self) -> &'static str;

    async fn synthesize(
        &self,
        params: &SynthesisParams,
        output_path: &Path,
    ) -> Result<SynthesisOutput, EngineFailure>;
}
