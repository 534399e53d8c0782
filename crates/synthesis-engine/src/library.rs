//! Local synthesis: in-process backends and locally installed programs

use crate::engine::SynthesisEngine;
use crate::error::{EngineFailure, FailureCategory};
use crate::types::{SynthesisOutput, SynthesisParams};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

/// Audio produced by a [`SpeechBackend`]
#[derive(Debug, Clone)]
pub struct SynthesizedAudio {
    pub audio: Vec<u8>,
    pub audio_type: String,
    pub metadata: serde_json::Value,
}

/// A synchronous speech synthesis library
///
/// Calls may block for a long time; [`LibraryEngine`] runs them on the
/// blocking thread pool.
pub trait SpeechBackend: Send + Sync + 'static {
    fn synthesize(&self, params: &SynthesisParams) -> Result<SynthesizedAudio, EngineFailure>;
}

/// Engine that calls a [`SpeechBackend`] in-process
pub struct LibraryEngine<B> {
    backend: Arc<B>,
}

impl<B: SpeechBackend> LibraryEngine<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }
}

#[async_trait]
impl<B: SpeechBackend> SynthesisEngine for LibraryEngine<B> {
    fn name(&self) -> &'static str {
        "library"
    }

    async fn synthesize(
        &self,
        params: &SynthesisParams,
        output_path: &Path,
    ) -> Result<SynthesisOutput, EngineFailure> {
        let backend = Arc::clone(&self.backend);
        let owned = params.clone();

        let produced = tokio::task::spawn_blocking(move || backend.synthesize(&owned))
            .await
            .map_err(|e| EngineFailure::new(FailureCategory::Backend, e.to_string()))??;

        // A dropped (timed out) call never reaches the output path
        fs::write(output_path, &produced.audio)
            .await
            .map_err(|e| EngineFailure::io(&e))?;

        debug!(size = produced.audio.len(), path = ?output_path, "Library synthesis complete");

        Ok(SynthesisOutput {
            audio_file: output_path.to_path_buf(),
            audio_type: produced.audio_type,
            provider_metadata: produced.metadata,
        })
    }
}

/// Engine that pipes text through a locally installed synthesizer program
///
/// The program gets the text on stdin and must write audio to stdout.
/// `{voice}`, `{rate}` and `{format}` in arguments are replaced with the
/// request's voice id, sample rate and output format. Stdin is fed from its
/// own task while stdout is drained, and the child is killed if the call is
/// dropped.
#[derive(Debug, Clone)]
pub struct CommandEngine {
    program: String,
    args: Vec<String>,
}

impl CommandEngine {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Parse a whitespace separated command line such as `espeak-ng --stdout -v {voice}`
    pub fn from_command_line(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect()))
    }

    fn expand_args(&self, params: &SynthesisParams) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{voice}", &params.voice_id)
                    .replace("{rate}", &params.sample_rate)
                    .replace("{format}", &params.output_format)
            })
            .collect()
    }
}

#[async_trait]
impl SynthesisEngine for CommandEngine {
    fn name(&self) -> &'static str {
        "library"
    }

    async fn synthesize(
        &self,
        params: &SynthesisParams,
        output_path: &Path,
    ) -> Result<SynthesisOutput, EngineFailure> {
        let mut child = Command::new(&self.program)
            .args(self.expand_args(params))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                EngineFailure::new(
                    FailureCategory::Disconnected,
                    format!("failed to start {}: {}", self.program, e),
                )
            })?;

        let stdin = child.stdin.take();
        let text = params.text.clone().into_bytes();
        let feeder = tokio::spawn(async move {
            match stdin {
                Some(mut stdin) => stdin.write_all(&text).await,
                None => Ok(()),
            }
        });

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| EngineFailure::io(&e))?;

        if !output.status.success() {
            return Err(EngineFailure::new(
                FailureCategory::Rejected,
                format!(
                    "{} exited with {}: {}",
                    self.program,
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }

        match feeder.await {
            Ok(Ok(())) => {}
            // The program finished without reading all of its input
            Ok(Err(e)) if e.kind() == ErrorKind::BrokenPipe => {
                warn!(program = %self.program, "Synthesizer closed stdin early");
            }
            Ok(Err(e)) => return Err(EngineFailure::io(&e)),
            Err(e) => return Err(EngineFailure::new(FailureCategory::Backend, e.to_string())),
        }

        fs::write(output_path, &output.stdout)
            .await
            .map_err(|e| EngineFailure::io(&e))?;

        debug!(
            size = output.stdout.len(),
            program = %self.program,
            path = ?output_path,
            "Command synthesis complete"
        );

        Ok(SynthesisOutput {
            audio_file: output_path.to_path_buf(),
            audio_type: params.output_format.clone(),
            provider_metadata: serde_json::json!({ "program": self.program }),
        })
    }
}
