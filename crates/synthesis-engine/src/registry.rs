//! Explicit registry of engine variants

use crate::dummy::DummyEngine;
use crate::engine::SynthesisEngine;
use crate::error::{EngineError, Result};
use crate::library::CommandEngine;
use crate::remote::RemoteEngine;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// The engine variants a service can be configured with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    /// Remote speech provider service
    Service,
    /// In-process library backend
    Library,
    /// Test double
    Dummy,
}

impl EngineKind {
    pub const ALL: [EngineKind; 3] = [EngineKind::Service, EngineKind::Library, EngineKind::Dummy];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Service => "SERVICE",
            Self::Library => "LIBRARY",
            Self::Dummy => "DUMMY",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(EngineKind::as_str).collect();
                EngineError::UnknownEngine(format!(
                    "{} is not one of {}",
                    s,
                    names.join(", ")
                ))
            })
    }
}

/// Settings needed to construct any engine variant
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub service_url: String,
    pub timeout: Duration,
    pub library_command: String,
}

/// Construct the engine selected by `kind`
pub fn build_engine(
    kind: EngineKind,
    settings: &EngineSettings,
) -> Result<Arc<dyn SynthesisEngine>> {
    let engine: Arc<dyn SynthesisEngine> = match kind {
        EngineKind::Service => {
            Arc::new(RemoteEngine::new(&settings.service_url, settings.timeout)?)
        }
        EngineKind::Library => {
            let engine = CommandEngine::from_command_line(&settings.library_command)
                .ok_or_else(|| {
                    EngineError::UnknownEngine(
                        "LIBRARY engine needs a non-empty command".to_string(),
                    )
                })?;
            Arc::new(engine)
        }
        EngineKind::Dummy => Arc::new(DummyEngine::new()),
    };

    info!(engine = engine.name(), "Synthesis engine ready");
    Ok(engine)
}
