//! Error types for cached synthesis

use audio_cache_db::StoreError;
use std::fmt;
use synthesis_engine::EngineFailure;

#[derive(Debug)]
pub enum SynthesizerError {
    /// Caller metadata is not a valid metadata document
    MalformedMetadata(String),
    /// Request text is empty
    EmptyText,
    /// The engine could not produce audio
    Engine(EngineFailure),
    /// The metadata store failed
    Store(StoreError),
    /// Produced audio could not be inspected on disk
    Io(Box<std::io::Error>),
}

impl fmt::Display for SynthesizerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SynthesizerError::MalformedMetadata(msg) => write!(f, "Malformed metadata: {}", msg),
            SynthesizerError::EmptyText => write!(f, "Request text must not be empty"),
            SynthesizerError::Engine(failure) => write!(f, "{}", failure),
            SynthesizerError::Store(err) => write!(f, "Cache store error: {}", err),
            SynthesizerError::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for SynthesizerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SynthesizerError::Engine(failure) => Some(failure),
            SynthesizerError::Store(err) => Some(err),
            SynthesizerError::Io(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<EngineFailure> for SynthesizerError {
    fn from(failure: EngineFailure) -> Self {
        SynthesizerError::Engine(failure)
    }
}

impl From<StoreError> for SynthesizerError {
    fn from(err: StoreError) -> Self {
        SynthesizerError::Store(err)
    }
}

impl From<std::io::Error> for SynthesizerError {
    fn from(err: std::io::Error) -> Self {
        SynthesizerError::Io(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, SynthesizerError>;
