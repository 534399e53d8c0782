//! Error types for the speech synthesizer service

use std::fmt;

#[derive(Debug)]
pub enum ServiceError {
    Engine(synthesis_engine::EngineError),
    Store(audio_cache_db::StoreError),
    Cache(speech_cache::SynthesizerError),
    Io(Box<std::io::Error>),
    Config(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::Engine(err) => write!(f, "Engine error: {}", err),
            ServiceError::Store(err) => write!(f, "Cache store error: {}", err),
            ServiceError::Cache(err) => write!(f, "Cache error: {}", err),
            ServiceError::Io(err) => write!(f, "IO error: {}", err),
            ServiceError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServiceError::Engine(err) => Some(err),
            ServiceError::Store(err) => Some(err),
            ServiceError::Cache(err) => Some(err),
            ServiceError::Io(err) => Some(err.as_ref()),
            ServiceError::Config(_) => None,
        }
    }
}

impl From<synthesis_engine::EngineError> for ServiceError {
    fn from(err: synthesis_engine::EngineError) -> Self {
        ServiceError::Engine(err)
    }
}

impl From<audio_cache_db::StoreError> for ServiceError {
    fn from(err: audio_cache_db::StoreError) -> Self {
        ServiceError::Store(err)
    }
}

impl From<speech_cache::SynthesizerError> for ServiceError {
    fn from(err: speech_cache::SynthesizerError) -> Self {
        ServiceError::Cache(err)
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(err: std::io::Error) -> Self {
        ServiceError::Io(Box::new(err))
    }
}

impl From<tracing_subscriber::filter::ParseError> for ServiceError {
    fn from(err: tracing_subscriber::filter::ParseError) -> Self {
        ServiceError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
