//! Error types for synthesis engines

use serde::{Deserialize, Serialize};
use std::fmt;

/// Broad cause of an engine failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    /// Provider could not be reached
    Disconnected,
    /// Provider did not answer within the configured timeout
    Timeout,
    /// Provider refused the request (bad parameters, quota)
    Rejected,
    /// Provider or backend failed internally
    Backend,
    /// Audio could not be written to the output path
    Io,
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Timeout => "timeout",
            Self::Rejected => "rejected",
            Self::Backend => "backend",
            Self::Io => "io",
        };
        f.write_str(name)
    }
}

/// Structured description of a failed synthesis
///
/// This is an outcome, not a fault: engines return it instead of raising, and
/// it serializes to the failure document shown to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineFailure {
    pub category: FailureCategory,
    pub detail: String,
}

impl EngineFailure {
    pub fn new(category: FailureCategory, detail: impl Into<String>) -> Self {
        Self {
            category,
            detail: detail.into(),
        }
    }

    pub fn disconnected(detail: impl Into<String>) -> Self {
        Self::new(FailureCategory::Disconnected, detail)
    }

    pub fn timeout(detail: impl Into<String>) -> Self {
        Self::new(FailureCategory::Timeout, detail)
    }

    pub fn io(err: &std::io::Error) -> Self {
        Self::new(FailureCategory::Io, err.to_string())
    }
}

impl fmt::Display for EngineFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Engine failure ({}): {}", self.category, self.detail)
    }
}

impl std::error::Error for EngineFailure {}

impl From<reqwest::Error> for EngineFailure {
    fn from(e: reqwest::Error) -> Self {
        let category = if e.is_timeout() {
            FailureCategory::Timeout
        } else if e.is_connect() {
            FailureCategory::Disconnected
        } else if e.status().is_some_and(|s| s.is_client_error()) {
            FailureCategory::Rejected
        } else {
            FailureCategory::Backend
        };
        Self::new(category, e.to_string())
    }
}

/// Errors raised while constructing an engine
#[derive(Debug)]
pub enum EngineError {
    /// Engine name is not one of the registered variants
    UnknownEngine(String),
    /// HTTP client could not be built
    Http(reqwest::Error),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownEngine(msg) => write!(f, "Bad engine: {}", msg),
            Self::Http(e) => write!(f, "Engine HTTP client error: {}", e),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Http(e) => Some(e),
            Self::UnknownEngine(_) => None,
        }
    }
}

impl From<reqwest::Error> for EngineError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e)
    }
}

/// Result type for engine construction
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_display() {
        let failure = EngineFailure::disconnected("no route to host");
        assert_eq!(
            failure.to_string(),
            "Engine failure (disconnected): no route to host"
        );
    }

    #[test]
    fn test_failure_serialization() {
        let failure = EngineFailure::timeout("took 30s");
        let json = serde_json::to_string(&failure).unwrap();
        assert_eq!(json, r#"{"category":"timeout","detail":"took 30s"}"#);
    }

    #[test]
    fn test_unknown_engine_display() {
        let err = EngineError::UnknownEngine("FOO".to_string());
        assert_eq!(err.to_string(), "Bad engine: FOO");
    }
}
