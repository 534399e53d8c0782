//! Caller-facing rendering of request outcomes

use crate::error::{Result, SynthesizerError};
use crate::types::CacheOutcome;

/// Prefix on every failure string
pub const EXCEPTION_PREFIX: &str = "Exception: ";

/// Render an outcome as the single string a caller receives
///
/// Success is the JSON output document. Failures are `Exception: ` followed by
/// the engine's failure descriptor, or the error text for anything else.
pub fn render(outcome: &Result<CacheOutcome>) -> String {
    match outcome {
        Ok(outcome) => match serde_json::to_string(&outcome.output) {
            Ok(doc) => doc,
            Err(e) => format!("{}{}", EXCEPTION_PREFIX, e),
        },
        Err(SynthesizerError::Engine(failure)) => match serde_json::to_string(failure) {
            Ok(doc) => format!("{}{}", EXCEPTION_PREFIX, doc),
            Err(_) => format!("{}{}", EXCEPTION_PREFIX, failure),
        },
        Err(err) => format!("{}{}", EXCEPTION_PREFIX, err),
    }
}

/// Whether a rendered string reports a failure
pub fn is_exception(rendered: &str) -> bool {
    rendered.starts_with(EXCEPTION_PREFIX)
}
