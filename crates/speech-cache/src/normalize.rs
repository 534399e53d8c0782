//! Turning raw `(text, metadata)` requests into canonical parameters

use crate::error::{Result, SynthesizerError};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use synthesis_engine::{SynthesisParams, TextType};

/// Canonical parameters plus the caller's output path, if any
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRequest {
    pub params: SynthesisParams,
    /// Caller-managed destination; such requests bypass the cache
    pub output_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SampleRate {
    Text(String),
    Number(u64),
}

impl SampleRate {
    fn into_canonical(self) -> String {
        match self {
            SampleRate::Text(s) => s.trim().to_string(),
            SampleRate::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RequestMetadata {
    output_format: Option<String>,
    voice_id: Option<String>,
    sample_rate: Option<SampleRate>,
    text_type: Option<TextType>,
    output_path: Option<PathBuf>,
    #[serde(flatten)]
    extensions: BTreeMap<String, serde_json::Value>,
}

/// Apply defaults to a request
///
/// `metadata` is a JSON object serialized as text; `None`, empty and
/// whitespace-only strings all mean "no metadata".
pub fn normalize(text: &str, metadata: Option<&str>) -> Result<NormalizedRequest> {
    if text.is_empty() {
        return Err(SynthesizerError::EmptyText);
    }

    let metadata = match metadata.map(str::trim) {
        Some(raw) if !raw.is_empty() => serde_json::from_str::<RequestMetadata>(raw)
            .map_err(|e| SynthesizerError::MalformedMetadata(e.to_string()))?,
        _ => RequestMetadata::default(),
    };

    let RequestMetadata {
        output_format,
        voice_id,
        sample_rate,
        text_type,
        output_path,
        mut extensions,
    } = metadata;

    // The request text always wins over a `text` key in metadata
    extensions.remove("text");

    let output_format =
        output_format.unwrap_or_else(|| SynthesisParams::DEFAULT_OUTPUT_FORMAT.to_string());
    let sample_rate = sample_rate
        .map(SampleRate::into_canonical)
        .unwrap_or_else(|| SynthesisParams::default_sample_rate(&output_format).to_string());

    let params = SynthesisParams {
        voice_id: voice_id.unwrap_or_else(|| SynthesisParams::DEFAULT_VOICE_ID.to_string()),
        sample_rate,
        text_type: text_type.unwrap_or_default(),
        text: text.to_string(),
        extensions,
        output_format,
    };

    Ok(NormalizedRequest {
        params,
        output_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_metadata() {
        for metadata in [None, Some(""), Some("   ")] {
            let request = normalize("hello", metadata).unwrap();
            assert_eq!(request.params, SynthesisParams::new("hello"));
            assert!(request.output_path.is_none());
        }
    }

    #[test]
    fn test_empty_object_uses_defaults() {
        let request = normalize("hello", Some("{}")).unwrap();
        assert_eq!(request.params.output_format, "ogg_vorbis");
        assert_eq!(request.params.voice_id, "Joanna");
        assert_eq!(request.params.sample_rate, "22050");
        assert_eq!(request.params.text_type, TextType::Text);
    }

    #[test]
    fn test_pcm_gets_lower_sample_rate() {
        let request = normalize("hello", Some(r#"{"output_format": "pcm"}"#)).unwrap();
        assert_eq!(request.params.sample_rate, "16000");
    }

    #[test]
    fn test_explicit_values_are_kept() {
        let request = normalize(
            "<speak>hi</speak>",
            Some(
                r#"{"output_format": "mp3", "voice_id": "Brian", "sample_rate": 8000,
                    "text_type": "ssml"}"#,
            ),
        )
        .unwrap();

        assert_eq!(request.params.output_format, "mp3");
        assert_eq!(request.params.voice_id, "Brian");
        assert_eq!(request.params.sample_rate, "8000");
        assert_eq!(request.params.text_type, TextType::Ssml);
        assert_eq!(request.params.text, "<speak>hi</speak>");
    }

    #[test]
    fn test_string_and_number_sample_rates_match() {
        let a = normalize("hi", Some(r#"{"sample_rate": "8000"}"#)).unwrap();
        let b = normalize("hi", Some(r#"{"sample_rate": 8000}"#)).unwrap();
        assert_eq!(a.params, b.params);
    }

    #[test]
    fn test_output_path_is_lifted_out() {
        let request = normalize("hello", Some(r#"{"output_path": "/tmp/test"}"#)).unwrap();
        assert_eq!(request.output_path, Some(PathBuf::from("/tmp/test")));
        assert!(request.params.extensions.is_empty());
        assert_eq!(request.params, SynthesisParams::new("hello"));
    }

    #[test]
    fn test_unknown_keys_become_extensions() {
        let request = normalize(
            "hello",
            Some(r#"{"engine_rate": "x-fast", "lexicons": ["a"], "text": "ignored"}"#),
        )
        .unwrap();

        assert_eq!(request.params.text, "hello");
        assert_eq!(request.params.extensions.len(), 2);
        assert_eq!(request.params.extensions["engine_rate"], "x-fast");
    }

    #[test]
    fn test_malformed_metadata() {
        for bad in [
            "{not json",
            "[1, 2]",
            "null",
            r#"{"text_type": "html"}"#,
            r#"{"voice_id": 3}"#,
        ] {
            let err = normalize("hello", Some(bad)).unwrap_err();
            assert!(
                matches!(err, SynthesizerError::MalformedMetadata(_)),
                "expected malformed metadata for {bad}"
            );
        }
    }

    #[test]
    fn test_empty_text() {
        let err = normalize("", None).unwrap_err();
        assert!(matches!(err, SynthesizerError::EmptyText));
    }
}
