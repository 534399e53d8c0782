//! Canonical synthesis parameters and engine output

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// How the engine should interpret `text`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextType {
    #[default]
    Text,
    Ssml,
}

impl TextType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Ssml => "ssml",
        }
    }
}

/// Fully defaulted synthesis parameters
///
/// Field order is fixed, and `extensions` is a sorted map, so the JSON form of
/// two equal parameter sets is byte-identical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisParams {
    pub output_format: String,
    pub voice_id: String,
    pub sample_rate: String,
    pub text_type: TextType,
    pub text: String,
    /// Engine-specific options passed through untouched
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: BTreeMap<String, serde_json::Value>,
}

impl SynthesisParams {
    pub const DEFAULT_OUTPUT_FORMAT: &'static str = "ogg_vorbis";
    pub const DEFAULT_VOICE_ID: &'static str = "Joanna";
    pub const PCM_SAMPLE_RATE: &'static str = "16000";
    pub const DEFAULT_SAMPLE_RATE: &'static str = "22050";

    /// Parameters for `text` with every option at its default
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            output_format: Self::DEFAULT_OUTPUT_FORMAT.to_string(),
            voice_id: Self::DEFAULT_VOICE_ID.to_string(),
            sample_rate: Self::default_sample_rate(Self::DEFAULT_OUTPUT_FORMAT).to_string(),
            text_type: TextType::Text,
            text: text.into(),
            extensions: BTreeMap::new(),
        }
    }

    /// Uncompressed PCM defaults to a lower rate than compressed formats
    pub fn default_sample_rate(output_format: &str) -> &'static str {
        if output_format.eq_ignore_ascii_case("pcm") {
            Self::PCM_SAMPLE_RATE
        } else {
            Self::DEFAULT_SAMPLE_RATE
        }
    }

    /// File extension for audio produced in this output format
    pub fn file_extension(&self) -> &'static str {
        match self.output_format.to_ascii_lowercase().as_str() {
            "ogg_vorbis" | "ogg_opus" => "ogg",
            "mp3" => "mp3",
            "pcm" => "pcm",
            "json" => "json",
            _ => "audio",
        }
    }
}

/// Successful engine result, serialized as the caller-facing success document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisOutput {
    #[serde(rename = "Audio File")]
    pub audio_file: PathBuf,
    #[serde(rename = "Audio Type")]
    pub audio_type: String,
    /// Opaque provider details; empty for cache hits
    #[serde(rename = "Response Metadata")]
    pub provider_metadata: serde_json::Value,
}
