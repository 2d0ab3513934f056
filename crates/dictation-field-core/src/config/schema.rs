use serde::Deserialize;

use crate::options::{FieldType, Language, LineSeparator};

/// TOML-deserializable config file format.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub field: FieldSection,

    #[serde(default)]
    pub provider: ProviderSection,

    #[serde(default)]
    pub audio: AudioSection,
}

/// Option overrides applied on top of the descriptor defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct FieldSection {
    pub placeholder: Option<String>,
    pub language: Option<Language>,
    pub append_mode: Option<bool>,
    pub line_separator: Option<LineSeparator>,
    /// Bound value type: "string" (single line) or "text" (multi-line).
    #[serde(rename = "type")]
    pub field_type: Option<FieldType>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProviderSection {
    /// Name of the env var that holds the API key (default: "OPENAI_API_KEY").
    pub api_key_env: Option<String>,
    /// Directly embedded API key (not recommended; prefer env var).
    pub api_key: Option<String>,
    /// Model name (e.g. "whisper-1").
    pub model: Option<String>,
    /// Alternative transcription endpoint.
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AudioSection {
    pub device: Option<String>,
    /// Capture rate to request from the device (default 16000).
    pub sample_rate: Option<u32>,
}

impl FileConfig {
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}
