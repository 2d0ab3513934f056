//! Resolved field options as handed over by the host.
//!
//! Hosts send options as a JSON object. Keys that are missing or `null` fall
//! back to the defaults, so a field with no configuration still renders.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{FieldError, Result};

pub const DEFAULT_PLACEHOLDER: &str = "Text eingeben oder Mikrofon verwenden...";

/// Which of the descriptor's value types the field is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Single-line input (`string`).
    #[default]
    String,
    /// Multi-line textarea (`text`).
    Text,
}

impl FieldType {
    pub const ALL: [FieldType; 2] = [FieldType::String, FieldType::Text];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Text => "text",
        }
    }

    pub fn is_multiline(&self) -> bool {
        matches!(self, Self::Text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Auto,
    De,
    En,
    Es,
    Fr,
    It,
    Pt,
    Ru,
    Ja,
    Zh,
}

impl Language {
    pub const ALL: [Language; 10] = [
        Language::Auto,
        Language::De,
        Language::En,
        Language::Es,
        Language::Fr,
        Language::It,
        Language::Pt,
        Language::Ru,
        Language::Ja,
        Language::Zh,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::De => "de",
            Self::En => "en",
            Self::Es => "es",
            Self::Fr => "fr",
            Self::It => "it",
            Self::Pt => "pt",
            Self::Ru => "ru",
            Self::Ja => "ja",
            Self::Zh => "zh",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Auto => "Auto-detect",
            Self::De => "German",
            Self::En => "English",
            Self::Es => "Spanish",
            Self::Fr => "French",
            Self::It => "Italian",
            Self::Pt => "Portuguese",
            Self::Ru => "Russian",
            Self::Ja => "Japanese",
            Self::Zh => "Chinese",
        }
    }

    /// Language hint for the provider; `None` lets it detect the language.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Auto => None,
            other => Some(other.code()),
        }
    }
}

impl std::str::FromStr for Language {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self> {
        Language::ALL
            .into_iter()
            .find(|l| l.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| FieldError::Config(format!("Unsupported language '{s}'")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineSeparator {
    /// Newline for multi-line fields, space otherwise.
    #[default]
    Auto,
    Space,
    Newline,
    None,
}

impl LineSeparator {
    pub const ALL: [LineSeparator; 4] = [
        LineSeparator::Auto,
        LineSeparator::Space,
        LineSeparator::Newline,
        LineSeparator::None,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Space => "space",
            Self::Newline => "newline",
            Self::None => "none",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Auto => "Auto (Space for input, Newline for textarea)",
            Self::Space => "Space",
            Self::Newline => "New Line",
            Self::None => "No Separator",
        }
    }

    /// The literal text inserted between existing text and an appended transcript.
    pub fn resolve(&self, field_type: FieldType) -> &'static str {
        match self {
            Self::Auto if field_type.is_multiline() => "\n",
            Self::Auto | Self::Space => " ",
            Self::Newline => "\n",
            Self::None => "",
        }
    }
}

impl std::str::FromStr for LineSeparator {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self> {
        LineSeparator::ALL
            .into_iter()
            .find(|sep| sep.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| FieldError::Config(format!("Unsupported separator '{s}'")))
    }
}

/// OpenAI credential. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Returns `None` for blank keys.
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into().trim().to_string();
        (!key.is_empty()).then_some(Self(key))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

#[derive(Clone, PartialEq, Deserialize)]
#[serde(from = "RawOptions")]
pub struct FieldOptions {
    pub placeholder: String,
    pub openai_api_key: Option<ApiKey>,
    pub language: Language,
    pub append_mode: bool,
    pub line_separator: LineSeparator,
}

/// Wire shape of the options object: every key optional and nullable.
#[derive(Deserialize)]
struct RawOptions {
    placeholder: Option<String>,
    openai_api_key: Option<String>,
    language: Option<Language>,
    append_mode: Option<bool>,
    line_separator: Option<LineSeparator>,
}

impl From<RawOptions> for FieldOptions {
    fn from(raw: RawOptions) -> Self {
        let defaults = FieldOptions::default();
        Self {
            placeholder: raw.placeholder.unwrap_or(defaults.placeholder),
            openai_api_key: raw.openai_api_key.and_then(ApiKey::new),
            language: raw.language.unwrap_or(defaults.language),
            append_mode: raw.append_mode.unwrap_or(defaults.append_mode),
            line_separator: raw.line_separator.unwrap_or(defaults.line_separator),
        }
    }
}

impl Default for FieldOptions {
    fn default() -> Self {
        Self {
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            openai_api_key: None,
            language: Language::Auto,
            append_mode: true,
            line_separator: LineSeparator::Auto,
        }
    }
}

impl fmt::Debug for FieldOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldOptions")
            .field("placeholder", &self.placeholder)
            .field(
                "openai_api_key",
                &self.openai_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("language", &self.language)
            .field("append_mode", &self.append_mode)
            .field("line_separator", &self.line_separator)
            .finish()
    }
}

impl FieldOptions {
    /// Parse the options object a host passes for one field instance.
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        if value.is_null() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_value(value)?)
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.openai_api_key = ApiKey::new(key);
        self
    }

    pub fn is_configured(&self) -> bool {
        self.openai_api_key.is_some()
    }

    /// The credential, or the configuration error that blocks transcription.
    pub fn api_key(&self) -> Result<&ApiKey> {
        self.openai_api_key.as_ref().ok_or(FieldError::MissingApiKey)
    }
}
