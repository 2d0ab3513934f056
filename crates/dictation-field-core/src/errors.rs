use miette::Diagnostic;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// What went wrong talking to the transcription service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptionErrorKind {
    Network,
    Authentication,
    RateLimited,
    InvalidAudio,
    Server,
    MalformedResponse,
}

impl fmt::Display for TranscriptionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Network => "network error",
            Self::Authentication => "authentication failed",
            Self::RateLimited => "rate limited",
            Self::InvalidAudio => "audio rejected",
            Self::Server => "server error",
            Self::MalformedResponse => "malformed response",
        };
        f.write_str(s)
    }
}

/// User-facing failure category shown inline next to the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Configuration,
    Capture,
    Transcription,
    /// Non-fatal: nothing was recognised.
    EmptyResult,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "not configured"),
            Self::Capture => write!(f, "microphone unavailable"),
            Self::Transcription => write!(f, "transcription failed"),
            Self::EmptyResult => write!(f, "nothing recognised"),
        }
    }
}

#[derive(Error, Diagnostic, Debug)]
pub enum FieldError {
    #[error("Speech to text is not configured: no OpenAI API key set")]
    #[diagnostic(
        code(dictation_field::missing_api_key),
        help("Set the field's `openai_api_key` option or the OPENAI_API_KEY env var")
    )]
    MissingApiKey,

    #[error("No audio input device available")]
    #[diagnostic(
        code(dictation_field::no_device),
        help("Check that a microphone is connected and accessible")
    )]
    NoDevice,

    #[error("Audio capture error: {0}")]
    #[diagnostic(code(dictation_field::capture))]
    Capture(String),

    #[error("Transcription failed ({kind}): {message}")]
    #[diagnostic(code(dictation_field::transcription))]
    Transcription {
        kind: TranscriptionErrorKind,
        message: String,
    },

    #[error("Invalid dictation state: {0}")]
    #[diagnostic(code(dictation_field::state))]
    InvalidState(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(dictation_field::config))]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("Invalid config file: {0}")]
    #[diagnostic(
        code(dictation_field::toml),
        help("Check ~/.config/dictation-field/config.toml")
    )]
    Toml(#[from] toml::de::Error),
}

impl FieldError {
    pub fn transcription(kind: TranscriptionErrorKind, message: impl Into<String>) -> Self {
        Self::Transcription {
            kind,
            message: message.into(),
        }
    }

    /// Notice category for errors that end a dictation cycle.
    pub fn category(&self) -> Option<ErrorCategory> {
        match self {
            Self::MissingApiKey => Some(ErrorCategory::Configuration),
            Self::NoDevice | Self::Capture(_) => Some(ErrorCategory::Capture),
            Self::Transcription { .. } => Some(ErrorCategory::Transcription),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, FieldError>;
