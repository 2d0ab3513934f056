use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::ErrorCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DictationState {
    Idle,
    Recording,
    Transcribing,
    Error,
}

impl fmt::Display for DictationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Recording => write!(f, "recording"),
            Self::Transcribing => write!(f, "transcribing"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Inline message shown under the field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub category: ErrorCategory,
    pub message: String,
}

impl Notice {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.category, self.message)
    }
}

#[derive(Debug, Clone)]
pub enum DictationEvent {
    StartRecording,
    CaptureFailed(String),
    StopRecording,
    TranscriptionComplete,
    TranscriptionEmpty,
    TranscriptionFailed(String),
    /// User dismissed the error notice.
    Acknowledge,
    /// Component unmounted or the request was aborted.
    Cancel,
}

pub struct DictationStateMachine {
    state: DictationState,
    notice: Option<Notice>,
}

impl Default for DictationStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl DictationStateMachine {
    pub fn new() -> Self {
        Self {
            state: DictationState::Idle,
            notice: None,
        }
    }

    pub fn state(&self) -> DictationState {
        self.state
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Attach a notice without leaving the current state (configuration problems
    /// are reported while the field stays idle).
    pub fn post_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    pub fn handle(&mut self, event: DictationEvent) -> DictationState {
        let previous = self.state;
        match (previous, &event) {
            (DictationState::Idle | DictationState::Error, DictationEvent::StartRecording) => {
                self.notice = None;
                self.state = DictationState::Recording;
            }
            (DictationState::Recording, DictationEvent::CaptureFailed(err)) => {
                self.notice = Some(Notice::new(ErrorCategory::Capture, err.clone()));
                self.state = DictationState::Error;
            }
            (DictationState::Recording, DictationEvent::StopRecording) => {
                self.state = DictationState::Transcribing;
            }
            (DictationState::Transcribing, DictationEvent::TranscriptionComplete) => {
                self.notice = None;
                self.state = DictationState::Idle;
            }
            (DictationState::Transcribing, DictationEvent::TranscriptionEmpty) => {
                self.notice = Some(Notice::new(
                    ErrorCategory::EmptyResult,
                    "No speech was recognised; the text was left unchanged",
                ));
                self.state = DictationState::Idle;
            }
            (DictationState::Transcribing, DictationEvent::TranscriptionFailed(err)) => {
                self.notice = Some(Notice::new(ErrorCategory::Transcription, err.clone()));
                self.state = DictationState::Error;
            }
            (_, DictationEvent::Acknowledge) => {
                self.notice = None;
                self.state = DictationState::Idle;
            }
            (_, DictationEvent::Cancel) => {
                self.state = DictationState::Idle;
            }
            (current, event) => {
                tracing::warn!(
                    state = %current,
                    "Ignored invalid state transition: {:?}",
                    event
                );
            }
        }
        if previous != self.state {
            tracing::debug!(from = %previous, to = %self.state, "dictation state changed");
        }
        self.state
    }
}
