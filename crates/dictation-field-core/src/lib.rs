//! Speech-to-text text field: a field descriptor for the host platform and a
//! dictation component that records, transcribes through OpenAI Whisper, and
//! merges the transcript into the field value.

pub mod audio;
pub mod component;
pub mod config;
pub mod descriptor;
pub mod errors;
pub mod merge;
pub mod options;
pub mod provider;
pub mod state;

pub use component::{CancelHandle, DictationComponent, DictationOutcome, FieldView};
pub use descriptor::{descriptor, FieldDescriptor};
pub use errors::{ErrorCategory, FieldError, Result, TranscriptionErrorKind};
pub use options::{ApiKey, FieldOptions, FieldType, Language, LineSeparator};
pub use state::{DictationState, Notice};
