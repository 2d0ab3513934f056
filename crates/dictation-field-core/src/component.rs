//! The interactive speech-to-text field.
//!
//! One `DictationComponent` is bound to one text value. The host feeds it the
//! current value and options and receives new values through the change
//! callback. Everything else (microphone session, in-flight request, notice)
//! lives and dies with the component.

use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::audio::wav::encode_wav;
use crate::audio::{AudioBackend, CaptureSession};
use crate::errors::{ErrorCategory, FieldError, Result};
use crate::merge::merge_transcript;
use crate::options::{FieldOptions, FieldType};
use crate::provider::{TranscribeOptions, TranscriptionProvider};
use crate::state::{DictationEvent, DictationState, DictationStateMachine, Notice};

type ChangeCallback = Box<dyn FnMut(&str) + Send>;
type StateListener = Box<dyn FnMut(DictationState) + Send>;

/// What a completed dictation cycle did to the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DictationOutcome {
    /// The merged value that was emitted to the host.
    Inserted(String),
    /// Nothing recognised; the value is unchanged.
    Empty,
    /// Aborted by unmount or navigation; the value is unchanged.
    Cancelled,
}

/// Snapshot of everything the host needs to draw the field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldView {
    pub text: String,
    /// Present only while the value is empty.
    pub placeholder: Option<String>,
    pub multiline: bool,
    /// The start/stop button; off without a key and while transcribing.
    pub mic_enabled: bool,
    pub recording: bool,
    pub busy: bool,
    pub notice: Option<Notice>,
}

/// Aborts the component's outstanding work from another task.
#[derive(Debug, Clone)]
pub struct CancelHandle(CancellationToken);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.is_cancelled()
    }
}

pub struct DictationComponent {
    value: Option<String>,
    options: FieldOptions,
    field_type: FieldType,
    device: Option<String>,
    sm: DictationStateMachine,
    audio: Arc<dyn AudioBackend>,
    provider: Arc<dyn TranscriptionProvider>,
    on_change: ChangeCallback,
    on_state: Option<StateListener>,
    session: Option<Box<dyn CaptureSession>>,
    cancel: CancellationToken,
}

impl DictationComponent {
    pub fn new(
        value: Option<String>,
        options: FieldOptions,
        field_type: FieldType,
        audio: Arc<dyn AudioBackend>,
        provider: Arc<dyn TranscriptionProvider>,
        on_change: impl FnMut(&str) + Send + 'static,
    ) -> Self {
        tracing::debug!(?options, field_type = field_type.as_str(), "dictation field mounted");
        Self {
            value,
            options,
            field_type,
            device: None,
            sm: DictationStateMachine::new(),
            audio,
            provider,
            on_change: Box::new(on_change),
            on_state: None,
            session: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Capture from a named input device instead of the system default.
    pub fn with_device(mut self, device: Option<String>) -> Self {
        self.device = device;
        self
    }

    /// Observe state transitions, e.g. to show a recording indicator.
    pub fn with_state_listener(
        mut self,
        listener: impl FnMut(DictationState) + Send + 'static,
    ) -> Self {
        self.on_state = Some(Box::new(listener));
        self
    }

    pub fn state(&self) -> DictationState {
        self.sm.state()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.sm.notice()
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn options(&self) -> &FieldOptions {
        &self.options
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle(self.cancel.clone())
    }

    pub fn render(&self) -> FieldView {
        let text = self.value.clone().unwrap_or_default();
        let state = self.sm.state();
        FieldView {
            placeholder: text.is_empty().then(|| self.options.placeholder.clone()),
            text,
            multiline: self.field_type.is_multiline(),
            mic_enabled: self.options.is_configured()
                && !self.cancel.is_cancelled()
                && matches!(
                    state,
                    DictationState::Idle | DictationState::Error | DictationState::Recording
                ),
            recording: state == DictationState::Recording,
            busy: state == DictationState::Transcribing,
            notice: self.sm.notice().cloned(),
        }
    }

    /// The host's value changed underneath us (reload, another editor).
    pub fn set_value(&mut self, value: Option<String>) {
        self.value = value;
    }

    pub fn set_options(&mut self, options: FieldOptions) {
        self.options = options;
    }

    /// Direct typing into the text control.
    pub fn edit(&mut self, text: impl Into<String>) {
        let text = text.into();
        (self.on_change)(&text);
        self.value = Some(text);
    }

    pub fn acknowledge_error(&mut self) {
        self.dispatch(DictationEvent::Acknowledge);
    }

    /// Start recording. Refused without a credential, and while a cycle is running.
    pub fn activate_microphone(&mut self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(FieldError::InvalidState("field has been unmounted".into()));
        }
        let state = self.sm.state();
        if matches!(state, DictationState::Recording | DictationState::Transcribing) {
            return Err(FieldError::InvalidState(format!(
                "microphone is busy ({state})"
            )));
        }

        if let Err(e) = self.options.api_key() {
            if state == DictationState::Error {
                self.dispatch(DictationEvent::Acknowledge);
            }
            self.sm
                .post_notice(Notice::new(ErrorCategory::Configuration, e.to_string()));
            tracing::warn!("microphone activation refused: no API key configured");
            return Err(e);
        }

        self.dispatch(DictationEvent::StartRecording);
        match self.audio.start(self.device.as_deref()) {
            Ok(session) => {
                self.session = Some(session);
                tracing::info!(device = self.device.as_deref().unwrap_or("default"), "recording");
                Ok(())
            }
            Err(e) => {
                tracing::error!("could not start audio capture: {e}");
                self.dispatch(DictationEvent::CaptureFailed(e.to_string()));
                Err(e)
            }
        }
    }

    /// Stop recording, transcribe, and merge the transcript into the value.
    ///
    /// On error the state is `Error`, a notice is set, and the value is untouched.
    pub async fn deactivate_microphone(&mut self) -> Result<DictationOutcome> {
        if self.sm.state() != DictationState::Recording {
            return Err(FieldError::InvalidState(format!(
                "not recording ({})",
                self.sm.state()
            )));
        }
        let Some(session) = self.session.take() else {
            return Err(FieldError::InvalidState("no capture session".into()));
        };

        if self.cancel.is_cancelled() {
            drop(session);
            self.dispatch(DictationEvent::Cancel);
            return Ok(DictationOutcome::Cancelled);
        }

        let audio = match tokio::task::spawn_blocking(move || session.finish()).await {
            Ok(Ok(audio)) => audio,
            Ok(Err(e)) => return Err(self.capture_failed(e)),
            Err(e) => {
                return Err(self.capture_failed(FieldError::Capture(format!(
                    "capture task failed: {e}"
                ))))
            }
        };
        self.dispatch(DictationEvent::StopRecording);

        if audio.is_too_short() {
            tracing::warn!(secs = audio.duration_secs(), "recording too short; skipping upload");
            self.dispatch(DictationEvent::TranscriptionEmpty);
            return Ok(DictationOutcome::Empty);
        }

        // Options may have changed while recording.
        let credential = match self.options.api_key() {
            Ok(key) => key.clone(),
            Err(e) => {
                self.dispatch(DictationEvent::Cancel);
                self.sm
                    .post_notice(Notice::new(ErrorCategory::Configuration, e.to_string()));
                return Err(e);
            }
        };

        let wav = encode_wav(&audio);
        let opts = TranscribeOptions {
            language: self.options.language.hint().map(str::to_owned),
        };
        tracing::info!(
            provider = self.provider.name(),
            secs = audio.duration_secs(),
            "transcribing"
        );

        let provider = Arc::clone(&self.provider);
        let token = self.cancel.clone();
        let result = tokio::select! {
            _ = token.cancelled() => None,
            r = provider.transcribe(&wav, &credential, &opts) => Some(r),
        };

        match result {
            None => {
                tracing::info!("transcription cancelled");
                self.dispatch(DictationEvent::Cancel);
                Ok(DictationOutcome::Cancelled)
            }
            Some(Err(e)) => {
                tracing::error!("transcription failed: {e}");
                self.dispatch(DictationEvent::TranscriptionFailed(e.to_string()));
                Err(e)
            }
            Some(Ok(transcript)) if transcript.is_blank() => {
                tracing::warn!("transcription returned no text");
                self.dispatch(DictationEvent::TranscriptionEmpty);
                Ok(DictationOutcome::Empty)
            }
            Some(Ok(transcript)) => {
                let merged = merge_transcript(
                    self.value.as_deref(),
                    &transcript.text,
                    &self.options,
                    self.field_type,
                );
                (self.on_change)(&merged);
                self.value = Some(merged.clone());
                self.dispatch(DictationEvent::TranscriptionComplete);
                tracing::info!(chars = merged.chars().count(), "transcript inserted");
                Ok(DictationOutcome::Inserted(merged))
            }
        }
    }

    /// The single microphone button: start when idle, stop when recording.
    pub async fn toggle_microphone(&mut self) -> Result<Option<DictationOutcome>> {
        match self.sm.state() {
            DictationState::Idle | DictationState::Error => {
                self.activate_microphone()?;
                Ok(None)
            }
            DictationState::Recording => self.deactivate_microphone().await.map(Some),
            DictationState::Transcribing => Ok(None),
        }
    }

    /// Tear down: abort the request and release the microphone.
    pub fn unmount(self) {
        drop(self);
    }

    fn capture_failed(&mut self, e: FieldError) -> FieldError {
        tracing::error!("audio capture failed: {e}");
        self.dispatch(DictationEvent::CaptureFailed(e.to_string()));
        e
    }

    fn dispatch(&mut self, event: DictationEvent) {
        let before = self.sm.state();
        let after = self.sm.handle(event);
        if before != after {
            if let Some(listener) = self.on_state.as_mut() {
                listener(after);
            }
        }
    }
}

impl Drop for DictationComponent {
    fn drop(&mut self) {
        self.cancel.cancel();
        if self.session.take().is_some() {
            tracing::debug!("field unmounted while recording");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::DeviceInfo;
    use crate::options::ApiKey;
    use crate::provider::Transcript;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct NoAudio;

    impl AudioBackend for NoAudio {
        fn list_devices(&self) -> Result<Vec<DeviceInfo>> {
            Ok(vec![])
        }

        fn start(&self, _device_name: Option<&str>) -> Result<Box<dyn CaptureSession>> {
            Err(FieldError::NoDevice)
        }
    }

    struct Unreachable;

    #[async_trait]
    impl TranscriptionProvider for Unreachable {
        async fn transcribe(
            &self,
            _: &[u8],
            _: &ApiKey,
            _: &TranscribeOptions,
        ) -> Result<Transcript> {
            panic!("no request expected")
        }

        fn name(&self) -> &str {
            "unreachable"
        }
    }

    fn component(
        value: Option<&str>,
        options: FieldOptions,
    ) -> (DictationComponent, Arc<Mutex<Vec<String>>>) {
        let changes = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&changes);
        let c = DictationComponent::new(
            value.map(str::to_owned),
            options,
            FieldType::String,
            Arc::new(NoAudio),
            Arc::new(Unreachable),
            move |v: &str| sink.lock().unwrap().push(v.to_string()),
        );
        (c, changes)
    }

    #[test]
    fn renders_placeholder_only_when_empty() {
        let (c, _) = component(None, FieldOptions::default());
        let view = c.render();
        assert_eq!(view.text, "");
        assert_eq!(view.placeholder.as_deref(), Some(crate::options::DEFAULT_PLACEHOLDER));
        assert!(!view.mic_enabled, "no key configured");

        let (c, _) = component(Some("hi"), FieldOptions::default().with_api_key("sk"));
        let view = c.render();
        assert!(view.placeholder.is_none());
        assert!(view.mic_enabled);
    }

    #[test]
    fn missing_key_stays_idle_with_configuration_notice() {
        let (mut c, changes) = component(Some("keep"), FieldOptions::default());
        let err = c.activate_microphone().expect_err("must refuse");
        assert!(matches!(err, FieldError::MissingApiKey));
        assert_eq!(c.state(), DictationState::Idle);
        assert_eq!(c.notice().unwrap().category, ErrorCategory::Configuration);
        assert_eq!(c.value(), Some("keep"));
        assert!(changes.lock().unwrap().is_empty());
    }

    #[test]
    fn capture_failure_enters_error_and_acknowledge_resets() {
        let (mut c, _) = component(None, FieldOptions::default().with_api_key("sk"));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_w = Arc::clone(&seen);
        c = c.with_state_listener(move |s| seen_w.lock().unwrap().push(s));

        let err = c.activate_microphone().expect_err("no device");
        assert!(matches!(err, FieldError::NoDevice));
        assert_eq!(c.state(), DictationState::Error);
        assert_eq!(c.notice().unwrap().category, ErrorCategory::Capture);

        c.acknowledge_error();
        assert_eq!(c.state(), DictationState::Idle);
        assert!(c.notice().is_none());
        assert_eq!(
            *seen.lock().unwrap(),
            vec![DictationState::Recording, DictationState::Error, DictationState::Idle]
        );
    }

    #[test]
    fn edit_emits_change() {
        let (mut c, changes) = component(Some("a"), FieldOptions::default());
        c.edit("typed");
        assert_eq!(c.value(), Some("typed"));
        assert_eq!(*changes.lock().unwrap(), vec!["typed".to_string()]);
    }

    #[tokio::test]
    async fn deactivate_when_idle_is_rejected() {
        let (mut c, _) = component(None, FieldOptions::default().with_api_key("sk"));
        let err = c.deactivate_microphone().await.expect_err("not recording");
        assert!(matches!(err, FieldError::InvalidState(_)));
        assert_eq!(c.state(), DictationState::Idle);
    }

    #[test]
    fn cancelled_component_refuses_new_cycles() {
        let (mut c, _) = component(None, FieldOptions::default().with_api_key("sk"));
        c.cancel_handle().cancel();
        assert!(!c.render().mic_enabled);
        assert!(matches!(
            c.activate_microphone(),
            Err(FieldError::InvalidState(_))
        ));
    }
}
