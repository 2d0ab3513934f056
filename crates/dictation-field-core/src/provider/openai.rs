use async_trait::async_trait;
use reqwest::{multipart, StatusCode};
use serde::Deserialize;

use crate::errors::{FieldError, Result, TranscriptionErrorKind};
use crate::options::ApiKey;
use crate::provider::{TranscribeOptions, Transcript, TranscriptionProvider};

pub const OPENAI_TRANSCRIPTION_URL: &str = "https://api.openai.com/v1/audio/transcriptions";
pub const DEFAULT_MODEL: &str = "whisper-1";

pub struct OpenAiProvider {
    model: String,
    client: reqwest::Client,
    /// Override base URL for testing.
    base_url: String,
}

impl Default for OpenAiProvider {
    fn default() -> Self {
        Self::new(None)
    }
}

impl OpenAiProvider {
    pub fn new(model: Option<String>) -> Self {
        Self::with_base_url(model, OPENAI_TRANSCRIPTION_URL.to_string())
    }

    /// Create with a custom endpoint (mock servers, proxies, compatible APIs).
    pub fn with_base_url(model: Option<String>, base_url: String) -> Self {
        Self {
            model: model.unwrap_or_else(|| DEFAULT_MODEL.into()),
            client: reqwest::Client::new(),
            base_url,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorBody {
    error: OpenAiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorDetail {
    message: String,
}

/// `response_format=json` returns `{ "text": "..." }`.
#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    text: String,
}

fn classify(status: StatusCode) -> (TranscriptionErrorKind, &'static str) {
    match status.as_u16() {
        401 => (TranscriptionErrorKind::Authentication, " (invalid API key)"),
        403 => (TranscriptionErrorKind::Authentication, " (access denied)"),
        429 => (TranscriptionErrorKind::RateLimited, " (rate limited; wait and retry)"),
        413 => (TranscriptionErrorKind::InvalidAudio, " (audio file too large; max 25 MB)"),
        400 | 415 | 422 => (TranscriptionErrorKind::InvalidAudio, ""),
        _ => (TranscriptionErrorKind::Server, ""),
    }
}

/// Providers sometimes echo the key back in error text.
fn redact(message: &str, credential: &ApiKey) -> String {
    message.replace(credential.expose(), "[REDACTED]")
}

#[async_trait]
impl TranscriptionProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn transcribe(
        &self,
        audio_wav: &[u8],
        credential: &ApiKey,
        opts: &TranscribeOptions,
    ) -> Result<Transcript> {
        let audio_part = multipart::Part::bytes(audio_wav.to_vec())
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|e| {
                FieldError::transcription(
                    TranscriptionErrorKind::InvalidAudio,
                    format!("MIME error: {e}"),
                )
            })?;

        let mut form = multipart::Form::new()
            .part("file", audio_part)
            .text("model", self.model.clone())
            .text("response_format", "json");

        if let Some(ref lang) = opts.language {
            form = form.text("language", lang.clone());
        }

        tracing::debug!(
            bytes = audio_wav.len(),
            model = %self.model,
            language = opts.language.as_deref().unwrap_or("auto"),
            "submitting audio for transcription"
        );

        let resp = self
            .client
            .post(&self.base_url)
            .bearer_auth(credential.expose())
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                FieldError::transcription(
                    TranscriptionErrorKind::Network,
                    redact(&e.without_url().to_string(), credential),
                )
            })?;

        let status = resp.status();

        if !status.is_success() {
            let (kind, hint) = classify(status);
            let body = resp.text().await.unwrap_or_default();
            let api_msg = serde_json::from_str::<OpenAiErrorBody>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(FieldError::transcription(
                kind,
                redact(&format!("HTTP {status}{hint}: {api_msg}"), credential),
            ));
        }

        let body = resp.bytes().await.map_err(|e| {
            FieldError::transcription(TranscriptionErrorKind::Network, e.without_url().to_string())
        })?;
        let parsed: OpenAiResponse = serde_json::from_slice(&body).map_err(|e| {
            FieldError::transcription(
                TranscriptionErrorKind::MalformedResponse,
                format!("Unexpected response body: {e}"),
            )
        })?;

        Ok(Transcript {
            text: parsed.text,
            language: opts.language.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn key(k: &str) -> ApiKey {
        ApiKey::new(k).unwrap()
    }

    fn dummy_wav() -> Vec<u8> {
        crate::audio::wav::encode_wav(&crate::audio::AudioData {
            samples: vec![0.0; 1600],
            sample_rate: 16000,
        })
    }

    fn provider_for(server: &mockito::Server) -> OpenAiProvider {
        OpenAiProvider::with_base_url(None, server.url() + "/v1/audio/transcriptions")
    }

    #[tokio::test]
    async fn transcribe_success_sends_bearer_and_model() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/audio/transcriptions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::Regex("whisper-1".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"text":"hello world"}"#)
            .create_async()
            .await;

        let provider = provider_for(&server);
        let result = provider
            .transcribe(&dummy_wav(), &key("sk-test"), &TranscribeOptions::default())
            .await
            .expect("transcribe should succeed");

        assert_eq!(result.text, "hello world");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn language_hint_is_sent() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/audio/transcriptions")
            .match_body(Matcher::Regex(r#"name="language"\r\n\r\nfr"#.into()))
            .with_status(200)
            .with_body(r#"{"text":"bonjour"}"#)
            .create_async()
            .await;

        let provider = provider_for(&server);
        let opts = TranscribeOptions {
            language: Some("fr".into()),
            ..Default::default()
        };
        let result = provider
            .transcribe(&dummy_wav(), &key("sk-test"), &opts)
            .await
            .expect("transcribe should succeed");

        assert_eq!(result.text, "bonjour");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn unauthorized_is_authentication_error_without_key() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/audio/transcriptions")
            .with_status(401)
            .with_body(r#"{"error":{"message":"Incorrect API key provided: sk-leaky"}}"#)
            .create_async()
            .await;

        let provider = provider_for(&server);
        let err = provider
            .transcribe(&dummy_wav(), &key("sk-leaky"), &TranscribeOptions::default())
            .await
            .expect_err("should fail on 401");

        match &err {
            FieldError::Transcription { kind, message } => {
                assert_eq!(*kind, TranscriptionErrorKind::Authentication);
                assert!(message.contains("401"), "{message}");
                assert!(!message.contains("sk-leaky"), "{message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn rate_limit_and_server_errors_are_classified() {
        for (status, expected) in [
            (429, TranscriptionErrorKind::RateLimited),
            (400, TranscriptionErrorKind::InvalidAudio),
            (503, TranscriptionErrorKind::Server),
        ] {
            let mut server = mockito::Server::new_async().await;
            let provider = provider_for(&server);
            server
                .mock("POST", "/v1/audio/transcriptions")
                .with_status(status)
                .with_body("upstream trouble")
                .create_async()
                .await;
            let err = provider
                .transcribe(&dummy_wav(), &key("sk-test"), &TranscribeOptions::default())
                .await
                .expect_err("non-success status must fail");
            match err {
                FieldError::Transcription { kind, message } => {
                    assert_eq!(kind, expected, "status {status}");
                    assert!(message.contains("upstream trouble"), "{message}");
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn garbage_body_is_malformed_response() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/audio/transcriptions")
            .with_status(200)
            .with_body("<html>not json</html>")
            .create_async()
            .await;

        let provider = provider_for(&server);
        let err = provider
            .transcribe(&dummy_wav(), &key("sk-test"), &TranscribeOptions::default())
            .await
            .expect_err("non-JSON body must fail");
        assert!(matches!(
            err,
            FieldError::Transcription {
                kind: TranscriptionErrorKind::MalformedResponse,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_network_error() {
        let provider = OpenAiProvider::with_base_url(
            None,
            "http://127.0.0.1:9/v1/audio/transcriptions".into(),
        );
        let err = provider
            .transcribe(&dummy_wav(), &key("sk-test"), &TranscribeOptions::default())
            .await
            .expect_err("connection must fail");
        assert!(matches!(
            err,
            FieldError::Transcription {
                kind: TranscriptionErrorKind::Network,
                ..
            }
        ));
    }
}
