pub mod openai;

use crate::errors::Result;
use crate::options::ApiKey;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
    #[serde(default)]
    pub language: Option<String>,
}

impl Transcript {
    /// Silence and unintelligible audio come back as blank text.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TranscribeOptions {
    /// ISO 639-1 hint; `None` asks the provider to detect the language.
    pub language: Option<String>,
}

#[async_trait]
pub trait TranscriptionProvider: Send + Sync {
    async fn transcribe(
        &self,
        audio_wav: &[u8],
        credential: &ApiKey,
        opts: &TranscribeOptions,
    ) -> Result<Transcript>;

    fn name(&self) -> &str;
}
