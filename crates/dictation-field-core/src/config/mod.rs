pub mod schema;

use crate::audio::PREFERRED_SAMPLE_RATE;
use crate::errors::Result;
use crate::options::{ApiKey, FieldOptions, FieldType};
use schema::FileConfig;
use std::path::{Path, PathBuf};

pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const MODEL_ENV: &str = "DICTATION_FIELD_MODEL";

/// Fully resolved runtime configuration for a standalone host.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Name of the env var that holds the API key.
    pub api_key_env: String,
    /// Pre-resolved API key (from file or env var).
    pub api_key: Option<ApiKey>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub device: Option<String>,
    pub sample_rate: u32,
    pub field_type: FieldType,
    /// Option values with file overrides applied; the key is filled in by `field_options`.
    pub options: FieldOptions,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            api_key: None,
            model: None,
            base_url: None,
            device: None,
            sample_rate: PREFERRED_SAMPLE_RATE,
            field_type: FieldType::default(),
            options: FieldOptions::default(),
        }
    }
}

impl ResolvedConfig {
    /// Options to hand to the component, credential included when known.
    pub fn field_options(&self) -> FieldOptions {
        FieldOptions {
            openai_api_key: self.api_key.clone(),
            ..self.options.clone()
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("dictation-field").join("config.toml"))
}

/// Load configuration: defaults → file → env vars.
pub fn load_config() -> Result<ResolvedConfig> {
    let mut resolved = ResolvedConfig::default();

    if let Some(path) = config_path() {
        if path.exists() {
            apply_file_config(&mut resolved, &read_file(&path)?);
        }
    }

    apply_env(&mut resolved, |name| std::env::var(name).ok());
    Ok(resolved)
}

fn read_file(path: &Path) -> Result<FileConfig> {
    let contents = std::fs::read_to_string(path)?;
    let file = FileConfig::from_toml(&contents).inspect_err(|e| {
        tracing::error!(path = %path.display(), "failed to parse config file: {e}");
    })?;
    tracing::debug!(path = %path.display(), "loaded config file");
    Ok(file)
}

fn apply_file_config(r: &mut ResolvedConfig, f: &FileConfig) {
    let field = &f.field;
    if let Some(ref placeholder) = field.placeholder {
        r.options.placeholder = placeholder.clone();
    }
    if let Some(language) = field.language {
        r.options.language = language;
    }
    if let Some(append) = field.append_mode {
        r.options.append_mode = append;
    }
    if let Some(sep) = field.line_separator {
        r.options.line_separator = sep;
    }
    if let Some(ty) = field.field_type {
        r.field_type = ty;
    }

    let provider = &f.provider;
    if let Some(ref env) = provider.api_key_env {
        r.api_key_env = env.clone();
    }
    if let Some(key) = provider.api_key.clone().and_then(ApiKey::new) {
        r.api_key = Some(key);
    }
    if let Some(ref model) = provider.model {
        r.model = Some(model.clone());
    }
    if let Some(ref url) = provider.base_url {
        r.base_url = Some(url.clone());
    }

    if let Some(ref dev) = f.audio.device {
        r.device = Some(dev.clone());
    }
    if let Some(rate) = f.audio.sample_rate.filter(|&r| r > 0) {
        r.sample_rate = rate;
    }
}

fn apply_env(r: &mut ResolvedConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(key) = lookup(&r.api_key_env).and_then(ApiKey::new) {
        r.api_key = Some(key);
    }
    if let Some(model) = lookup(MODEL_ENV).filter(|m| !m.trim().is_empty()) {
        r.model = Some(model);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FieldError;
    use crate::options::{Language, LineSeparator};

    #[test]
    fn defaults_are_unconfigured() {
        let cfg = ResolvedConfig::default();
        assert_eq!(cfg.api_key_env, "OPENAI_API_KEY");
        assert_eq!(cfg.field_type, FieldType::String);
        assert_eq!(cfg.sample_rate, 16_000);
        assert!(!cfg.field_options().is_configured());
        assert_eq!(cfg.field_options(), FieldOptions::default());
    }

    #[test]
    fn file_config_overrides_defaults() {
        let mut resolved = ResolvedConfig::default();
        let file = FileConfig::from_toml(
            r#"
[field]
language = "fr"
line_separator = "none"
type = "text"

[provider]
api_key = "sk-from-file"
model = "whisper-large"
"#,
        )
        .unwrap();

        apply_file_config(&mut resolved, &file);
        let opts = resolved.field_options();
        assert_eq!(opts.language, Language::Fr);
        assert_eq!(opts.line_separator, LineSeparator::None);
        assert!(opts.append_mode);
        assert_eq!(opts.api_key().unwrap().expose(), "sk-from-file");
        assert_eq!(resolved.field_type, FieldType::Text);
        assert_eq!(resolved.model.as_deref(), Some("whisper-large"));
    }

    #[test]
    fn env_key_wins_over_file_key() {
        let mut resolved = ResolvedConfig::default();
        let file = FileConfig::from_toml(
            "[provider]\napi_key_env = \"CUSTOM_KEY\"\napi_key = \"sk-file\"",
        )
        .unwrap();
        apply_file_config(&mut resolved, &file);
        apply_env(&mut resolved, |name| match name {
            "CUSTOM_KEY" => Some("sk-env".into()),
            _ => None,
        });
        assert_eq!(resolved.api_key.unwrap().expose(), "sk-env");
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let mut resolved = ResolvedConfig::default();
        apply_env(&mut resolved, |_| Some("  ".into()));
        assert!(resolved.api_key.is_none());
        assert!(resolved.model.is_none());
    }

    #[test]
    fn audio_section_sets_device_and_rate() {
        let mut resolved = ResolvedConfig::default();
        let file = FileConfig::from_toml("[audio]\ndevice = \"USB Mic\"\nsample_rate = 44100")
            .unwrap();
        apply_file_config(&mut resolved, &file);
        assert_eq!(resolved.device.as_deref(), Some("USB Mic"));
        assert_eq!(resolved.sample_rate, 44_100);

        let zero = FileConfig::from_toml("[audio]\nsample_rate = 0").unwrap();
        let mut resolved = ResolvedConfig::default();
        apply_file_config(&mut resolved, &zero);
        assert_eq!(resolved.sample_rate, 16_000);
    }

    #[test]
    fn malformed_file_is_a_toml_error() {
        let path = std::env::temp_dir().join(format!(
            "dictation-field-bad-config-{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, "[field\nlanguage = ").unwrap();
        let err = read_file(&path).expect_err("must not parse");
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, FieldError::Toml(_)), "{err:?}");
    }
}
