use clap::Args;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

use dictation_field_core::audio::cpal_backend::CpalBackend;
use dictation_field_core::config;
use dictation_field_core::errors::Result;
use dictation_field_core::provider::openai::OpenAiProvider;
use dictation_field_core::{
    DictationComponent, DictationOutcome, FieldType, Language, LineSeparator,
};

#[derive(Debug, Args)]
pub struct DictateArgs {
    /// Current field value the transcript is merged into
    #[arg(long)]
    pub value: Option<String>,

    /// Treat the field as a multi-line textarea
    #[arg(long)]
    pub multiline: bool,

    /// Recording duration in seconds (0 = until Enter is pressed)
    #[arg(long, short, default_value = "0", value_parser = parse_seconds)]
    pub duration: f32,

    /// Language hint: auto, de, en, es, fr, it, pt, ru, ja, zh
    #[arg(long)]
    pub language: Option<Language>,

    /// Replace the value instead of appending
    #[arg(long)]
    pub replace: bool,

    /// Separator between old text and transcript: auto, space, newline, none
    #[arg(long)]
    pub separator: Option<LineSeparator>,

    /// Audio input device name (omit to use system default)
    #[arg(long)]
    pub device: Option<String>,

    /// Transcription model (overrides config)
    #[arg(long)]
    pub model: Option<String>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: &DictateArgs) -> Result<()> {
    let config = config::load_config()?;

    let mut options = config.field_options();
    if let Some(language) = args.language {
        options.language = language;
    }
    if let Some(separator) = args.separator {
        options.line_separator = separator;
    }
    if args.replace {
        options.append_mode = false;
    }
    let field_type = if args.multiline {
        FieldType::Text
    } else {
        config.field_type
    };

    let model = args.model.clone().or(config.model.clone());
    let provider = match config.base_url.clone() {
        Some(url) => OpenAiProvider::with_base_url(model, url),
        None => OpenAiProvider::new(model),
    };

    let emitted: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&emitted);
    let mut field = DictationComponent::new(
        args.value.clone(),
        options,
        field_type,
        Arc::new(CpalBackend::new(config.sample_rate)),
        Arc::new(provider),
        move |value: &str| {
            if let Ok(mut slot) = sink.lock() {
                *slot = Some(value.to_string());
            }
        },
    )
    .with_device(args.device.clone().or(config.device.clone()))
    .with_state_listener(|state| tracing::debug!(%state, "field state"));

    // Ctrl-C aborts whatever phase is running; the component releases the
    // microphone and leaves the value alone.
    let cancel = field.cancel_handle();
    field.activate_microphone()?;
    tokio::select! {
        r = wait_for_stop(args.duration) => r?,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("Cancelling…");
            cancel.cancel();
        }
    }

    if !cancel.is_cancelled() {
        eprintln!("Transcribing…");
    }
    let outcome = {
        let stop = field.deactivate_microphone();
        tokio::pin!(stop);
        tokio::select! {
            r = &mut stop => r?,
            _ = tokio::signal::ctrl_c() => {
                eprintln!("Cancelling…");
                cancel.cancel();
                stop.await?
            }
        }
    };
    match &outcome {
        DictationOutcome::Empty => eprintln!("Nothing recognised; value unchanged."),
        DictationOutcome::Cancelled => eprintln!("Cancelled; value unchanged."),
        DictationOutcome::Inserted(_) => {}
    }

    let view = field.render();
    let changed = emitted.lock().map(|v| v.is_some()).unwrap_or(false);
    if args.json {
        let obj = serde_json::json!({
            "value": view.text,
            "changed": changed,
            "state": field.state(),
            "notice": view.notice,
        });
        println!("{}", serde_json::to_string_pretty(&obj)?);
    } else {
        println!("{}", view.text);
    }

    Ok(())
}

async fn wait_for_stop(duration: f32) -> Result<()> {
    if duration > 0.0 {
        eprintln!("Recording for {duration:.1}s… (speak now)");
        tokio::time::sleep(Duration::from_secs_f32(duration)).await;
    } else {
        eprintln!("Recording… press Enter to stop.");
        let mut line = String::new();
        BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    }
    Ok(())
}

fn parse_seconds(s: &str) -> std::result::Result<f32, String> {
    let secs: f32 = s.parse().map_err(|e| format!("{e}"))?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(format!("expected a non-negative number of seconds, got {s}"));
    }
    Duration::try_from_secs_f32(secs).map_err(|e| e.to_string())?;
    Ok(secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_rejects_non_finite_and_negative() {
        assert_eq!(parse_seconds("2.5"), Ok(2.5));
        assert_eq!(parse_seconds("0"), Ok(0.0));
        assert!(parse_seconds("inf").is_err());
        assert!(parse_seconds("NaN").is_err());
        assert!(parse_seconds("-1").is_err());
        assert!(parse_seconds("1e30").is_err());
        assert!(parse_seconds("soon").is_err());
    }
}
