use clap::Args;
use dictation_field_core::audio::cpal_backend::CpalBackend;
use dictation_field_core::audio::AudioBackend;
use dictation_field_core::errors::Result;

#[derive(Debug, Args)]
pub struct DevicesArgs {
    /// Print output as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: &DevicesArgs) -> Result<()> {
    let devices = CpalBackend::default().list_devices()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&devices)?);
    } else if devices.is_empty() {
        eprintln!("No input devices found.");
    } else {
        for device in &devices {
            let marker = if device.is_default { " (default)" } else { "" };
            println!("{}{}", device.name, marker);
        }
    }

    Ok(())
}
