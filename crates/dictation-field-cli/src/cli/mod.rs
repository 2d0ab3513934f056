pub mod descriptor;
pub mod devices;
pub mod dictate;

use clap::{Parser, Subcommand};
use dictation_field_core::errors::Result;

#[derive(Debug, Parser)]
#[command(
    name = "dictation-field",
    version,
    about = "Speech-to-text text field host",
    long_about = "Inspect the speech-to-text field descriptor and run dictation cycles \
                  (record, transcribe with OpenAI Whisper, merge into a value) from the terminal."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the field descriptor the host platform registers
    Descriptor(descriptor::DescriptorArgs),

    /// List available audio input devices
    Devices(devices::DevicesArgs),

    /// Record, transcribe and merge the transcript into a value
    Dictate(dictate::DictateArgs),
}

pub async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Descriptor(args) => descriptor::run(&args),
        Commands::Devices(args) => devices::run(&args),
        Commands::Dictate(args) => dictate::run(&args).await,
    }
}
