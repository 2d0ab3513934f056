use clap::Args;
use dictation_field_core::descriptor::descriptor;
use dictation_field_core::errors::Result;

#[derive(Debug, Args)]
pub struct DescriptorArgs {
    /// Single-line JSON instead of pretty-printed
    #[arg(long)]
    pub compact: bool,

    /// Print only the default options object
    #[arg(long)]
    pub defaults: bool,
}

pub fn run(args: &DescriptorArgs) -> Result<()> {
    let d = descriptor();
    let json = match (args.defaults, args.compact) {
        (true, true) => serde_json::to_string(&d.default_options())?,
        (true, false) => serde_json::to_string_pretty(&d.default_options())?,
        (false, true) => serde_json::to_string(&d)?,
        (false, false) => d.to_json_pretty()?,
    };
    println!("{json}");
    Ok(())
}
