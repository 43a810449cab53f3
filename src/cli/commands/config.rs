//! Configuration CLI commands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use crate::domain::models::Config;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration with API keys redacted
    Show,
}

pub fn execute(args: ConfigArgs, config: &Config, json_mode: bool) -> Result<()> {
    match args.command {
        ConfigCommands::Show => {
            let redacted = config.redacted();
            let rendered = if json_mode {
                serde_json::to_string_pretty(&redacted).context("Failed to serialize configuration")?
            } else {
                serde_yaml::to_string(&redacted).context("Failed to serialize configuration")?
            };
            println!("{}", rendered.trim_end());
        }
    }
    Ok(())
}
