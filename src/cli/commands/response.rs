//! Response CLI commands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use uuid::Uuid;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Config, CreatedResponse};
use crate::infrastructure::AppContext;

#[derive(Args, Debug)]
pub struct ResponseArgs {
    #[command(subcommand)]
    pub command: ResponseCommands,
}

#[derive(Subcommand, Debug)]
pub enum ResponseCommands {
    /// Attach a response to an existing prompt
    Add {
        /// Prompt ID
        prompt_id: Uuid,
        /// Response text
        text: String,
    },
}

#[derive(Debug, serde::Serialize)]
pub struct ResponseCreatedOutput {
    #[serde(flatten)]
    pub response: CreatedResponse,
}

impl CommandOutput for ResponseCreatedOutput {
    fn to_human(&self) -> String {
        format!(
            "Response created: {}\nPrompt: {}",
            self.response.id, self.response.prompt_id
        )
    }
}

pub async fn execute(args: ResponseArgs, config: &Config, json_mode: bool) -> Result<()> {
    let ctx = AppContext::from_config(config)
        .await
        .context("Failed to initialize services. Run 'hors-texte init' first.")?;

    match args.command {
        ResponseCommands::Add { prompt_id, text } => {
            let response = ctx
                .ingestion
                .create_response(prompt_id, text)
                .await
                .with_context(|| format!("Failed to add response to prompt {}", prompt_id))?;
            output(&ResponseCreatedOutput { response }, json_mode);
        }
    }

    Ok(())
}
