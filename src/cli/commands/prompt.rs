//! Prompt CLI commands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use uuid::Uuid;

use crate::cli::output::{format_block_table, output, truncate, CommandOutput};
use crate::domain::models::{Config, CreatedPrompt, PromptWithResponses, SearchResults};
use crate::infrastructure::AppContext;

/// Length of the title derived from prompt text when none is given.
const DEFAULT_TITLE_LEN: usize = 50;

#[derive(Args, Debug)]
pub struct PromptArgs {
    #[command(subcommand)]
    pub command: PromptCommands,
}

#[derive(Subcommand, Debug)]
pub enum PromptCommands {
    /// Store a prompt and index it for search
    Create {
        /// Prompt title (defaults to the start of the text)
        #[arg(short, long)]
        title: Option<String>,
        /// Prompt text
        text: String,
    },
    /// Show a prompt with its responses
    Show {
        /// Prompt ID
        id: Uuid,
    },
    /// Find prompts semantically similar to the given text
    Search {
        /// Query text
        text: String,
        /// Maximum number of prompts to return
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

/// Title used when the caller does not supply one.
pub fn default_title(text: &str) -> String {
    let head: String = text.chars().take(DEFAULT_TITLE_LEN).collect();
    if text.chars().count() > DEFAULT_TITLE_LEN {
        format!("{}...", head)
    } else {
        head
    }
}

#[derive(Debug, serde::Serialize)]
pub struct PromptCreatedOutput {
    #[serde(flatten)]
    pub prompt: CreatedPrompt,
}

impl CommandOutput for PromptCreatedOutput {
    fn to_human(&self) -> String {
        format!(
            "Prompt created: {}\nTitle: {}",
            self.prompt.id,
            self.prompt.title.as_deref().unwrap_or("-")
        )
    }
}

#[derive(Debug, serde::Serialize)]
pub struct PromptDetailOutput {
    #[serde(flatten)]
    pub detail: PromptWithResponses,
}

impl CommandOutput for PromptDetailOutput {
    fn to_human(&self) -> String {
        let prompt = &self.detail.prompt;
        let mut lines = vec![
            format!("Prompt: {}", prompt.title.as_deref().unwrap_or("(untitled)")),
            format!("ID: {}", prompt.id),
            format!("Index status: {}", prompt.index_status),
            format!("Created: {}", prompt.created_at.format("%Y-%m-%d %H:%M:%S UTC")),
            String::new(),
            prompt.text().to_string(),
        ];

        if self.detail.responses.is_empty() {
            lines.push("\nNo responses.".to_string());
        } else {
            lines.push(format!("\nResponses ({}):", self.detail.responses.len()));
            for response in &self.detail.responses {
                lines.push(format!(
                    "  [{}] {}",
                    response.created_at.format("%Y-%m-%d %H:%M:%S"),
                    truncate(response.text(), 100)
                ));
            }
        }

        lines.join("\n")
    }
}

#[derive(Debug, serde::Serialize)]
pub struct SearchOutput {
    #[serde(flatten)]
    pub results: SearchResults,
}

impl CommandOutput for SearchOutput {
    fn to_human(&self) -> String {
        if self.results.is_empty() {
            return "No matching prompts.".to_string();
        }
        let table = format_block_table(&self.results.prompts, |b| self.results.scores.get(&b.id).copied());
        format!("Found {} prompt(s):\n{}", self.results.len(), table)
    }
}

pub async fn execute(args: PromptArgs, config: &Config, json_mode: bool) -> Result<()> {
    let ctx = AppContext::from_config(config)
        .await
        .context("Failed to initialize services. Run 'hors-texte init' first.")?;

    match args.command {
        PromptCommands::Create { title, text } => {
            let title = title.unwrap_or_else(|| default_title(&text));
            let prompt = ctx
                .ingestion
                .create_prompt(Some(title), text)
                .await
                .context("Failed to create prompt")?;
            output(&PromptCreatedOutput { prompt }, json_mode);
        }

        PromptCommands::Show { id } => {
            let detail = ctx
                .retrieval
                .get_prompt(id)
                .await
                .with_context(|| format!("Failed to retrieve prompt {}", id))?;
            output(&PromptDetailOutput { detail }, json_mode);
        }

        PromptCommands::Search { text, limit } => {
            let results = ctx
                .retrieval
                .search_prompts(&text, limit)
                .await
                .context("Failed to search prompts")?;
            output(&SearchOutput { results }, json_mode);
        }
    }

    Ok(())
}
