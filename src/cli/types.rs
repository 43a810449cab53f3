//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::commands::config::ConfigArgs;
use super::commands::init::InitArgs;
use super::commands::prompt::PromptArgs;
use super::commands::response::ResponseArgs;

#[derive(Parser, Debug)]
#[command(name = "hors-texte")]
#[command(about = "Hors-Texte - prompt and response store with semantic search", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Load configuration from this file instead of .hors-texte/
    #[arg(short, long, global = true, env = "HORS_TEXTE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize configuration and database
    Init(InitArgs),

    /// Run the HTTP server and background re-indexing
    Serve,

    /// Prompt commands
    Prompt(PromptArgs),

    /// Response commands
    Response(ResponseArgs),

    /// Run one re-indexing pass over pending and failed prompts
    Reindex,

    /// Configuration commands
    Config(ConfigArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::prompt::PromptCommands;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_prompt_create() {
        let cli = Cli::try_parse_from(["hors-texte", "--json", "prompt", "create", "--title", "T", "hello"]).unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Prompt(PromptArgs {
                command: PromptCommands::Create { title, text },
            }) => {
                assert_eq!(title.as_deref(), Some("T"));
                assert_eq!(text, "hello");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_search_limit() {
        let cli = Cli::try_parse_from(["hors-texte", "prompt", "search", "greeting", "--limit", "3"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Prompt(PromptArgs {
                command: PromptCommands::Search { limit: Some(3), .. },
            })
        ));
    }
}
