//! Hors-Texte CLI entry point.

use anyhow::Result;
use clap::Parser;

use hors_texte::cli::commands::{config as config_cmd, init, prompt, reindex, response, serve};
use hors_texte::cli::{Cli, Commands};
use hors_texte::domain::models::Config;
use hors_texte::infrastructure::logging::LoggerImpl;
use hors_texte::ConfigLoader;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json = cli.json;

    if let Err(err) = run(cli).await {
        hors_texte::cli::handle_error(err, json);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    let _logger = LoggerImpl::init(&config.logging)?;

    match cli.command {
        Commands::Init(args) => init::execute(args, &config, cli.json).await,
        Commands::Serve => serve::execute(&config).await,
        Commands::Prompt(args) => prompt::execute(args, &config, cli.json).await,
        Commands::Response(args) => response::execute(args, &config, cli.json).await,
        Commands::Reindex => reindex::execute(&config, cli.json).await,
        Commands::Config(args) => config_cmd::execute(args, &config, cli.json),
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    match cli.config {
        Some(ref path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}
