//! Implementation of the `hors-texte init` command.

use anyhow::Result;
use clap::Args;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;
use crate::infrastructure::setup::{self, InitReport, SetupPaths};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing config file
    #[arg(long, short)]
    pub force: bool,
}

#[derive(Debug, serde::Serialize)]
pub struct InitOutput {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub report: InitReport,
}

impl CommandOutput for InitOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![self.message.clone()];
        if self.report.config_written {
            lines.push(format!("Wrote default config to {}", self.report.config_file.display()));
        } else {
            lines.push(format!(
                "Kept existing config at {} (use --force to overwrite)",
                self.report.config_file.display()
            ));
        }
        lines.push(format!("Database ready at {}", self.report.database));
        lines.join("\n")
    }
}

pub async fn execute(args: InitArgs, config: &Config, json_mode: bool) -> Result<()> {
    let paths = SetupPaths::new()?;
    let report = setup::init(&paths, config, args.force).await?;

    let out = InitOutput {
        success: true,
        message: "Project initialized.".to_string(),
        report,
    };
    output(&out, json_mode);
    Ok(())
}
