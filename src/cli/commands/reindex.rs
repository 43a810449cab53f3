//! Implementation of the `hors-texte reindex` command.

use anyhow::{Context, Result};

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;
use crate::infrastructure::AppContext;
use crate::services::ReconcileReport;

#[derive(Debug, serde::Serialize)]
pub struct ReindexOutput {
    #[serde(flatten)]
    pub report: ReconcileReport,
}

impl CommandOutput for ReindexOutput {
    fn to_human(&self) -> String {
        if self.report.scanned == 0 {
            return "Nothing to re-index.".to_string();
        }
        format!(
            "Scanned {} prompt(s): {} indexed, {} failed",
            self.report.scanned, self.report.indexed, self.report.failed
        )
    }
}

pub async fn execute(config: &Config, json_mode: bool) -> Result<()> {
    let ctx = AppContext::from_config(config)
        .await
        .context("Failed to initialize services. Run 'hors-texte init' first.")?;

    let report = ctx
        .reconciler
        .reconcile_once()
        .await
        .context("Re-indexing pass failed")?;

    output(&ReindexOutput { report }, json_mode);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reindex_output() {
        let idle = ReindexOutput {
            report: ReconcileReport::default(),
        };
        assert_eq!(idle.to_human(), "Nothing to re-index.");

        let out = ReindexOutput {
            report: ReconcileReport {
                scanned: 3,
                indexed: 2,
                failed: 1,
            },
        };
        assert_eq!(out.to_human(), "Scanned 3 prompt(s): 2 indexed, 1 failed");
        assert_eq!(out.to_json()["indexed"], 2);
    }
}
