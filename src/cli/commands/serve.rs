//! Implementation of the `hors-texte serve` command.

use anyhow::{Context, Result};
use tokio::sync::watch;

use crate::adapters::http::PromptsHttpServer;
use crate::domain::models::Config;
use crate::infrastructure::AppContext;

/// Run the HTTP server until Ctrl-C, with the index reconciler alongside it.
pub async fn execute(config: &Config) -> Result<()> {
    let ctx = AppContext::from_config(config)
        .await
        .context("Failed to initialize services. Run 'hors-texte init' first.")?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let reconciler = tokio::spawn(ctx.reconciler.clone().run(shutdown_rx));

    let server = PromptsHttpServer::new(ctx.ingestion.clone(), ctx.retrieval.clone(), config.server.clone());
    let signal = async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for shutdown signal");
            return;
        }
        tracing::info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    };

    let served = server
        .serve_with_shutdown(signal)
        .await
        .map_err(|e| anyhow::anyhow!("HTTP server failed: {}", e));

    // The sender is dropped with the signal future, which also stops the reconciler.
    if let Err(err) = reconciler.await {
        tracing::warn!(error = %err, "index reconciler task ended abnormally");
    }
    ctx.pool.close().await;

    served
}
