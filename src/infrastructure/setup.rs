//! Project initialization.
//!
//! Creates the `.hors-texte` directory, writes a commented default config
//! file, and brings the database schema up to date.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::adapters::sqlite::initialize_database;
use crate::domain::models::Config;

use super::config::loader::PROJECT_DIR;

/// Default configuration template content
const DEFAULT_CONFIG_TEMPLATE: &str = r#"# Hors-Texte Configuration
# Override settings by editing this file, adding a local.yaml next to it,
# or setting environment variables with the HORS_TEXTE_ prefix.
#
# Example environment variables:
#   export HORS_TEXTE_SERVER__PORT=8080
#   export HORS_TEXTE_EMBEDDING__PROVIDER=hash
#   export HORS_TEXTE_DATABASE__PATH=/custom/path/prompts.db
#   export HORS_TEXTE_LOGGING__LEVEL=debug

database:
  # Path to SQLite database file (project-local)
  path: ".hors-texte/hors-texte.db"
  max_connections: 5

server:
  host: "127.0.0.1"
  port: 3000
  enable_cors: false

logging:
  # trace, debug, info, warn, error
  level: "info"
  # json, pretty
  format: "pretty"
  # Uncomment to also write rolling JSON log files
  # log_dir: ".hors-texte/logs"
  rotation: "daily"

embedding:
  # openai or hash (deterministic, offline)
  provider: "openai"
  base_url: "https://api.openai.com/v1"
  model: "text-embedding-ada-002"
  dimension: 1536
  # Falls back to OPENAI_API_KEY when unset
  # api_key: ""
  timeout_secs: 30

vector_index:
  # sqlite (local) or pinecone
  provider: "sqlite"
  # host: "prompts-abc123.svc.us-east1-gcp.pinecone.io"
  # Falls back to PINECONE_API_KEY when unset
  # api_key: ""
  # namespace: "prompts"
  timeout_secs: 30

search:
  default_limit: 5
  max_limit: 100
  # Return prompts in similarity order
  preserve_rank: false

reconciler:
  enabled: true
  interval_secs: 60
  batch_size: 50
  max_attempts: 3
  initial_backoff_ms: 500
  max_backoff_ms: 10000
"#;

/// Setup paths and directories
pub struct SetupPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
}

impl SetupPaths {
    /// Get setup paths for the current directory
    pub fn new() -> Result<Self> {
        let current_dir = std::env::current_dir().context("Failed to get current directory")?;
        Ok(Self::in_dir(current_dir))
    }

    /// Setup paths rooted at `root`.
    pub fn in_dir(root: impl AsRef<Path>) -> Self {
        let config_dir = root.as_ref().join(PROJECT_DIR);
        Self {
            config_file: config_dir.join("config.yaml"),
            config_dir,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.config_file.exists()
    }
}

/// What `init` did.
#[derive(Debug, Clone, serde::Serialize)]
pub struct InitReport {
    pub config_file: PathBuf,
    pub config_written: bool,
    pub database: String,
}

/// Create the configuration directory
pub fn create_config_dir(paths: &SetupPaths) -> Result<()> {
    fs::create_dir_all(&paths.config_dir).context("Failed to create config directory")
}

/// Write the default configuration file. Returns whether the file was written.
pub fn create_config_file(paths: &SetupPaths, force: bool) -> Result<bool> {
    if paths.config_file.exists() && !force {
        return Ok(false);
    }

    fs::write(&paths.config_file, DEFAULT_CONFIG_TEMPLATE).context("Failed to write config file")?;
    Ok(true)
}

/// Apply pending migrations to the configured database.
pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = initialize_database(&config.database.url(), 1)
        .await
        .context("Failed to run migrations")?;
    pool.close().await;
    Ok(())
}

/// Initialize a project: config directory, default config file, schema.
pub async fn init(paths: &SetupPaths, config: &Config, force: bool) -> Result<InitReport> {
    create_config_dir(paths)?;
    let config_written = create_config_file(paths, force)?;
    run_migrations(config).await?;

    tracing::info!(
        config_file = %paths.config_file.display(),
        config_written,
        database = %config.database.path,
        "project initialized"
    );

    Ok(InitReport {
        config_file: paths.config_file.clone(),
        config_written,
        database: config.database.path.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::config::EmbeddingProviderKind;

    #[test]
    fn test_default_template_parses() {
        let config: Config = serde_yaml::from_str(DEFAULT_CONFIG_TEMPLATE).unwrap();
        assert_eq!(config.database.path, ".hors-texte/hors-texte.db");
        assert_eq!(config.embedding.provider, EmbeddingProviderKind::Openai);
        assert_eq!(config.server.port, 3000);
        crate::infrastructure::config::ConfigLoader::validate(&config).unwrap();
    }

    #[test]
    fn test_config_file_respects_force() {
        let dir = tempfile::tempdir().unwrap();
        let paths = SetupPaths::in_dir(dir.path());
        create_config_dir(&paths).unwrap();

        assert!(create_config_file(&paths, false).unwrap());
        fs::write(&paths.config_file, "server:\n  port: 9000\n").unwrap();

        assert!(!create_config_file(&paths, false).unwrap());
        assert_eq!(fs::read_to_string(&paths.config_file).unwrap(), "server:\n  port: 9000\n");

        assert!(create_config_file(&paths, true).unwrap());
        assert_eq!(fs::read_to_string(&paths.config_file).unwrap(), DEFAULT_CONFIG_TEMPLATE);
    }

    #[tokio::test]
    async fn test_init_creates_database() {
        let dir = tempfile::tempdir().unwrap();
        let paths = SetupPaths::in_dir(dir.path());
        let mut config = Config::default();
        config.database.path = dir.path().join("data/prompts.db").display().to_string();

        let report = init(&paths, &config, false).await.unwrap();

        assert!(report.config_written);
        assert!(paths.is_initialized());
        assert!(dir.path().join("data/prompts.db").exists());

        // Re-running is safe and leaves the config alone.
        let report = init(&paths, &config, false).await.unwrap();
        assert!(!report.config_written);
    }
}
