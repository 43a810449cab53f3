use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use std::path::Path;
use thiserror::Error;

use crate::domain::models::config::{Config, VectorIndexKind};

/// Project directory holding configuration and the default database.
pub const PROJECT_DIR: &str = ".hors-texte";

/// Prefix for environment overrides; `__` separates nested keys.
pub const ENV_PREFIX: &str = "HORS_TEXTE_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidLogRotation(String),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Invalid embedding dimension: {0}. Must be at least 1")]
    InvalidEmbeddingDimension(usize),

    #[error("vector_index.host is required when provider is pinecone")]
    MissingPineconeHost,

    #[error("Invalid search limits: default_limit ({0}) must be between 1 and max_limit ({1})")]
    InvalidSearchLimits(usize, usize),

    #[error(
        "Invalid backoff configuration: initial_backoff_ms ({0}) must be less than max_backoff_ms ({1})"
    )]
    InvalidBackoff(u64, u64),

    #[error("Invalid timeout: {0} must be at least 1 second")]
    InvalidTimeout(&'static str),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .hors-texte/config.yaml (project config, created by init)
    /// 3. .hors-texte/local.yaml (project local overrides, optional)
    /// 4. Environment variables (HORS_TEXTE_* prefix, highest priority)
    pub fn load() -> Result<Config> {
        Self::load_from_dir(PROJECT_DIR)
    }

    /// Same as [`ConfigLoader::load`], reading the YAML files from `dir`.
    pub fn load_from_dir(dir: impl AsRef<Path>) -> Result<Config> {
        let dir = dir.as_ref();
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(dir.join("config.yaml")))
            .merge(Yaml::file(dir.join("local.yaml")))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.database.path.trim().is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }

        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(
                config.database.max_connections,
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidLogRotation(config.logging.rotation.clone()));
        }

        if config.embedding.dimension == 0 {
            return Err(ConfigError::InvalidEmbeddingDimension(config.embedding.dimension));
        }

        if config.embedding.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout("embedding.timeout_secs"));
        }

        if config.vector_index.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout("vector_index.timeout_secs"));
        }

        if config.vector_index.provider == VectorIndexKind::Pinecone
            && config.vector_index.host.as_deref().map_or(true, |h| h.trim().is_empty())
        {
            return Err(ConfigError::MissingPineconeHost);
        }

        if config.search.default_limit == 0 || config.search.default_limit > config.search.max_limit {
            return Err(ConfigError::InvalidSearchLimits(
                config.search.default_limit,
                config.search.max_limit,
            ));
        }

        if config.reconciler.initial_backoff_ms >= config.reconciler.max_backoff_ms {
            return Err(ConfigError::InvalidBackoff(
                config.reconciler.initial_backoff_ms,
                config.reconciler.max_backoff_ms,
            ));
        }

        if config.reconciler.batch_size == 0 {
            return Err(ConfigError::ValidationFailed(
                "reconciler.batch_size must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::config::EmbeddingProviderKind;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.database.path, ".hors-texte/hors-texte.db");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.search.default_limit, 5);
        assert!(!config.search.preserve_rank);
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
database:
  path: /custom/path.db
  max_connections: 8
embedding:
  provider: hash
  dimension: 256
search:
  default_limit: 10
  preserve_rank: true
";

        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.database.path, "/custom/path.db");
        assert_eq!(config.database.max_connections, 8);
        assert_eq!(config.embedding.provider, EmbeddingProviderKind::Hash);
        assert_eq!(config.embedding.dimension, 256);
        assert_eq!(config.search.default_limit, 10);
        assert_eq!(config.search.max_limit, 100);
        assert!(config.search.preserve_rank);

        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "invalid".to_string();

        match ConfigLoader::validate(&config).unwrap_err() {
            ConfigError::InvalidLogLevel(level) => assert_eq!(level, "invalid"),
            other => panic!("Expected InvalidLogLevel error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_invalid_log_format() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogFormat(_))
        ));
    }

    #[test]
    fn test_validate_invalid_rotation() {
        let mut config = Config::default();
        config.logging.rotation = "weekly".to_string();

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogRotation(_))
        ));
    }

    #[test]
    fn test_validate_empty_database_path() {
        let mut config = Config::default();
        config.database.path = String::new();

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::EmptyDatabasePath)
        ));
    }

    #[test]
    fn test_validate_zero_max_connections() {
        let mut config = Config::default();
        config.database.max_connections = 0;

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidMaxConnections(0))
        ));
    }

    #[test]
    fn test_validate_zero_dimension() {
        let mut config = Config::default();
        config.embedding.dimension = 0;

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidEmbeddingDimension(0))
        ));
    }

    #[test]
    fn test_validate_pinecone_requires_host() {
        let mut config = Config::default();
        config.vector_index.provider = VectorIndexKind::Pinecone;

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::MissingPineconeHost)
        ));

        config.vector_index.host = Some("prompts-abc.svc.pinecone.io".to_string());
        assert!(ConfigLoader::validate(&config).is_ok());
    }

    #[test]
    fn test_validate_search_limits() {
        let mut config = Config::default();
        config.search.default_limit = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidSearchLimits(0, 100))
        ));

        config.search.default_limit = 200;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidSearchLimits(200, 100))
        ));
    }

    #[test]
    fn test_validate_invalid_backoff() {
        let mut config = Config::default();
        config.reconciler.initial_backoff_ms = 30000;
        config.reconciler.max_backoff_ms = 10000;

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidBackoff(30000, 10000))
        ));
    }

    #[test]
    fn test_validate_zero_timeouts() {
        let mut config = Config::default();
        config.embedding.timeout_secs = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidTimeout("embedding.timeout_secs"))
        ));

        let mut config = Config::default();
        config.vector_index.timeout_secs = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidTimeout("vector_index.timeout_secs"))
        ));
    }

    #[test]
    fn test_hierarchical_merging() {
        let dir = tempfile::tempdir().unwrap();

        let mut base = std::fs::File::create(dir.path().join("config.yaml")).unwrap();
        writeln!(base, "logging:\n  level: info\n  format: json\nserver:\n  port: 4000").unwrap();

        let mut local = std::fs::File::create(dir.path().join("local.yaml")).unwrap();
        writeln!(local, "logging:\n  level: debug").unwrap();

        temp_env::with_vars_unset(["HORS_TEXTE_LOGGING__LEVEL", "HORS_TEXTE_SERVER__PORT"], || {
            let config = ConfigLoader::load_from_dir(dir.path()).unwrap();

            assert_eq!(config.logging.level, "debug", "local.yaml should win");
            assert_eq!(config.logging.format, "json", "base value should persist");
            assert_eq!(config.server.port, 4000);
        });
    }

    #[test]
    fn test_env_override_wins() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.yaml"), "server:\n  port: 4000\n").unwrap();

        temp_env::with_vars(
            [
                ("HORS_TEXTE_SERVER__PORT", Some("5050")),
                ("HORS_TEXTE_SEARCH__PRESERVE_RANK", Some("true")),
                ("HORS_TEXTE_EMBEDDING__PROVIDER", Some("hash")),
            ],
            || {
                let config = ConfigLoader::load_from_dir(dir.path()).unwrap();
                assert_eq!(config.server.port, 5050);
                assert!(config.search.preserve_rank);
                assert_eq!(config.embedding.provider, EmbeddingProviderKind::Hash);
            },
        );
    }

    #[test]
    fn test_load_from_file_rejects_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "logging:\n  level: loud").unwrap();
        file.flush().unwrap();

        assert!(ConfigLoader::load_from_file(file.path()).is_err());
    }

    #[test]
    fn test_missing_files_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        temp_env::with_vars_unset(["HORS_TEXTE_SERVER__PORT"], || {
            let config = ConfigLoader::load_from_dir(dir.path()).unwrap();
            assert_eq!(config.server.port, 3000);
        });
    }
}
