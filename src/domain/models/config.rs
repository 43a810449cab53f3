use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure for Hors-Texte
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Embedding provider configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Vector index configuration
    #[serde(default)]
    pub vector_index: VectorIndexConfig,

    /// Semantic search configuration
    #[serde(default)]
    pub search: SearchConfig,

    /// Background re-indexing configuration
    #[serde(default)]
    pub reconciler: ReconcilerConfig,
}

impl Config {
    /// Copy of the configuration with secrets masked, for display.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.embedding.api_key.is_some() {
            config.embedding.api_key = Some(REDACTED.to_string());
        }
        if config.vector_index.api_key.is_some() {
            config.vector_index.api_key = Some(REDACTED.to_string());
        }
        config
    }
}

const REDACTED: &str = "********";

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".hors-texte/hors-texte.db".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

impl DatabaseConfig {
    /// `SQLite` connection URL for the configured path.
    pub fn url(&self) -> String {
        if self.path.starts_with("sqlite:") {
            self.path.clone()
        } else {
            format!("sqlite:{}", self.path)
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Whether to enable permissive CORS
    #[serde(default)]
    pub enable_cors: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            enable_cors: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files (stderr only when unset)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// File rotation: daily, hourly, never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}

/// Which embedding backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingProviderKind {
    /// OpenAI-compatible `/embeddings` endpoint
    Openai,
    /// Deterministic local feature hashing, for offline use
    Hash,
}

/// Embedding provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_provider")]
    pub provider: EmbeddingProviderKind,

    /// Base URL for OpenAI-compatible APIs
    #[serde(default = "default_embedding_base_url")]
    pub base_url: String,

    /// Embedding model name
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Embedding dimension produced by the model
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,

    /// API key (falls back to `OPENAI_API_KEY`)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Per-call timeout in seconds
    #[serde(default = "default_provider_timeout_secs")]
    pub timeout_secs: u64,
}

const fn default_embedding_provider() -> EmbeddingProviderKind {
    EmbeddingProviderKind::Openai
}

fn default_embedding_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-ada-002".to_string()
}

const fn default_embedding_dimension() -> usize {
    1536
}

const fn default_provider_timeout_secs() -> u64 {
    30
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            base_url: default_embedding_base_url(),
            model: default_embedding_model(),
            dimension: default_embedding_dimension(),
            api_key: None,
            timeout_secs: default_provider_timeout_secs(),
        }
    }
}

/// Which vector index backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorIndexKind {
    /// Embeddings stored in the local database, brute-force cosine search
    Sqlite,
    /// Pinecone data-plane REST API
    Pinecone,
}

/// Vector index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct VectorIndexConfig {
    #[serde(default = "default_vector_index_provider")]
    pub provider: VectorIndexKind,

    /// Index host URL (required for pinecone)
    #[serde(default)]
    pub host: Option<String>,

    /// API key (falls back to `PINECONE_API_KEY`)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Optional namespace within the index
    #[serde(default)]
    pub namespace: Option<String>,

    /// Per-call timeout in seconds
    #[serde(default = "default_provider_timeout_secs")]
    pub timeout_secs: u64,
}

const fn default_vector_index_provider() -> VectorIndexKind {
    VectorIndexKind::Sqlite
}

impl Default for VectorIndexConfig {
    fn default() -> Self {
        Self {
            provider: default_vector_index_provider(),
            host: None,
            api_key: None,
            namespace: None,
            timeout_secs: default_provider_timeout_secs(),
        }
    }
}

/// Semantic search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SearchConfig {
    /// Limit used when a request does not specify one
    #[serde(default = "default_search_limit")]
    pub default_limit: usize,

    /// Largest limit a request may ask for
    #[serde(default = "default_max_search_limit")]
    pub max_limit: usize,

    /// Return prompts in similarity order instead of record-store order
    #[serde(default)]
    pub preserve_rank: bool,
}

const fn default_search_limit() -> usize {
    5
}

const fn default_max_search_limit() -> usize {
    100
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: default_search_limit(),
            max_limit: default_max_search_limit(),
            preserve_rank: false,
        }
    }
}

/// Background re-indexing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ReconcilerConfig {
    /// Run the reconciler alongside the HTTP server
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Seconds between passes; pending prompts younger than this are skipped
    #[serde(default = "default_reconcile_interval_secs")]
    pub interval_secs: u64,

    /// Maximum prompts examined per pass
    #[serde(default = "default_reconcile_batch_size")]
    pub batch_size: usize,

    /// Attempts per prompt within one pass
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial backoff delay in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Maximum backoff delay in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

const fn default_true() -> bool {
    true
}

const fn default_reconcile_interval_secs() -> u64 {
    60
}

const fn default_reconcile_batch_size() -> usize {
    50
}

const fn default_max_attempts() -> u32 {
    3
}

const fn default_initial_backoff_ms() -> u64 {
    500
}

const fn default_max_backoff_ms() -> u64 {
    10_000
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            interval_secs: default_reconcile_interval_secs(),
            batch_size: default_reconcile_batch_size(),
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}
