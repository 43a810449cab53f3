//! Hors-Texte - prompt and response store with semantic search
//!
//! Prompts and responses are stored as immutable blocks in SQLite, linked by
//! `response_to` relations. Prompt text is embedded and written to a vector
//! index so prompts can be found by meaning.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): models, errors and the ports adapters implement
//! - **Adapter Layer** (`adapters`): SQLite, embedding providers, vector indexes, HTTP
//! - **Service Layer** (`services`): ingestion, retrieval and re-indexing pipelines
//! - **Infrastructure Layer** (`infrastructure`): configuration, logging, setup, wiring
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use hors_texte::{AppContext, ConfigLoader};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::load()?;
//!     let ctx = AppContext::from_config(&config).await?;
//!     let created = ctx.ingestion.create_prompt(None, "hello world".into()).await?;
//!     let found = ctx.retrieval.search_prompts("greeting", None).await?;
//!     println!("{} -> {} match(es)", created.id, found.len());
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    Block, BlockContent, BlockType, Config, CreatedPrompt, CreatedResponse, IndexStatus,
    PromptWithResponses, SearchResults,
};
pub use domain::ports::{EmbeddingProvider, RecordStore, VectorIndex};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use infrastructure::AppContext;
pub use services::{IndexReconciler, IngestionService, PromptIndexer, RetrievalService};
