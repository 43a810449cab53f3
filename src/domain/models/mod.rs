//! Domain models for blocks, vector entries, pipeline results, and configuration.

pub mod block;
pub mod config;
pub mod vector;
pub mod views;

pub use block::{Block, BlockContent, BlockType, IndexStatus, Relation, RelationType, TextPayload};
pub use config::{
    Config, DatabaseConfig, EmbeddingConfig, EmbeddingProviderKind, LoggingConfig,
    ReconcilerConfig, SearchConfig, ServerConfig, VectorIndexConfig, VectorIndexKind,
};
pub use vector::{VectorMatch, VectorMetadata};
pub use views::{CreatedPrompt, CreatedResponse, PromptWithResponses, SearchResults};
