//! Domain errors for the Hors-Texte prompt store.

use thiserror::Error;
use uuid::Uuid;

/// Domain-level errors that can occur while storing, indexing, or retrieving blocks.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Block not found: {0}")]
    BlockNotFound(Uuid),

    #[error("Block already exists: {0}")]
    DuplicateBlockId(Uuid),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Embedding failed: {0}")]
    EmbeddingFailed(String),

    #[error("Vector index failure: {0}")]
    IndexFailure(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    /// True for errors caused by the caller's input rather than a backend.
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::ValidationFailed(_) | Self::BlockNotFound(_))
    }
}

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}
