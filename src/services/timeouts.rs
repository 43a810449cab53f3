//! Bounded waits around external provider calls.
//!
//! A hung embedding or vector index call would otherwise block the request
//! forever. Expiry is reported with the same error kind as a provider failure.

use std::time::Duration;

use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Config, VectorMatch, VectorMetadata};
use crate::domain::ports::{EmbeddingProvider, VectorIndex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderTimeouts {
    pub embedding: Duration,
    pub vector_index: Duration,
}

impl Default for ProviderTimeouts {
    fn default() -> Self {
        Self {
            embedding: Duration::from_secs(30),
            vector_index: Duration::from_secs(30),
        }
    }
}

impl ProviderTimeouts {
    pub fn from_config(config: &Config) -> Self {
        Self {
            embedding: Duration::from_secs(config.embedding.timeout_secs),
            vector_index: Duration::from_secs(config.vector_index.timeout_secs),
        }
    }

    pub async fn embed(&self, provider: &dyn EmbeddingProvider, text: &str) -> DomainResult<Vec<f32>> {
        tokio::time::timeout(self.embedding, provider.embed(text))
            .await
            .map_err(|_| {
                DomainError::EmbeddingFailed(format!(
                    "{} embedding timed out after {:?}",
                    provider.name(),
                    self.embedding
                ))
            })?
    }

    pub async fn upsert(
        &self,
        index: &dyn VectorIndex,
        id: Uuid,
        vector: &[f32],
        metadata: &VectorMetadata,
    ) -> DomainResult<()> {
        tokio::time::timeout(self.vector_index, index.upsert(id, vector, metadata))
            .await
            .map_err(|_| self.index_timeout(index, "upsert"))?
    }

    pub async fn query(
        &self,
        index: &dyn VectorIndex,
        vector: &[f32],
        top_k: usize,
    ) -> DomainResult<Vec<VectorMatch>> {
        tokio::time::timeout(self.vector_index, index.query(vector, top_k))
            .await
            .map_err(|_| self.index_timeout(index, "query"))?
    }

    fn index_timeout(&self, index: &dyn VectorIndex, op: &str) -> DomainError {
        DomainError::IndexFailure(format!(
            "{} {} timed out after {:?}",
            index.name(),
            op,
            self.vector_index
        ))
    }
}
