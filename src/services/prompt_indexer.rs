//! Embeds prompt text and writes it to the vector index.
//!
//! Shared by prompt ingestion, the background reconciler and search, so the
//! dimension check and timeouts apply the same way everywhere.

use std::sync::Arc;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Block, VectorMatch, VectorMetadata};
use crate::domain::ports::{EmbeddingProvider, VectorIndex};

use super::timeouts::ProviderTimeouts;

#[derive(Clone)]
pub struct PromptIndexer {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    timeouts: ProviderTimeouts,
}

impl PromptIndexer {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        timeouts: ProviderTimeouts,
    ) -> Self {
        Self {
            embedder,
            index,
            timeouts,
        }
    }

    pub fn embedder_name(&self) -> &'static str {
        self.embedder.name()
    }

    pub fn index_name(&self) -> &'static str {
        self.index.name()
    }

    /// Embed `text`, rejecting vectors whose length differs from the
    /// provider's declared dimension.
    pub async fn embed(&self, text: &str) -> DomainResult<Vec<f32>> {
        let vector = self.timeouts.embed(self.embedder.as_ref(), text).await?;

        let expected = self.embedder.dimension();
        if vector.len() != expected {
            return Err(DomainError::EmbeddingFailed(format!(
                "{} returned {} dimensions, expected {}",
                self.embedder.name(),
                vector.len(),
                expected
            )));
        }
        Ok(vector)
    }

    /// Embed the prompt's stored text and upsert it under the prompt id.
    pub async fn index_prompt(&self, prompt: &Block) -> DomainResult<()> {
        let vector = self.embed(prompt.text()).await?;
        let metadata = VectorMetadata::for_prompt(prompt.id, prompt.title.clone());

        self.timeouts
            .upsert(self.index.as_ref(), prompt.id, &vector, &metadata)
            .await?;

        tracing::debug!(prompt_id = %prompt.id, index = self.index.name(), "prompt indexed");
        Ok(())
    }

    pub async fn query(&self, vector: &[f32], top_k: usize) -> DomainResult<Vec<VectorMatch>> {
        self.timeouts.query(self.index.as_ref(), vector, top_k).await
    }
}
