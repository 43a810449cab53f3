//! Prompt and response ingestion.
//!
//! A prompt is written to the record store first and then mirrored into the
//! vector index. There is no rollback: if embedding or upsert fails the prompt
//! row stays, marked `index_failed`, and the reconciler picks it up later.

use std::sync::Arc;

use tracing::instrument;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Block, CreatedPrompt, CreatedResponse, IndexStatus, Relation};
use crate::domain::ports::RecordStore;

use super::prompt_indexer::PromptIndexer;

#[derive(Clone)]
pub struct IngestionService {
    store: Arc<dyn RecordStore>,
    indexer: PromptIndexer,
}

impl IngestionService {
    pub fn new(store: Arc<dyn RecordStore>, indexer: PromptIndexer) -> Self {
        Self { store, indexer }
    }

    /// Store a prompt, embed it and index it under the same id.
    #[instrument(skip(self, text), fields(has_title = title.is_some()))]
    pub async fn create_prompt(&self, title: Option<String>, text: String) -> DomainResult<CreatedPrompt> {
        let prompt = Block::prompt(title, text);
        prompt.validate().map_err(DomainError::ValidationFailed)?;

        self.store.create_block(&prompt).await?;
        tracing::debug!(prompt_id = %prompt.id, "prompt stored");

        if let Err(err) = self.indexer.index_prompt(&prompt).await {
            tracing::warn!(prompt_id = %prompt.id, error = %err, "prompt stored but not indexed");
            self.mark(prompt.id, IndexStatus::IndexFailed).await;
            return Err(err);
        }
        self.mark(prompt.id, IndexStatus::Indexed).await;

        tracing::info!(prompt_id = %prompt.id, "prompt created");
        Ok(CreatedPrompt {
            id: prompt.id,
            title: prompt.title.clone(),
            text: prompt.text().to_string(),
        })
    }

    /// Store a response and link it to `prompt_id`. The prompt is not
    /// required to exist.
    #[instrument(skip(self, text))]
    pub async fn create_response(&self, prompt_id: Uuid, text: String) -> DomainResult<CreatedResponse> {
        let response = Block::response(text);
        response.validate().map_err(DomainError::ValidationFailed)?;

        self.store.create_block(&response).await?;
        self.store
            .create_relation(&Relation::response_to(response.id, prompt_id))
            .await?;

        tracing::info!(response_id = %response.id, "response created");
        Ok(CreatedResponse {
            id: response.id,
            prompt_id,
            text: response.text().to_string(),
        })
    }

    /// Best-effort status update; the stored prompt is already authoritative.
    async fn mark(&self, id: Uuid, status: IndexStatus) {
        if let Err(err) = self.store.set_index_status(id, status).await {
            tracing::error!(prompt_id = %id, %status, error = %err, "failed to record index status");
        }
    }
}
