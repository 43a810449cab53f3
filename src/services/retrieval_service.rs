//! Exact lookup and semantic search over stored prompts.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::instrument;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    Block, PromptWithResponses, RelationType, SearchConfig, SearchResults, VectorMatch,
};
use crate::domain::ports::RecordStore;

use super::prompt_indexer::PromptIndexer;

#[derive(Clone)]
pub struct RetrievalService {
    store: Arc<dyn RecordStore>,
    indexer: PromptIndexer,
    search: SearchConfig,
}

impl RetrievalService {
    pub fn new(store: Arc<dyn RecordStore>, indexer: PromptIndexer, search: SearchConfig) -> Self {
        Self { store, indexer, search }
    }

    pub fn search_config(&self) -> &SearchConfig {
        &self.search
    }

    /// Fetch a block by id together with the responses pointing at it.
    #[instrument(skip(self))]
    pub async fn get_prompt(&self, id: Uuid) -> DomainResult<PromptWithResponses> {
        let prompt = self
            .store
            .get_block_by_id(id)
            .await?
            .ok_or(DomainError::BlockNotFound(id))?;

        let responses = self
            .store
            .get_related_blocks(id, RelationType::ResponseTo)
            .await?;

        Ok(PromptWithResponses { prompt, responses })
    }

    /// Find prompts similar to `text`.
    ///
    /// Candidates come from the vector index; full records always come from
    /// the record store, so ids the store no longer knows are dropped.
    #[instrument(skip(self, text))]
    pub async fn search_prompts(&self, text: &str, limit: Option<usize>) -> DomainResult<SearchResults> {
        let limit = self.resolve_limit(limit)?;
        if text.trim().is_empty() {
            return Err(DomainError::ValidationFailed("search text cannot be empty".to_string()));
        }

        let vector = self.indexer.embed(text).await?;
        let matches = self.indexer.query(&vector, limit).await?;
        tracing::debug!(matches = matches.len(), "vector index queried");

        if matches.is_empty() {
            return Ok(SearchResults::empty());
        }

        let ids: Vec<Uuid> = matches.iter().map(|m| m.id).collect();
        let mut prompts = self.store.get_blocks_by_ids(&ids).await?;

        if self.search.preserve_rank {
            let rank: HashMap<Uuid, usize> = ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();
            prompts.sort_by_key(|p| rank.get(&p.id).copied().unwrap_or(usize::MAX));
        }

        let scores = scores_for(&prompts, &matches);
        Ok(SearchResults { prompts, scores })
    }

    fn resolve_limit(&self, limit: Option<usize>) -> DomainResult<usize> {
        let limit = limit.unwrap_or(self.search.default_limit);
        if limit == 0 || limit > self.search.max_limit {
            return Err(DomainError::ValidationFailed(format!(
                "limit must be between 1 and {}",
                self.search.max_limit
            )));
        }
        Ok(limit)
    }
}

fn scores_for(prompts: &[Block], matches: &[VectorMatch]) -> HashMap<Uuid, f32> {
    let by_id: HashMap<Uuid, f32> = matches.iter().map(|m| (m.id, m.score)).collect();
    prompts
        .iter()
        .filter_map(|p| by_id.get(&p.id).map(|score| (p.id, *score)))
        .collect()
}
