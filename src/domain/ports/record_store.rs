//! Port for the authoritative block store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Block, IndexStatus, Relation, RelationType};

/// Durable storage for blocks and the relations between them.
///
/// The record store is the single source of truth for block content. Every
/// call goes to persistent storage; implementations must not cache.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a new block.
    ///
    /// # Errors
    /// Returns `DuplicateBlockId` if a block with the same id already exists.
    async fn create_block(&self, block: &Block) -> DomainResult<()>;

    /// Insert a directed edge. Duplicate edges are permitted and the target
    /// is not required to exist.
    async fn create_relation(&self, relation: &Relation) -> DomainResult<()>;

    /// Get a block by id, `None` if it was never stored.
    async fn get_block_by_id(&self, id: Uuid) -> DomainResult<Option<Block>>;

    /// Blocks whose relation of the given type points at `target_id`.
    ///
    /// Ordering is store-defined; callers must not rely on it.
    async fn get_related_blocks(
        &self,
        target_id: Uuid,
        relation_type: RelationType,
    ) -> DomainResult<Vec<Block>>;

    /// The subset of `ids` that exist, in store order.
    ///
    /// An empty slice returns an empty result without touching storage.
    async fn get_blocks_by_ids(&self, ids: &[Uuid]) -> DomainResult<Vec<Block>>;

    /// Record whether a prompt has a vector index entry.
    async fn set_index_status(&self, id: Uuid, status: IndexStatus) -> DomainResult<()>;

    /// Set the index status after a re-indexing attempt and stamp the attempt
    /// so the prompt moves behind prompts that were tried less recently.
    ///
    /// # Errors
    /// Returns `BlockNotFound` if no block has this id.
    async fn record_index_attempt(&self, id: Uuid, status: IndexStatus) -> DomainResult<()>;

    /// Prompts that still need indexing: every `index_failed` prompt, plus
    /// `pending` prompts created before `pending_before`.
    ///
    /// Prompts never attempted come first (oldest first), then the least
    /// recently attempted, so a prompt that keeps failing cannot hold the
    /// head of the queue.
    async fn list_unindexed_prompts(
        &self,
        pending_before: DateTime<Utc>,
        limit: usize,
    ) -> DomainResult<Vec<Block>>;
}
