//! Vector index port.
//!
//! A vector index holds one embedding per prompt id, plus a shallow metadata
//! copy, and answers nearest-neighbour queries with candidate ids. It is a
//! derived shadow of the record store and never the source of content.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{VectorMatch, VectorMetadata};

/// Trait for vector index backends.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Backend name (e.g., "sqlite", "pinecone").
    fn name(&self) -> &'static str;

    /// Insert or replace the entry for `id`. Last write wins.
    async fn upsert(&self, id: Uuid, vector: &[f32], metadata: &VectorMetadata) -> DomainResult<()>;

    /// The `top_k` nearest entries, best match first.
    ///
    /// Ties are broken deterministically within a single call.
    async fn query(&self, vector: &[f32], top_k: usize) -> DomainResult<Vec<VectorMatch>>;
}
