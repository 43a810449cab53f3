//! Fakes shared by the service unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::mock;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Block, IndexStatus, Relation, RelationType, VectorMatch, VectorMetadata};
use crate::domain::ports::{EmbeddingProvider, RecordStore, VectorIndex};

mock! {
    pub Store {}

    #[async_trait::async_trait]
    impl RecordStore for Store {
        async fn create_block(&self, block: &Block) -> DomainResult<()>;
        async fn create_relation(&self, relation: &Relation) -> DomainResult<()>;
        async fn get_block_by_id(&self, id: Uuid) -> DomainResult<Option<Block>>;
        async fn get_related_blocks(&self, target_id: Uuid, relation_type: RelationType) -> DomainResult<Vec<Block>>;
        async fn get_blocks_by_ids(&self, ids: &[Uuid]) -> DomainResult<Vec<Block>>;
        async fn set_index_status(&self, id: Uuid, status: IndexStatus) -> DomainResult<()>;
        async fn record_index_attempt(&self, id: Uuid, status: IndexStatus) -> DomainResult<()>;
        async fn list_unindexed_prompts(&self, pending_before: DateTime<Utc>, limit: usize) -> DomainResult<Vec<Block>>;
    }
}

/// Embedder returning `[len(text), 1, 0, ...]`, optionally failing the first
/// `failures` calls.
pub struct FakeEmbedder {
    produced: usize,
    declared: usize,
    failures: AtomicUsize,
    calls: AtomicUsize,
}

impl FakeEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            produced: dimension,
            declared: dimension,
            failures: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    /// Report a different dimension than the vectors actually produced.
    pub fn declaring(mut self, dimension: usize) -> Self {
        self.declared = dimension;
        self
    }

    pub fn failing(self, times: usize) -> Self {
        self.failures.store(times, Ordering::SeqCst);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for FakeEmbedder {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn dimension(&self) -> usize {
        self.declared
    }

    async fn embed(&self, text: &str) -> DomainResult<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(DomainError::EmbeddingFailed("provider unavailable".to_string()));
        }

        let mut vector = vec![0.0; self.produced];
        if let Some(first) = vector.first_mut() {
            *first = text.len() as f32;
        }
        if let Some(second) = vector.get_mut(1) {
            *second = 1.0;
        }
        Ok(vector)
    }
}

/// Vector index that records upserts and answers queries with canned matches.
#[derive(Default)]
pub struct RecordingIndex {
    upserts: Mutex<Vec<(Uuid, Vec<f32>, VectorMetadata)>>,
    matches: Mutex<Vec<VectorMatch>>,
    fail_upserts: AtomicUsize,
}

impl RecordingIndex {
    pub fn with_matches(matches: Vec<VectorMatch>) -> Self {
        Self {
            matches: Mutex::new(matches),
            ..Default::default()
        }
    }

    pub fn failing_upserts(self, times: usize) -> Self {
        self.fail_upserts.store(times, Ordering::SeqCst);
        self
    }

    pub fn upserts(&self) -> Vec<(Uuid, Vec<f32>, VectorMetadata)> {
        self.upserts.lock().unwrap().clone()
    }
}

#[async_trait]
impl VectorIndex for RecordingIndex {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn upsert(&self, id: Uuid, vector: &[f32], metadata: &VectorMetadata) -> DomainResult<()> {
        let remaining = self.fail_upserts.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_upserts.store(remaining - 1, Ordering::SeqCst);
            return Err(DomainError::IndexFailure("index unreachable".to_string()));
        }
        self.upserts.lock().unwrap().push((id, vector.to_vec(), metadata.clone()));
        Ok(())
    }

    async fn query(&self, _vector: &[f32], top_k: usize) -> DomainResult<Vec<VectorMatch>> {
        Ok(self.matches.lock().unwrap().iter().take(top_k).copied().collect())
    }
}
