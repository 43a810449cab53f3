//! Background re-indexing of prompts missing from the vector index.
//!
//! Prompts are written to the record store before they are embedded, so a
//! provider outage leaves rows marked `pending` or `index_failed`. Each pass
//! re-embeds the stored text of a batch of those prompts and upserts it,
//! retrying each prompt with exponential backoff.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use backoff::ExponentialBackoffBuilder;
use chrono::Utc;
use serde::Serialize;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};

use crate::domain::errors::DomainResult;
use crate::domain::models::{Block, IndexStatus, ReconcilerConfig};
use crate::domain::ports::RecordStore;

use super::prompt_indexer::PromptIndexer;

/// Outcome of one reconcile pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub scanned: usize,
    pub indexed: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct IndexReconciler {
    store: Arc<dyn RecordStore>,
    indexer: PromptIndexer,
    config: ReconcilerConfig,
}

impl IndexReconciler {
    pub fn new(store: Arc<dyn RecordStore>, indexer: PromptIndexer, config: ReconcilerConfig) -> Self {
        Self { store, indexer, config }
    }

    /// Re-index up to `batch_size` unindexed prompts.
    ///
    /// Pending prompts younger than one interval are skipped; they most
    /// likely belong to an ingestion that is still in flight.
    pub async fn reconcile_once(&self) -> DomainResult<ReconcileReport> {
        let grace = chrono::Duration::seconds(i64::try_from(self.config.interval_secs).unwrap_or(i64::MAX));
        let pending_before = Utc::now() - grace;

        let prompts = self
            .store
            .list_unindexed_prompts(pending_before, self.config.batch_size)
            .await?;

        let mut report = ReconcileReport {
            scanned: prompts.len(),
            ..Default::default()
        };

        for prompt in &prompts {
            let status = match self.index_with_retry(prompt).await {
                Ok(()) => IndexStatus::Indexed,
                Err(err) => {
                    tracing::warn!(prompt_id = %prompt.id, error = %err, "re-indexing failed");
                    IndexStatus::IndexFailed
                }
            };

            if self.record_attempt(prompt, status).await && status == IndexStatus::Indexed {
                report.indexed += 1;
            } else {
                report.failed += 1;
            }
        }

        if report.scanned > 0 {
            tracing::info!(
                scanned = report.scanned,
                indexed = report.indexed,
                failed = report.failed,
                "reconcile pass complete"
            );
        }
        Ok(report)
    }

    /// Best-effort status write. A prompt whose attempt cannot be recorded
    /// stays in the queue and counts as failed for this pass.
    async fn record_attempt(&self, prompt: &Block, status: IndexStatus) -> bool {
        match self.store.record_index_attempt(prompt.id, status).await {
            Ok(()) => true,
            Err(err) => {
                tracing::error!(prompt_id = %prompt.id, %status, error = %err, "failed to record index attempt");
                false
            }
        }
    }

    async fn index_with_retry(&self, prompt: &Block) -> DomainResult<()> {
        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(self.config.initial_backoff_ms))
            .with_max_interval(Duration::from_millis(self.config.max_backoff_ms))
            .with_max_elapsed_time(None)
            .build();

        let attempts = AtomicU32::new(0);
        let max_attempts = self.config.max_attempts.max(1);
        let indexer = &self.indexer;
        let attempts_ref = &attempts;

        backoff::future::retry(policy, || async move {
            let attempt = attempts_ref.fetch_add(1, Ordering::SeqCst) + 1;
            indexer.index_prompt(prompt).await.map_err(|err| {
                if attempt >= max_attempts {
                    backoff::Error::permanent(err)
                } else {
                    tracing::debug!(prompt_id = %prompt.id, attempt, error = %err, "retrying index");
                    backoff::Error::transient(err)
                }
            })
        })
        .await
    }

    /// Run passes every `interval_secs` until `shutdown` flips to `true`.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        if !self.config.enabled {
            tracing::info!("index reconciler disabled");
            return;
        }

        let mut ticker = interval(Duration::from_secs(self.config.interval_secs.max(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(interval_secs = self.config.interval_secs, "index reconciler started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(err) = self.reconcile_once().await {
                        tracing::error!(error = %err, "reconcile pass failed");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!("index reconciler stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::DomainError;
    use crate::services::test_support::{FakeEmbedder, MockStore, RecordingIndex};
    use crate::services::timeouts::ProviderTimeouts;
    use mockall::predicate::*;

    fn fast_config() -> ReconcilerConfig {
        ReconcilerConfig {
            max_attempts: 3,
            initial_backoff_ms: 1,
            max_backoff_ms: 5,
            ..ReconcilerConfig::default()
        }
    }

    fn reconciler(store: MockStore, embedder: Arc<FakeEmbedder>, index: Arc<RecordingIndex>) -> IndexReconciler {
        IndexReconciler::new(
            Arc::new(store),
            PromptIndexer::new(embedder, index, ProviderTimeouts::default()),
            fast_config(),
        )
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried_then_indexed() {
        let prompt = Block::prompt(None, "stuck");
        let prompt_id = prompt.id;

        let mut store = MockStore::new();
        store
            .expect_list_unindexed_prompts()
            .times(1)
            .returning(move |_, _| Ok(vec![prompt.clone()]));
        store
            .expect_record_index_attempt()
            .with(eq(prompt_id), eq(IndexStatus::Indexed))
            .times(1)
            .returning(|_, _| Ok(()));

        let embedder = Arc::new(FakeEmbedder::new(2).failing(2));
        let index = Arc::new(RecordingIndex::default());
        let report = reconciler(store, embedder.clone(), index.clone())
            .reconcile_once()
            .await
            .unwrap();

        assert_eq!(report, ReconcileReport { scanned: 1, indexed: 1, failed: 0 });
        assert_eq!(embedder.calls(), 3);
        assert_eq!(index.upserts()[0].0, prompt_id);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let prompt = Block::prompt(None, "broken");
        let prompt_id = prompt.id;

        let mut store = MockStore::new();
        store
            .expect_list_unindexed_prompts()
            .returning(move |_, _| Ok(vec![prompt.clone()]));
        store
            .expect_record_index_attempt()
            .with(eq(prompt_id), eq(IndexStatus::IndexFailed))
            .times(1)
            .returning(|_, _| Ok(()));

        let embedder = Arc::new(FakeEmbedder::new(2).failing(10));
        let report = reconciler(store, embedder.clone(), Arc::new(RecordingIndex::default()))
            .reconcile_once()
            .await
            .unwrap();

        assert_eq!(report, ReconcileReport { scanned: 1, indexed: 0, failed: 1 });
        assert_eq!(embedder.calls(), 3);
    }

    #[tokio::test]
    async fn test_already_failed_prompt_still_records_attempt() {
        let mut prompt = Block::prompt(None, "broken");
        prompt.index_status = IndexStatus::IndexFailed;
        let prompt_id = prompt.id;

        let mut store = MockStore::new();
        store
            .expect_list_unindexed_prompts()
            .returning(move |_, _| Ok(vec![prompt.clone()]));
        store
            .expect_record_index_attempt()
            .with(eq(prompt_id), eq(IndexStatus::IndexFailed))
            .times(1)
            .returning(|_, _| Ok(()));
        store.expect_set_index_status().never();

        let report = reconciler(
            store,
            Arc::new(FakeEmbedder::new(2).failing(10)),
            Arc::new(RecordingIndex::default()),
        )
        .reconcile_once()
        .await
        .unwrap();
        assert_eq!(report.failed, 1);
    }

    #[tokio::test]
    async fn test_status_write_failure_does_not_abort_pass() {
        let first = Block::prompt(None, "first");
        let second = Block::prompt(None, "second");
        let (first_id, second_id) = (first.id, second.id);

        let mut store = MockStore::new();
        store
            .expect_list_unindexed_prompts()
            .returning(move |_, _| Ok(vec![first.clone(), second.clone()]));
        store
            .expect_record_index_attempt()
            .with(eq(first_id), eq(IndexStatus::Indexed))
            .times(1)
            .returning(|_, _| Err(DomainError::DatabaseError("locked".to_string())));
        store
            .expect_record_index_attempt()
            .with(eq(second_id), eq(IndexStatus::Indexed))
            .times(1)
            .returning(|_, _| Ok(()));

        let index = Arc::new(RecordingIndex::default());
        let report = reconciler(store, Arc::new(FakeEmbedder::new(2)), index.clone())
            .reconcile_once()
            .await
            .unwrap();

        assert_eq!(report, ReconcileReport { scanned: 2, indexed: 1, failed: 1 });
        assert_eq!(index.upserts().len(), 2);
    }

    #[tokio::test]
    async fn test_batch_size_and_grace_period_passed_to_store() {
        let mut store = MockStore::new();
        store
            .expect_list_unindexed_prompts()
            .withf(|before, limit| *limit == 50 && *before < Utc::now() - chrono::Duration::seconds(59))
            .times(1)
            .returning(|_, _| Ok(Vec::new()));

        let report = reconciler(store, Arc::new(FakeEmbedder::new(2)), Arc::new(RecordingIndex::default()))
            .reconcile_once()
            .await
            .unwrap();
        assert_eq!(report, ReconcileReport::default());
    }

    #[tokio::test]
    async fn test_store_failure_aborts_pass() {
        let mut store = MockStore::new();
        store
            .expect_list_unindexed_prompts()
            .returning(|_, _| Err(DomainError::DatabaseError("gone".to_string())));

        let result = reconciler(store, Arc::new(FakeEmbedder::new(2)), Arc::new(RecordingIndex::default()))
            .reconcile_once()
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let mut store = MockStore::new();
        store.expect_list_unindexed_prompts().returning(|_, _| Ok(Vec::new()));

        let reconciler = reconciler(store, Arc::new(FakeEmbedder::new(2)), Arc::new(RecordingIndex::default()));
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(reconciler.run(rx));

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("reconciler did not stop")
            .unwrap();
    }
}
