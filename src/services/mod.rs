//! Pipelines orchestrating the record store, embedding provider and vector index.

pub mod index_reconciler;
pub mod ingestion_service;
pub mod prompt_indexer;
pub mod retrieval_service;
pub mod timeouts;

#[cfg(test)]
pub(crate) mod test_support;

pub use index_reconciler::{IndexReconciler, ReconcileReport};
pub use ingestion_service::IngestionService;
pub use prompt_indexer::PromptIndexer;
pub use retrieval_service::RetrievalService;
pub use timeouts::ProviderTimeouts;
