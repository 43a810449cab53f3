//! Port trait definitions (Hexagonal Architecture)
//!
//! - RecordStore: durable block and relation storage
//! - EmbeddingProvider: text to vector
//! - VectorIndex: nearest-neighbour lookup over prompt embeddings
//!
//! Pipelines receive these as `Arc<dyn ...>` so tests can substitute fakes.

pub mod embedding;
pub mod record_store;
pub mod vector_index;

pub use embedding::EmbeddingProvider;
pub use record_store::RecordStore;
pub use vector_index::VectorIndex;
