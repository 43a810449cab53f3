//! Hosted vector index adapters. The local backend lives in `adapters::sqlite`.

pub mod pinecone;

pub use pinecone::{PineconeConfig, PineconeVectorIndex};
