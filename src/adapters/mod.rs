//! Infrastructure adapters for external systems.

pub mod embeddings;
pub mod http;
pub mod sqlite;
pub mod vector;
