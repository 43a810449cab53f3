//! Domain layer for the Hors-Texte prompt store
//!
//! This module contains the block model, pipeline result types, and the
//! port traits that storage, embedding, and vector index adapters implement.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
