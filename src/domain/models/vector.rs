//! Vector index entry types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Shallow copy of prompt fields stored alongside each embedding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorMetadata {
    pub prompt_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl VectorMetadata {
    pub fn for_prompt(prompt_id: Uuid, title: Option<String>) -> Self {
        Self { prompt_id, title }
    }
}

/// A nearest-neighbour hit. Higher scores are better matches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VectorMatch {
    pub id: Uuid,
    pub score: f32,
}

impl VectorMatch {
    pub fn new(id: Uuid, score: f32) -> Self {
        Self { id, score }
    }
}
