//! Results returned by the ingestion and retrieval pipelines.

use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use super::block::Block;

/// Result of creating a prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedPrompt {
    pub id: Uuid,
    pub title: Option<String>,
    pub text: String,
}

/// Result of attaching a response to a prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedResponse {
    pub id: Uuid,
    #[serde(rename = "promptId")]
    pub prompt_id: Uuid,
    pub text: String,
}

/// A prompt together with every response pointing at it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptWithResponses {
    pub prompt: Block,
    pub responses: Vec<Block>,
}

/// Semantic search results.
///
/// `prompts` follows record-store order unless rank preservation is enabled;
/// `scores` carries the vector similarity for every returned prompt so callers
/// can re-rank either way.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SearchResults {
    pub prompts: Vec<Block>,
    pub scores: HashMap<Uuid, f32>,
}

impl SearchResults {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }
}
