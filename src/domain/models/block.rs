//! Block domain model.
//!
//! A block is an immutable unit of content. Prompts carry an optional title
//! and are mirrored into the vector index; responses hang off a prompt via a
//! `response_to` relation and are never embedded.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of content a block holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    Prompt,
    Response,
}

impl BlockType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prompt => "prompt",
            Self::Response => "response",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "prompt" => Some(Self::Prompt),
            "response" => Some(Self::Response),
            _ => None,
        }
    }
}

impl std::fmt::Display for BlockType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text payload stored in the `content` column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextPayload {
    pub text: String,
}

/// Block content, keyed by block type.
///
/// Serializes to the bare payload (`{"text": ...}`); the variant is recovered
/// from the `block_type` column when decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum BlockContent {
    Prompt(TextPayload),
    Response(TextPayload),
}

impl BlockContent {
    pub fn prompt(text: impl Into<String>) -> Self {
        Self::Prompt(TextPayload { text: text.into() })
    }

    pub fn response(text: impl Into<String>) -> Self {
        Self::Response(TextPayload { text: text.into() })
    }

    pub fn block_type(&self) -> BlockType {
        match self {
            Self::Prompt(_) => BlockType::Prompt,
            Self::Response(_) => BlockType::Response,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Prompt(p) | Self::Response(p) => &p.text,
        }
    }

    /// Encode the payload for storage.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decode a stored payload for the given block type.
    pub fn from_json(block_type: BlockType, json: &str) -> Result<Self, serde_json::Error> {
        let payload: TextPayload = serde_json::from_str(json)?;
        Ok(match block_type {
            BlockType::Prompt => Self::Prompt(payload),
            BlockType::Response => Self::Response(payload),
        })
    }
}

/// Whether a block has a matching vector index entry.
///
/// Prompts move `pending -> indexed | index_failed`; responses are never indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexStatus {
    NotApplicable,
    Pending,
    Indexed,
    IndexFailed,
}

impl IndexStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotApplicable => "not_applicable",
            Self::Pending => "pending",
            Self::Indexed => "indexed",
            Self::IndexFailed => "index_failed",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "not_applicable" => Some(Self::NotApplicable),
            "pending" => Some(Self::Pending),
            "indexed" => Some(Self::Indexed),
            "index_failed" => Some(Self::IndexFailed),
            _ => None,
        }
    }
}

impl std::fmt::Display for IndexStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable content unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    pub id: Uuid,
    pub block_type: BlockType,
    pub title: Option<String>,
    pub content: BlockContent,
    pub index_status: IndexStatus,
    pub created_at: DateTime<Utc>,
}

impl Block {
    /// Create a new prompt block with a fresh id, awaiting indexing.
    pub fn prompt(title: Option<String>, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            block_type: BlockType::Prompt,
            title,
            content: BlockContent::prompt(text),
            index_status: IndexStatus::Pending,
            created_at: now(),
        }
    }

    /// Create a new response block with a fresh id.
    pub fn response(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            block_type: BlockType::Response,
            title: None,
            content: BlockContent::response(text),
            index_status: IndexStatus::NotApplicable,
            created_at: now(),
        }
    }

    pub fn text(&self) -> &str {
        self.content.text()
    }

    pub fn is_prompt(&self) -> bool {
        self.block_type == BlockType::Prompt
    }

    /// Check the block is well-formed before it is written.
    pub fn validate(&self) -> Result<(), String> {
        if self.text().trim().is_empty() {
            return Err("text cannot be empty".to_string());
        }
        if self.content.block_type() != self.block_type {
            return Err(format!(
                "content does not match block type {}",
                self.block_type
            ));
        }
        if self.block_type == BlockType::Response && self.title.is_some() {
            return Err("responses cannot have a title".to_string());
        }
        Ok(())
    }
}

/// Timestamps are truncated to microseconds so they survive a round trip
/// through the RFC3339 text column unchanged.
fn now() -> DateTime<Utc> {
    let now = Utc::now();
    let text = now.to_rfc3339_opts(SecondsFormat::Micros, true);
    DateTime::parse_from_rfc3339(&text).map_or(now, |dt| dt.with_timezone(&Utc))
}

/// Kind of edge between two blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    /// Source is a response answering the target prompt.
    ResponseTo,
}

impl RelationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ResponseTo => "response_to",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "response_to" => Some(Self::ResponseTo),
            _ => None,
        }
    }
}

/// A directed, typed edge between two blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relation {
    pub source_id: Uuid,
    pub target_id: Uuid,
    pub relation_type: RelationType,
}

impl Relation {
    pub fn response_to(response_id: Uuid, prompt_id: Uuid) -> Self {
        Self {
            source_id: response_id,
            target_id: prompt_id,
            relation_type: RelationType::ResponseTo,
        }
    }
}
