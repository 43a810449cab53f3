//! Pinecone vector index adapter.
//!
//! Talks to the data-plane REST API of a single index (`/vectors/upsert` and
//! `/query`). The index host is the per-index URL shown in the Pinecone console.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{VectorIndexConfig, VectorMatch, VectorMetadata};
use crate::domain::ports::VectorIndex;

/// Configuration for the Pinecone adapter.
#[derive(Debug, Clone)]
pub struct PineconeConfig {
    /// Index host, with or without scheme.
    pub host: String,
    /// API key. Falls back to `PINECONE_API_KEY` env var.
    pub api_key: Option<String>,
    pub namespace: Option<String>,
    pub timeout_secs: u64,
}

impl PineconeConfig {
    pub fn from_index_config(config: &VectorIndexConfig) -> DomainResult<Self> {
        let host = config
            .host
            .clone()
            .filter(|h| !h.trim().is_empty())
            .ok_or_else(|| DomainError::ValidationFailed("vector_index.host is required for pinecone".to_string()))?;

        Ok(Self {
            host,
            api_key: config.api_key.clone(),
            namespace: config.namespace.clone(),
            timeout_secs: config.timeout_secs,
        })
    }

    fn base_url(&self) -> String {
        let host = self.host.trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("https://{}", host)
        }
    }

    fn get_api_key(&self) -> DomainResult<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("PINECONE_API_KEY").ok())
            .ok_or_else(|| {
                DomainError::IndexFailure(
                    "Pinecone API key not set. Set PINECONE_API_KEY env var or configure vector_index.api_key."
                        .to_string(),
                )
            })
    }
}

pub struct PineconeVectorIndex {
    config: PineconeConfig,
    base_url: String,
    client: Arc<reqwest::Client>,
}

impl PineconeVectorIndex {
    pub fn new(config: PineconeConfig) -> DomainResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DomainError::IndexFailure(format!("Failed to build HTTP client: {}", e)))?;
        let base_url = config.base_url();
        Ok(Self {
            config,
            base_url,
            client: Arc::new(client),
        })
    }

    async fn post<B: Serialize + Sync>(&self, path: &str, body: &B) -> DomainResult<reqwest::Response> {
        let api_key = self.config.get_api_key()?;
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .post(&url)
            .header("Api-Key", api_key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| DomainError::IndexFailure(format!("Pinecone request to {} failed: {}", path, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read response body".to_string());
            return Err(DomainError::IndexFailure(format!(
                "Pinecone {} returned {}: {}",
                path, status, body
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl VectorIndex for PineconeVectorIndex {
    fn name(&self) -> &'static str {
        "pinecone"
    }

    async fn upsert(&self, id: Uuid, vector: &[f32], metadata: &VectorMetadata) -> DomainResult<()> {
        let id = id.to_string();
        let request = UpsertRequest {
            vectors: vec![PineconeVector {
                id: &id,
                values: vector,
                metadata,
            }],
            namespace: self.config.namespace.as_deref(),
        };

        self.post("/vectors/upsert", &request).await?;
        Ok(())
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> DomainResult<Vec<VectorMatch>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let request = QueryRequest {
            vector,
            top_k,
            include_metadata: true,
            namespace: self.config.namespace.as_deref(),
        };

        let response: QueryResponse = self
            .post("/query", &request)
            .await?
            .json()
            .await
            .map_err(|e| DomainError::IndexFailure(format!("Failed to parse Pinecone query response: {}", e)))?;

        let matches = response
            .matches
            .into_iter()
            .filter_map(|m| match Uuid::parse_str(&m.id) {
                Ok(id) => Some(VectorMatch::new(id, m.score)),
                Err(e) => {
                    tracing::warn!(id = %m.id, error = %e, "skipping pinecone match with non-uuid id");
                    None
                }
            })
            .take(top_k)
            .collect();

        Ok(matches)
    }
}

// -- Pinecone API request/response types --

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    vectors: Vec<PineconeVector<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct PineconeVector<'a> {
    id: &'a str,
    values: &'a [f32],
    metadata: &'a VectorMetadata,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<PineconeMatch>,
}

#[derive(Debug, Deserialize)]
struct PineconeMatch {
    id: String,
    #[serde(default)]
    score: f32,
}
