//! Common test utilities for integration tests
//!
//! Builds a fully wired application on an in-memory database with the
//! deterministic hashing embedder and the local vector index.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

use hors_texte::adapters::embeddings::HashingEmbeddingProvider;
use hors_texte::adapters::http::PromptsHttpServer;
use hors_texte::adapters::sqlite::{create_migrated_test_pool, SqliteVectorIndex};
use hors_texte::domain::models::{Config, EmbeddingProviderKind};
use hors_texte::{AppContext, DomainError, DomainResult, EmbeddingProvider};

pub const DIMENSION: usize = 64;

/// Config for tests: hashing embedder, fast reconciler backoff.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.embedding.provider = EmbeddingProviderKind::Hash;
    config.embedding.dimension = DIMENSION;
    config.reconciler.initial_backoff_ms = 1;
    config.reconciler.max_backoff_ms = 5;
    config
}

/// Application on a fresh in-memory database.
pub async fn test_app() -> AppContext {
    let embedder = HashingEmbeddingProvider::new(DIMENSION).expect("valid dimension");
    test_app_with(Arc::new(embedder), &test_config()).await
}

/// Application with a custom embedder.
pub async fn test_app_with(embedder: Arc<dyn EmbeddingProvider>, config: &Config) -> AppContext {
    let pool = create_migrated_test_pool().await.expect("test pool");
    let index = Arc::new(SqliteVectorIndex::new(pool.clone()));
    AppContext::assemble(pool, embedder, index, config)
}

/// Router over the application's services.
#[allow(dead_code)]
pub fn router(ctx: &AppContext) -> Router {
    PromptsHttpServer::new(ctx.ingestion.clone(), ctx.retrieval.clone(), Config::default().server)
        .build_router()
}

/// Send one request and decode the JSON body (`Value::Null` for non-JSON bodies).
#[allow(dead_code)]
pub async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };

    let response = router.clone().oneshot(request).await.expect("router response");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body");
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

/// Hashing embedder that can be switched into a failing state, and can be
/// told to always reject texts containing a marker.
#[allow(dead_code)]
pub struct SwitchableEmbedder {
    inner: HashingEmbeddingProvider,
    failing: AtomicBool,
    rejected: Option<String>,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl SwitchableEmbedder {
    pub fn new(failing: bool) -> Self {
        Self {
            inner: HashingEmbeddingProvider::new(DIMENSION).expect("valid dimension"),
            failing: AtomicBool::new(failing),
            rejected: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn rejecting(mut self, marker: &str) -> Self {
        self.rejected = Some(marker.to_string());
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for SwitchableEmbedder {
    fn name(&self) -> &'static str {
        "switchable"
    }

    fn dimension(&self) -> usize {
        DIMENSION
    }

    async fn embed(&self, text: &str) -> DomainResult<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(DomainError::EmbeddingFailed("provider unavailable".to_string()));
        }
        if self.rejected.as_deref().is_some_and(|marker| text.contains(marker)) {
            return Err(DomainError::EmbeddingFailed("input rejected".to_string()));
        }
        self.inner.embed(text).await
    }
}
