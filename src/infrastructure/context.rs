//! Wires configured adapters into the services used by the CLI and server.

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::adapters::embeddings::{HashingEmbeddingProvider, OpenAiEmbeddingConfig, OpenAiEmbeddingProvider};
use crate::adapters::sqlite::{initialize_database, SqliteRecordStore, SqliteVectorIndex};
use crate::adapters::vector::{PineconeConfig, PineconeVectorIndex};
use crate::domain::models::{Config, EmbeddingProviderKind, VectorIndexKind};
use crate::domain::ports::{EmbeddingProvider, RecordStore, VectorIndex};
use crate::services::{IndexReconciler, IngestionService, PromptIndexer, ProviderTimeouts, RetrievalService};

/// Fully wired application services.
#[derive(Clone)]
pub struct AppContext {
    pub pool: SqlitePool,
    pub ingestion: IngestionService,
    pub retrieval: RetrievalService,
    pub reconciler: IndexReconciler,
}

impl AppContext {
    /// Open the database, apply migrations and build the configured providers.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let pool = initialize_database(&config.database.url(), config.database.max_connections)
            .await
            .context("Failed to initialize database")?;
        Self::with_pool(pool, config)
    }

    /// Build services on an already migrated pool.
    pub fn with_pool(pool: SqlitePool, config: &Config) -> Result<Self> {
        let embedder = build_embedder(config)?;
        let index = build_vector_index(config, &pool)?;
        Ok(Self::assemble(pool, embedder, index, config))
    }

    /// Build services from explicit providers.
    pub fn assemble(
        pool: SqlitePool,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        config: &Config,
    ) -> Self {
        let store: Arc<dyn RecordStore> = Arc::new(SqliteRecordStore::new(pool.clone()));
        let indexer = PromptIndexer::new(embedder, index, ProviderTimeouts::from_config(config));

        tracing::debug!(
            embedder = indexer.embedder_name(),
            vector_index = indexer.index_name(),
            "services assembled"
        );

        Self {
            ingestion: IngestionService::new(store.clone(), indexer.clone()),
            retrieval: RetrievalService::new(store.clone(), indexer.clone(), config.search.clone()),
            reconciler: IndexReconciler::new(store, indexer, config.reconciler.clone()),
            pool,
        }
    }
}

fn build_embedder(config: &Config) -> Result<Arc<dyn EmbeddingProvider>> {
    let embedder: Arc<dyn EmbeddingProvider> = match config.embedding.provider {
        EmbeddingProviderKind::Openai => Arc::new(
            OpenAiEmbeddingProvider::new(OpenAiEmbeddingConfig::from(&config.embedding))
                .context("Failed to create OpenAI embedding provider")?,
        ),
        EmbeddingProviderKind::Hash => Arc::new(
            HashingEmbeddingProvider::new(config.embedding.dimension)
                .context("Failed to create hashing embedding provider")?,
        ),
    };
    Ok(embedder)
}

fn build_vector_index(config: &Config, pool: &SqlitePool) -> Result<Arc<dyn VectorIndex>> {
    let index: Arc<dyn VectorIndex> = match config.vector_index.provider {
        VectorIndexKind::Sqlite => Arc::new(SqliteVectorIndex::new(pool.clone())),
        VectorIndexKind::Pinecone => {
            let pinecone = PineconeConfig::from_index_config(&config.vector_index)
                .context("Invalid Pinecone configuration")?;
            Arc::new(PineconeVectorIndex::new(pinecone).context("Failed to create Pinecone client")?)
        }
    };
    Ok(index)
}
