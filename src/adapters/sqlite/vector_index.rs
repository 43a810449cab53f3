//! Local vector index backed by the `vector_entries` table.
//!
//! Embeddings are stored as little-endian `f32` blobs. Queries load every
//! entry and rank by cosine similarity in process, which is adequate for a
//! single-node prompt store; larger corpora should use a hosted index.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{VectorMatch, VectorMetadata};
use crate::domain::ports::VectorIndex;

use super::block_repository::format_timestamp;

#[derive(Clone)]
pub struct SqliteVectorIndex {
    pool: SqlitePool,
}

impl SqliteVectorIndex {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn count(&self) -> DomainResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM vector_entries")
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn bytes_to_embedding(bytes: &[u8]) -> DomainResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(DomainError::IndexFailure(format!(
            "invalid embedding blob length {}",
            bytes.len()
        )));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

/// Cosine similarity in `[-1, 1]`. Mismatched lengths and zero vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    (dot / (mag_a * mag_b)).clamp(-1.0, 1.0)
}

#[async_trait]
impl VectorIndex for SqliteVectorIndex {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn upsert(&self, id: Uuid, vector: &[f32], metadata: &VectorMetadata) -> DomainResult<()> {
        let metadata_json = serde_json::to_string(metadata)?;

        sqlx::query(
            r#"INSERT INTO vector_entries (id, embedding, dimension, metadata, updated_at)
               VALUES (?, ?, ?, ?, ?)
               ON CONFLICT(id) DO UPDATE SET
                   embedding = excluded.embedding,
                   dimension = excluded.dimension,
                   metadata = excluded.metadata,
                   updated_at = excluded.updated_at"#,
        )
        .bind(id.to_string())
        .bind(embedding_to_bytes(vector))
        .bind(i64::try_from(vector.len()).unwrap_or(i64::MAX))
        .bind(&metadata_json)
        .bind(format_timestamp(Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::IndexFailure(e.to_string()))?;

        Ok(())
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> DomainResult<Vec<VectorMatch>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let rows: Vec<(String, Vec<u8>)> = sqlx::query_as("SELECT id, embedding FROM vector_entries")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::IndexFailure(e.to_string()))?;

        let mut matches = Vec::with_capacity(rows.len());
        for (id, blob) in rows {
            let id = match Uuid::parse_str(&id) {
                Ok(id) => id,
                Err(e) => {
                    tracing::warn!(id = %id, error = %e, "skipping vector entry with invalid id");
                    continue;
                }
            };
            let embedding = bytes_to_embedding(&blob)?;
            matches.push(VectorMatch::new(id, cosine_similarity(vector, &embedding)));
        }

        rank_matches(&mut matches);
        matches.truncate(top_k);
        Ok(matches)
    }
}

/// Best score first; equal scores fall back to id order so results are stable.
pub(crate) fn rank_matches(matches: &mut [VectorMatch]) {
    matches.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;
    use proptest::prelude::*;

    async fn setup_index() -> SqliteVectorIndex {
        let pool = create_migrated_test_pool().await.unwrap();
        SqliteVectorIndex::new(pool)
    }

    #[test]
    fn test_embedding_bytes_round_trip() {
        let embedding = vec![0.25, -1.5, 3.0];
        let bytes = embedding_to_bytes(&embedding);
        assert_eq!(bytes.len(), 12);
        assert_eq!(bytes_to_embedding(&bytes).unwrap(), embedding);
        assert!(bytes_to_embedding(&bytes[..5]).is_err());
    }

    #[test]
    fn test_cosine_similarity_edges() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }

    #[tokio::test]
    async fn test_query_ranks_by_similarity() {
        let index = setup_index().await;
        let near = Uuid::new_v4();
        let far = Uuid::new_v4();
        let opposite = Uuid::new_v4();

        index.upsert(near, &[1.0, 0.1], &VectorMetadata::for_prompt(near, None)).await.unwrap();
        index.upsert(far, &[0.1, 1.0], &VectorMetadata::for_prompt(far, None)).await.unwrap();
        index
            .upsert(opposite, &[-1.0, 0.0], &VectorMetadata::for_prompt(opposite, None))
            .await
            .unwrap();

        let results = index.query(&[1.0, 0.0], 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, near);
        assert_eq!(results[1].id, far);
        assert!(results[0].score > results[1].score);
    }

    #[tokio::test]
    async fn test_upsert_replaces_existing_entry() {
        let index = setup_index().await;
        let id = Uuid::new_v4();
        let metadata = VectorMetadata::for_prompt(id, Some("t".to_string()));

        index.upsert(id, &[0.0, 1.0], &metadata).await.unwrap();
        index.upsert(id, &[1.0, 0.0], &metadata).await.unwrap();

        assert_eq!(index.count().await.unwrap(), 1);
        let results = index.query(&[1.0, 0.0], 5).await.unwrap();
        assert!((results[0].score - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_query_empty_index_and_zero_k() {
        let index = setup_index().await;
        assert!(index.query(&[1.0, 0.0], 5).await.unwrap().is_empty());

        let id = Uuid::new_v4();
        index.upsert(id, &[1.0, 0.0], &VectorMetadata::for_prompt(id, None)).await.unwrap();
        assert!(index.query(&[1.0, 0.0], 0).await.unwrap().is_empty());
    }

    #[test]
    fn test_ties_break_by_id() {
        let low = Uuid::from_u128(1);
        let high = Uuid::from_u128(2);
        let mut matches = vec![VectorMatch::new(high, 0.5), VectorMatch::new(low, 0.5)];
        rank_matches(&mut matches);
        assert_eq!(matches[0].id, low);
    }

    proptest! {
        #[test]
        fn prop_cosine_similarity_is_bounded_and_symmetric(
            pair in (1usize..16).prop_flat_map(|n| (
                prop::collection::vec(-100.0f32..100.0, n),
                prop::collection::vec(-100.0f32..100.0, n),
            ))
        ) {
            let (a, b) = pair;
            let ab = cosine_similarity(&a, &b);
            let ba = cosine_similarity(&b, &a);
            prop_assert!((-1.0..=1.0).contains(&ab));
            prop_assert!((ab - ba).abs() < 1e-5);
        }

        #[test]
        fn prop_ranked_matches_are_descending(scores in prop::collection::vec(-1.0f32..1.0, 0..32)) {
            let mut matches: Vec<VectorMatch> = scores
                .iter()
                .enumerate()
                .map(|(i, s)| VectorMatch::new(Uuid::from_u128(i as u128), *s))
                .collect();
            rank_matches(&mut matches);
            for pair in matches.windows(2) {
                prop_assert!(pair[0].score >= pair[1].score);
            }
        }
    }
}
