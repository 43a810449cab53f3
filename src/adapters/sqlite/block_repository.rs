//! SQLite implementation of the RecordStore.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Block, BlockContent, BlockType, IndexStatus, Relation, RelationType};
use crate::domain::ports::RecordStore;

const BLOCK_COLUMNS: &str = "id, block_type, title, content, index_status, created_at";

#[derive(Clone)]
pub struct SqliteRecordStore {
    pool: SqlitePool,
}

impl SqliteRecordStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn create_block(&self, block: &Block) -> DomainResult<()> {
        let content_json = block.content.to_json()?;

        let result = sqlx::query(
            r#"INSERT INTO blocks (id, block_type, title, content, index_status, created_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(block.id.to_string())
        .bind(block.block_type.as_str())
        .bind(&block.title)
        .bind(&content_json)
        .bind(block.index_status.as_str())
        .bind(format_timestamp(block.created_at))
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(DomainError::DuplicateBlockId(block.id))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn create_relation(&self, relation: &Relation) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT INTO block_relations (source_block_id, target_block_id, relation_type, created_at)
               VALUES (?, ?, ?, ?)"#,
        )
        .bind(relation.source_id.to_string())
        .bind(relation.target_id.to_string())
        .bind(relation.relation_type.as_str())
        .bind(format_timestamp(Utc::now()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_block_by_id(&self, id: Uuid) -> DomainResult<Option<Block>> {
        let row: Option<BlockRow> =
            sqlx::query_as(&format!("SELECT {BLOCK_COLUMNS} FROM blocks WHERE id = ?"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;

        row.map(|r| r.try_into()).transpose()
    }

    async fn get_related_blocks(
        &self,
        target_id: Uuid,
        relation_type: RelationType,
    ) -> DomainResult<Vec<Block>> {
        let rows: Vec<BlockRow> = sqlx::query_as(
            r#"SELECT b.id, b.block_type, b.title, b.content, b.index_status, b.created_at
               FROM blocks b
               JOIN block_relations r ON r.source_block_id = b.id
               WHERE r.target_block_id = ? AND r.relation_type = ?
               ORDER BY b.created_at ASC, b.rowid ASC"#,
        )
        .bind(target_id.to_string())
        .bind(relation_type.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    async fn get_blocks_by_ids(&self, ids: &[Uuid]) -> DomainResult<Vec<Block>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT {BLOCK_COLUMNS} FROM blocks WHERE id IN ({placeholders}) ORDER BY created_at ASC, rowid ASC"
        );

        let mut query = sqlx::query_as::<_, BlockRow>(&sql);
        for id in ids {
            query = query.bind(id.to_string());
        }
        let rows = query.fetch_all(&self.pool).await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    async fn set_index_status(&self, id: Uuid, status: IndexStatus) -> DomainResult<()> {
        let result = sqlx::query("UPDATE blocks SET index_status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::BlockNotFound(id));
        }
        Ok(())
    }

    async fn record_index_attempt(&self, id: Uuid, status: IndexStatus) -> DomainResult<()> {
        let result = sqlx::query(
            r#"UPDATE blocks
               SET index_status = ?,
                   index_attempts = index_attempts + 1,
                   last_index_attempt_at = ?
               WHERE id = ?"#,
        )
        .bind(status.as_str())
        .bind(format_timestamp(Utc::now()))
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::BlockNotFound(id));
        }
        Ok(())
    }

    async fn list_unindexed_prompts(
        &self,
        pending_before: DateTime<Utc>,
        limit: usize,
    ) -> DomainResult<Vec<Block>> {
        let rows: Vec<BlockRow> = sqlx::query_as(&format!(
            r#"SELECT {BLOCK_COLUMNS} FROM blocks
               WHERE block_type = 'prompt'
                 AND (index_status = 'index_failed'
                      OR (index_status = 'pending' AND created_at < ?))
               ORDER BY last_index_attempt_at IS NOT NULL,
                        last_index_attempt_at ASC,
                        created_at ASC,
                        rowid ASC
               LIMIT ?"#
        ))
        .bind(format_timestamp(pending_before))
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }
}

#[derive(sqlx::FromRow)]
struct BlockRow {
    id: String,
    block_type: String,
    title: Option<String>,
    content: String,
    index_status: String,
    created_at: String,
}

impl TryFrom<BlockRow> for Block {
    type Error = DomainError;

    fn try_from(row: BlockRow) -> Result<Self, Self::Error> {
        let id = super::parse_uuid(&row.id)?;

        let block_type = BlockType::from_str(&row.block_type).ok_or_else(|| {
            DomainError::SerializationError(format!("unknown block type: {}", row.block_type))
        })?;

        let index_status = IndexStatus::from_str(&row.index_status).ok_or_else(|| {
            DomainError::SerializationError(format!("unknown index status: {}", row.index_status))
        })?;

        let content = BlockContent::from_json(block_type, &row.content)?;
        let created_at = super::parse_datetime(&row.created_at)?;

        Ok(Block {
            id,
            block_type,
            title: row.title,
            content,
            index_status,
            created_at,
        })
    }
}
