//! SQLite-backed vector store.
//!
//! Vectors live in the `embeddings` table as little-endian `f32` BLOBs.
//! Similarity is a pure-Rust scan over the requested candidate set; the
//! candidate pool is capped upstream so a full index is not needed.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use super::{format_datetime, parse_datetime, parse_uuid, placeholders};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{bytes_to_vector, cosine_similarity, vector_to_bytes, Embedding};
use crate::domain::ports::VectorStore;

#[derive(Clone)]
pub struct SqliteVectorStore {
    pool: SqlitePool,
}

impl SqliteVectorStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    async fn upsert(&self, user_id: Uuid, vector: &[f32]) -> DomainResult<Embedding> {
        if vector.is_empty() {
            return Err(DomainError::InvalidVectorFormat("empty vector".to_string()));
        }

        let now = format_datetime(Utc::now());
        let row: EmbeddingRow = sqlx::query_as(
            r#"INSERT INTO embeddings (user_id, vector, dimension, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?)
               ON CONFLICT(user_id) DO UPDATE SET
                   vector = excluded.vector,
                   dimension = excluded.dimension,
                   updated_at = excluded.updated_at
               RETURNING user_id, vector, created_at, updated_at"#,
        )
        .bind(user_id.to_string())
        .bind(vector_to_bytes(vector))
        .bind(vector.len() as i64)
        .bind(&now)
        .bind(&now)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn get(&self, user_id: Uuid) -> DomainResult<Option<Embedding>> {
        let row: Option<EmbeddingRow> = sqlx::query_as(
            "SELECT user_id, vector, created_at, updated_at FROM embeddings WHERE user_id = ?",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.try_into()).transpose()
    }

    async fn existing(&self, user_ids: &[Uuid]) -> DomainResult<HashSet<Uuid>> {
        if user_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let sql = format!(
            "SELECT user_id FROM embeddings WHERE user_id IN ({})",
            placeholders(user_ids.len())
        );
        let mut q = sqlx::query_as::<_, (String,)>(&sql);
        for id in user_ids {
            q = q.bind(id.to_string());
        }

        let rows = q.fetch_all(&self.pool).await?;
        rows.iter().map(|(id,)| parse_uuid(id)).collect()
    }

    async fn similarity(
        &self,
        source: &[f32],
        candidate_ids: &[Uuid],
    ) -> DomainResult<HashMap<Uuid, f32>> {
        if candidate_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let sql = format!(
            "SELECT user_id, vector FROM embeddings WHERE user_id IN ({})",
            placeholders(candidate_ids.len())
        );
        let mut q = sqlx::query_as::<_, (String, Vec<u8>)>(&sql);
        for id in candidate_ids {
            q = q.bind(id.to_string());
        }

        let rows = q.fetch_all(&self.pool).await?;
        let mut scores = HashMap::with_capacity(rows.len());
        for (id, bytes) in rows {
            let vector = bytes_to_vector(&bytes)?;
            scores.insert(parse_uuid(&id)?, cosine_similarity(source, &vector)?);
        }

        Ok(scores)
    }
}

#[derive(sqlx::FromRow)]
struct EmbeddingRow {
    user_id: String,
    vector: Vec<u8>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<EmbeddingRow> for Embedding {
    type Error = DomainError;

    fn try_from(row: EmbeddingRow) -> Result<Self, Self::Error> {
        Ok(Embedding {
            user_id: parse_uuid(&row.user_id)?,
            vector: bytes_to_vector(&row.vector)?,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
        })
    }
}
