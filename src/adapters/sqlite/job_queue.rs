//! SQLite-backed embedding job queue.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{format_datetime, parse_datetime, parse_optional_datetime, parse_uuid};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{EmbeddingJob, EmbeddingJobPayload, JobOptions, JobStatus};
use crate::domain::ports::JobQueue;

const JOB_COLUMNS: &str = "id, user_id, profile_id, status, attempts, max_attempts, backoff_base_ms, \
     last_error, created_at, updated_at, started_at, finished_at";

#[derive(Clone)]
pub struct SqliteJobQueue {
    pool: SqlitePool,
}

impl SqliteJobQueue {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn set_terminal(&self, job_id: Uuid, status: JobStatus, error: Option<&str>) -> DomainResult<()> {
        let now = format_datetime(Utc::now());
        let result = sqlx::query(
            r#"UPDATE embedding_jobs
               SET status = ?, last_error = COALESCE(?, last_error), updated_at = ?, finished_at = ?
               WHERE id = ?"#,
        )
        .bind(status.as_str())
        .bind(error)
        .bind(&now)
        .bind(&now)
        .bind(job_id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("EmbeddingJob", job_id));
        }
        Ok(())
    }
}

#[async_trait]
impl JobQueue for SqliteJobQueue {
    async fn enqueue(
        &self,
        payload: EmbeddingJobPayload,
        options: JobOptions,
    ) -> DomainResult<EmbeddingJob> {
        let job = EmbeddingJob::new(payload, options);

        sqlx::query(
            r#"INSERT INTO embedding_jobs (id, user_id, profile_id, status, attempts, max_attempts, backoff_base_ms, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(job.id.to_string())
        .bind(job.user_id.to_string())
        .bind(job.profile_id.to_string())
        .bind(job.status.as_str())
        .bind(i64::from(job.attempts))
        .bind(i64::from(job.max_attempts))
        .bind(i64::try_from(job.backoff_base_ms).unwrap_or(i64::MAX))
        .bind(format_datetime(job.created_at))
        .bind(format_datetime(job.updated_at))
        .execute(&self.pool)
        .await?;

        Ok(job)
    }

    async fn claim_next(&self) -> DomainResult<Option<EmbeddingJob>> {
        let now = format_datetime(Utc::now());
        let row: Option<JobRow> = sqlx::query_as(&format!(
            r#"UPDATE embedding_jobs
               SET status = 'active', started_at = ?, updated_at = ?
               WHERE id = (
                   SELECT id FROM embedding_jobs
                   WHERE status = 'waiting'
                   ORDER BY created_at, rowid
                   LIMIT 1
               ) AND status = 'waiting'
               RETURNING {JOB_COLUMNS}"#
        ))
        .bind(&now)
        .bind(&now)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.try_into()).transpose()
    }

    async fn record_attempt(
        &self,
        job_id: Uuid,
        attempts: u32,
        last_error: Option<&str>,
    ) -> DomainResult<()> {
        let result = sqlx::query(
            r#"UPDATE embedding_jobs
               SET attempts = ?, last_error = COALESCE(?, last_error), updated_at = ?
               WHERE id = ?"#,
        )
        .bind(i64::from(attempts))
        .bind(last_error)
        .bind(format_datetime(Utc::now()))
        .bind(job_id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("EmbeddingJob", job_id));
        }
        Ok(())
    }

    async fn complete(&self, job_id: Uuid) -> DomainResult<()> {
        self.set_terminal(job_id, JobStatus::Completed, None).await
    }

    async fn fail(&self, job_id: Uuid, error: &str) -> DomainResult<()> {
        self.set_terminal(job_id, JobStatus::Failed, Some(error)).await
    }

    async fn get(&self, job_id: Uuid) -> DomainResult<Option<EmbeddingJob>> {
        let row: Option<JobRow> =
            sqlx::query_as(&format!("SELECT {JOB_COLUMNS} FROM embedding_jobs WHERE id = ?"))
                .bind(job_id.to_string())
                .fetch_optional(&self.pool)
                .await?;

        row.map(|r| r.try_into()).transpose()
    }

    async fn latest_for_user(&self, user_id: Uuid) -> DomainResult<Option<EmbeddingJob>> {
        let row: Option<JobRow> = sqlx::query_as(&format!(
            "SELECT {JOB_COLUMNS} FROM embedding_jobs WHERE user_id = ? ORDER BY created_at DESC, rowid DESC LIMIT 1"
        ))
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.try_into()).transpose()
    }

    async fn recover_interrupted(&self) -> DomainResult<u64> {
        let result = sqlx::query(
            "UPDATE embedding_jobs SET status = 'waiting', started_at = NULL, updated_at = ? WHERE status = 'active'",
        )
        .bind(format_datetime(Utc::now()))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[derive(sqlx::FromRow)]
struct JobRow {
    id: String,
    user_id: String,
    profile_id: String,
    status: String,
    attempts: i64,
    max_attempts: i64,
    backoff_base_ms: i64,
    last_error: Option<String>,
    created_at: String,
    updated_at: String,
    started_at: Option<String>,
    finished_at: Option<String>,
}

impl TryFrom<JobRow> for EmbeddingJob {
    type Error = DomainError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        let status = JobStatus::from_str(&row.status)
            .ok_or_else(|| DomainError::SerializationError(format!("Invalid job status: {}", row.status)))?;
        let to_u32 = |v: i64| {
            u32::try_from(v).map_err(|e| DomainError::SerializationError(e.to_string()))
        };

        Ok(EmbeddingJob {
            id: parse_uuid(&row.id)?,
            user_id: parse_uuid(&row.user_id)?,
            profile_id: parse_uuid(&row.profile_id)?,
            status,
            attempts: to_u32(row.attempts)?,
            max_attempts: to_u32(row.max_attempts)?,
            backoff_base_ms: u64::try_from(row.backoff_base_ms)
                .map_err(|e| DomainError::SerializationError(e.to_string()))?,
            last_error: row.last_error,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
            started_at: parse_optional_datetime(row.started_at)?,
            finished_at: parse_optional_datetime(row.finished_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;

    async fn setup_queue() -> SqliteJobQueue {
        SqliteJobQueue::new(create_migrated_test_pool().await.unwrap())
    }

    fn payload(user_id: Uuid) -> EmbeddingJobPayload {
        EmbeddingJobPayload {
            user_id,
            profile_id: Uuid::new_v4(),
        }
    }

    #[tokio::test]
    async fn test_claim_is_fifo_and_exclusive() {
        let queue = setup_queue().await;
        let first = queue.enqueue(payload(Uuid::new_v4()), JobOptions::default()).await.unwrap();
        let second = queue.enqueue(payload(Uuid::new_v4()), JobOptions::default()).await.unwrap();

        let claimed = queue.claim_next().await.unwrap().unwrap();
        assert_eq!(claimed.id, first.id);
        assert_eq!(claimed.status, JobStatus::Active);
        assert!(claimed.started_at.is_some());

        let claimed = queue.claim_next().await.unwrap().unwrap();
        assert_eq!(claimed.id, second.id);
        assert!(queue.claim_next().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_no_deduplication_per_user() {
        let queue = setup_queue().await;
        let user = Uuid::new_v4();
        queue.enqueue(payload(user), JobOptions::default()).await.unwrap();
        let latest = queue.enqueue(payload(user), JobOptions::default()).await.unwrap();

        assert_eq!(queue.latest_for_user(user).await.unwrap().unwrap().id, latest.id);
        assert!(queue.claim_next().await.unwrap().is_some());
        assert!(queue.claim_next().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_failed_job_is_never_reclaimed() {
        let queue = setup_queue().await;
        let job = queue.enqueue(payload(Uuid::new_v4()), JobOptions::default()).await.unwrap();
        queue.claim_next().await.unwrap();
        queue.record_attempt(job.id, 3, Some("boom")).await.unwrap();
        queue.fail(job.id, "boom").await.unwrap();

        let stored = queue.get(job.id).await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Failed);
        assert_eq!(stored.attempts, 3);
        assert_eq!(stored.last_error.as_deref(), Some("boom"));
        assert!(stored.finished_at.is_some());

        assert_eq!(queue.recover_interrupted().await.unwrap(), 0);
        assert!(queue.claim_next().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_recover_interrupted_requeues_active() {
        let queue = setup_queue().await;
        let job = queue.enqueue(payload(Uuid::new_v4()), JobOptions::default()).await.unwrap();
        queue.claim_next().await.unwrap();

        assert_eq!(queue.recover_interrupted().await.unwrap(), 1);
        let reclaimed = queue.claim_next().await.unwrap().unwrap();
        assert_eq!(reclaimed.id, job.id);
    }

    #[tokio::test]
    async fn test_unknown_job() {
        let queue = setup_queue().await;
        assert!(matches!(
            queue.complete(Uuid::new_v4()).await,
            Err(DomainError::NotFound { .. })
        ));
    }
}
