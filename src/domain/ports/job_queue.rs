//! Embedding job queue port.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{EmbeddingJob, EmbeddingJobPayload, JobOptions};

/// Durable queue of embedding jobs.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Enqueue a job. No deduplication: every call creates a new job.
    async fn enqueue(
        &self,
        payload: EmbeddingJobPayload,
        options: JobOptions,
    ) -> DomainResult<EmbeddingJob>;

    /// Atomically claim the oldest waiting job, marking it active.
    async fn claim_next(&self) -> DomainResult<Option<EmbeddingJob>>;

    /// Persist the attempt counter and the error of the previous attempt.
    async fn record_attempt(
        &self,
        job_id: Uuid,
        attempts: u32,
        last_error: Option<&str>,
    ) -> DomainResult<()>;

    /// Mark a job completed.
    async fn complete(&self, job_id: Uuid) -> DomainResult<()>;

    /// Mark a job failed. Failed jobs are never picked up again.
    async fn fail(&self, job_id: Uuid, error: &str) -> DomainResult<()>;

    /// Get a job by ID.
    async fn get(&self, job_id: Uuid) -> DomainResult<Option<EmbeddingJob>>;

    /// The most recently enqueued job for a member.
    async fn latest_for_user(&self, user_id: Uuid) -> DomainResult<Option<EmbeddingJob>>;

    /// Return jobs left active by a stopped process to the waiting state.
    async fn recover_interrupted(&self) -> DomainResult<u64>;
}
