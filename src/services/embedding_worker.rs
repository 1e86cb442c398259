//! Embedding worker and worker pool.
//!
//! A worker claims one job at a time, embeds the profile text and upserts
//! the vector. Provider failures are retried in-process with exponential
//! backoff; once attempts run out the job is marked failed for good.
//! Errors never leave the worker: pollers see them through job status.

use backoff::backoff::Backoff;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::task::JoinSet;
use tracing::instrument;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{EmbeddingJob, JobsConfig};
use crate::domain::ports::{EmbeddingProvider, JobQueue, ProfileRepository, VectorStore};

/// Delay schedule between attempts: `base`, `2 * base`, `4 * base`, ...
pub fn retry_schedule(base: Duration) -> ExponentialBackoff {
    ExponentialBackoffBuilder::new()
        .with_initial_interval(base)
        .with_randomization_factor(0.0)
        .with_multiplier(2.0)
        .with_max_interval(Duration::from_secs(3600))
        .with_max_elapsed_time(None)
        .build()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobReport {
    pub job_id: Uuid,
    pub user_id: Uuid,
    pub outcome: JobOutcome,
}

pub struct EmbeddingWorker {
    jobs: Arc<dyn JobQueue>,
    profiles: Arc<dyn ProfileRepository>,
    provider: Arc<dyn EmbeddingProvider>,
    vectors: Arc<dyn VectorStore>,
}

impl EmbeddingWorker {
    pub fn new(
        jobs: Arc<dyn JobQueue>,
        profiles: Arc<dyn ProfileRepository>,
        provider: Arc<dyn EmbeddingProvider>,
        vectors: Arc<dyn VectorStore>,
    ) -> Self {
        Self {
            jobs,
            profiles,
            provider,
            vectors,
        }
    }

    /// Claim and process the oldest waiting job. `None` when the queue is empty.
    pub async fn process_next(&self) -> DomainResult<Option<JobReport>> {
        let Some(job) = self.jobs.claim_next().await? else {
            return Ok(None);
        };

        let (job_id, user_id) = (job.id, job.user_id);
        let outcome = match self.process(job).await {
            Ok(outcome) => outcome,
            Err(e) => {
                // A claimed job must not stay active until the next restart.
                if let Err(fail_err) = self.jobs.fail(job_id, &e.to_string()).await {
                    tracing::error!(job_id = %job_id, error = %fail_err, "could not mark interrupted job failed");
                }
                return Err(e);
            }
        };
        Ok(Some(JobReport {
            job_id,
            user_id,
            outcome,
        }))
    }

    /// Run a claimed job to a terminal state.
    #[instrument(skip(self, job), fields(job_id = %job.id, user_id = %job.user_id))]
    pub async fn process(&self, job: EmbeddingJob) -> DomainResult<JobOutcome> {
        let profile = match self.profiles.get(job.profile_id).await? {
            Some(profile) if profile.user_id == job.user_id => profile,
            _ => {
                let err = DomainError::not_found("Profile", job.profile_id);
                tracing::warn!(error = %err, "embedding job has no usable profile");
                self.jobs.fail(job.id, &err.to_string()).await?;
                return Ok(JobOutcome::Failed);
            }
        };

        let text = profile.semantic_text();
        let mut schedule = retry_schedule(job.backoff_base());
        let mut attempts = job.attempts;
        let mut last_error = job.last_error.clone().unwrap_or_default();

        while attempts < job.max_attempts {
            attempts += 1;
            self.jobs.record_attempt(job.id, attempts, None).await?;

            match self.attempt(job.user_id, &text).await {
                Ok(()) => {
                    self.jobs.complete(job.id).await?;
                    tracing::info!(attempts, "embedding stored");
                    return Ok(JobOutcome::Completed);
                }
                Err(e) => {
                    last_error = e.to_string();
                    self.jobs.record_attempt(job.id, attempts, Some(&last_error)).await?;

                    if attempts < job.max_attempts {
                        let delay = schedule.next_backoff().unwrap_or_else(|| job.backoff_base());
                        tracing::warn!(attempt = attempts, delay_ms = delay.as_millis() as u64, error = %e, "embedding attempt failed, retrying");
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        let exhausted = DomainError::JobExhausted {
            job_id: job.id,
            attempts,
            last_error: last_error.clone(),
        };
        tracing::error!(error = %exhausted, "embedding job failed");
        self.jobs.fail(job.id, &last_error).await?;
        Ok(JobOutcome::Failed)
    }

    async fn attempt(&self, user_id: Uuid, text: &str) -> DomainResult<()> {
        let vector = self.provider.embed(text).await?;

        let expected = self.provider.dimension();
        if vector.is_empty() || vector.len() != expected {
            return Err(DomainError::InvalidVectorFormat(format!(
                "provider {} returned {} dimensions, expected {}",
                self.provider.name(),
                vector.len(),
                expected
            )));
        }

        self.vectors.upsert(user_id, &vector).await?;
        Ok(())
    }
}

/// Totals from a drain run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub completed: usize,
    pub failed: usize,
}

impl DrainReport {
    fn record(&mut self, outcome: JobOutcome) {
        match outcome {
            JobOutcome::Completed => self.completed += 1,
            JobOutcome::Failed => self.failed += 1,
        }
    }
}

/// N concurrent workers sharing one queue.
pub struct EmbeddingWorkerPool {
    worker: Arc<EmbeddingWorker>,
    workers: usize,
    poll_interval: Duration,
    wake: Arc<Notify>,
}

impl EmbeddingWorkerPool {
    pub fn new(worker: Arc<EmbeddingWorker>, config: &JobsConfig) -> Self {
        Self {
            worker,
            workers: config.workers.max(1),
            poll_interval: config.poll_interval(),
            wake: Arc::new(Notify::new()),
        }
    }

    /// Handle the enqueue side signals to wake idle workers.
    pub fn wake_handle(&self) -> Arc<Notify> {
        self.wake.clone()
    }

    /// Process jobs until the queue is empty, then return.
    pub async fn drain(&self) -> DomainResult<DrainReport> {
        self.recover().await?;

        let mut set = JoinSet::new();
        for worker_index in 0..self.workers {
            let worker = self.worker.clone();
            set.spawn(async move {
                let mut report = DrainReport::default();
                loop {
                    match worker.process_next().await {
                        Ok(Some(job)) => report.record(job.outcome),
                        Ok(None) => break,
                        Err(e) => {
                            tracing::error!(worker = worker_index, error = %e, "worker stopped on queue error");
                            break;
                        }
                    }
                }
                report
            });
        }

        let mut total = DrainReport::default();
        while let Some(joined) = set.join_next().await {
            let report = joined.map_err(|e| DomainError::DatabaseError(format!("worker task panicked: {e}")))?;
            total.completed += report.completed;
            total.failed += report.failed;
        }

        tracing::info!(completed = total.completed, failed = total.failed, "embedding queue drained");
        Ok(total)
    }

    /// Run workers in the background until the handle is shut down.
    pub async fn spawn(self) -> DomainResult<WorkerPoolHandle> {
        self.recover().await?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut set = JoinSet::new();

        for worker_index in 0..self.workers {
            let worker = self.worker.clone();
            let wake = self.wake.clone();
            let poll_interval = self.poll_interval;
            let mut shutdown = shutdown_rx.clone();

            set.spawn(async move {
                tracing::debug!(worker = worker_index, "embedding worker started");
                while !*shutdown.borrow() {
                    match worker.process_next().await {
                        Ok(Some(_)) => continue,
                        Ok(None) => {}
                        Err(e) => tracing::error!(worker = worker_index, error = %e, "failed to process embedding job"),
                    }

                    tokio::select! {
                        _ = shutdown.changed() => {}
                        _ = wake.notified() => {}
                        _ = tokio::time::sleep(poll_interval) => {}
                    }
                }
                tracing::debug!(worker = worker_index, "embedding worker stopped");
            });
        }

        Ok(WorkerPoolHandle {
            shutdown: shutdown_tx,
            tasks: set,
            wake: self.wake,
        })
    }

    async fn recover(&self) -> DomainResult<()> {
        let recovered = self.worker.jobs.recover_interrupted().await?;
        if recovered > 0 {
            tracing::warn!(recovered, "requeued embedding jobs interrupted by a previous run");
        }
        Ok(())
    }
}

/// Control handle for a running pool.
pub struct WorkerPoolHandle {
    shutdown: watch::Sender<bool>,
    tasks: JoinSet<()>,
    wake: Arc<Notify>,
}

impl WorkerPoolHandle {
    pub fn wake_handle(&self) -> Arc<Notify> {
        self.wake.clone()
    }

    /// Stop after in-flight jobs finish.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown.send(true);
        while self.tasks.join_next().await.is_some() {}
    }
}
