//! Profile writes and embedding status polling.
//!
//! Writing a profile never waits on, or fails because of, embedding
//! generation. Semantic changes enqueue a job and return.

use std::sync::Arc;
use tokio::sync::Notify;
use tracing::instrument;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    ConnectionType, EmbeddingJob, EmbeddingJobPayload, EmbeddingStatus, JobOptions, Profile,
    ProfileUpdate,
};
use crate::domain::ports::{JobQueue, MemberRepository, ProfileRepository};

pub struct ProfileService {
    members: Arc<dyn MemberRepository>,
    profiles: Arc<dyn ProfileRepository>,
    jobs: Arc<dyn JobQueue>,
    job_options: JobOptions,
    wake: Option<Arc<Notify>>,
}

impl ProfileService {
    pub fn new(
        members: Arc<dyn MemberRepository>,
        profiles: Arc<dyn ProfileRepository>,
        jobs: Arc<dyn JobQueue>,
        job_options: JobOptions,
    ) -> Self {
        Self {
            members,
            profiles,
            jobs,
            job_options,
            wake: None,
        }
    }

    /// Wake an idle worker pool whenever a job is enqueued.
    pub fn with_wake(mut self, wake: Arc<Notify>) -> Self {
        self.wake = Some(wake);
        self
    }

    /// Create the member's profile and enqueue its first embedding.
    #[instrument(skip(self, niche_interest, project, rabbit_hole))]
    pub async fn create_profile(
        &self,
        user_id: Uuid,
        niche_interest: String,
        project: String,
        rabbit_hole: Option<String>,
        connection_type: ConnectionType,
    ) -> DomainResult<Profile> {
        if self.members.get(user_id).await?.is_none() {
            return Err(DomainError::not_found("Member", user_id));
        }

        let mut profile = Profile::new(user_id, niche_interest, project, connection_type);
        if let Some(rabbit_hole) = rabbit_hole.filter(|r| !r.trim().is_empty()) {
            profile = profile.with_rabbit_hole(rabbit_hole);
        }

        self.profiles.create(&profile).await?;
        self.enqueue_embedding(&profile).await;
        Ok(profile)
    }

    /// Apply a partial update. Only changes to embedded text re-embed.
    #[instrument(skip(self, update))]
    pub async fn update_profile(&self, user_id: Uuid, update: ProfileUpdate) -> DomainResult<Profile> {
        let mut profile = self
            .profiles
            .get_by_user(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Profile", user_id))?;

        let semantic_change = profile.apply(update);
        self.profiles.update(&profile).await?;

        if semantic_change {
            self.enqueue_embedding(&profile).await;
        }
        Ok(profile)
    }

    pub async fn get_profile(&self, user_id: Uuid) -> DomainResult<Option<Profile>> {
        self.profiles.get_by_user(user_id).await
    }

    /// Status of the member's most recent embedding job, if any.
    pub async fn embedding_status(&self, user_id: Uuid) -> DomainResult<Option<EmbeddingStatus>> {
        Ok(self.latest_job(user_id).await?.map(|job| job.status.into()))
    }

    pub async fn latest_job(&self, user_id: Uuid) -> DomainResult<Option<EmbeddingJob>> {
        self.jobs.latest_for_user(user_id).await
    }

    async fn enqueue_embedding(&self, profile: &Profile) {
        let payload = EmbeddingJobPayload {
            user_id: profile.user_id,
            profile_id: profile.id,
        };

        match self.jobs.enqueue(payload, self.job_options).await {
            Ok(job) => {
                tracing::debug!(job_id = %job.id, user_id = %profile.user_id, "embedding job enqueued");
                if let Some(wake) = &self.wake {
                    wake.notify_one();
                }
            }
            Err(e) => {
                tracing::error!(user_id = %profile.user_id, error = %e, "failed to enqueue embedding job");
            }
        }
    }
}
