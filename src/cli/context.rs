//! Wiring shared by CLI commands: one pool, one set of adapters.

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::adapters::embeddings::provider_from_config;
use crate::adapters::notifications::LogNotifier;
use crate::adapters::sqlite::{
    initialize_database, SqliteJobQueue, SqliteMatchRepository, SqliteMemberRepository,
    SqliteProfileRepository, SqliteVectorStore,
};
use crate::domain::models::Config;
use crate::services::{
    EmbeddingWorker, EmbeddingWorkerPool, IntroOrchestrator, MatchingService, ProfileService,
};

pub struct AppContext {
    pub config: Config,
    pub members: Arc<SqliteMemberRepository>,
    pub profiles: Arc<SqliteProfileRepository>,
    pub vectors: Arc<SqliteVectorStore>,
    pub jobs: Arc<SqliteJobQueue>,
    pub matches: Arc<SqliteMatchRepository>,
}

impl AppContext {
    pub async fn open(config: Config) -> Result<Self> {
        let pool = initialize_database(&config.database)
            .await
            .with_context(|| format!("Failed to open database at {}. Run 'kindred init' first.", config.database.path))?;

        Ok(Self {
            members: Arc::new(SqliteMemberRepository::new(pool.clone())),
            profiles: Arc::new(SqliteProfileRepository::new(pool.clone())),
            vectors: Arc::new(SqliteVectorStore::new(pool.clone())),
            jobs: Arc::new(SqliteJobQueue::new(pool.clone())),
            matches: Arc::new(SqliteMatchRepository::new(pool)),
            config,
        })
    }

    pub fn profile_service(&self) -> ProfileService {
        ProfileService::new(
            self.members.clone(),
            self.profiles.clone(),
            self.jobs.clone(),
            self.config.jobs.job_options(),
        )
    }

    pub fn matching_service(&self) -> MatchingService {
        MatchingService::new(
            self.members.clone(),
            self.profiles.clone(),
            self.vectors.clone(),
            self.matches.clone(),
            &self.config.matching,
        )
    }

    pub fn orchestrator(&self) -> IntroOrchestrator {
        IntroOrchestrator::new(
            self.members.clone(),
            self.matches.clone(),
            Arc::new(LogNotifier::new()),
            self.config.matching.match_ttl(),
        )
    }

    pub fn worker_pool(&self) -> Result<EmbeddingWorkerPool> {
        let provider = provider_from_config(&self.config.embedding).context("Failed to build embedding provider")?;
        let worker = EmbeddingWorker::new(self.jobs.clone(), self.profiles.clone(), provider, self.vectors.clone());
        Ok(EmbeddingWorkerPool::new(Arc::new(worker), &self.config.jobs))
    }
}
