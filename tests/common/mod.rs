//! Common test utilities for integration tests
//!
//! Wires every service against one in-memory SQLite database, a mock
//! embedding provider and a recording notifier.

use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use kindred::adapters::embeddings::MockEmbeddingProvider;
use kindred::adapters::notifications::RecordingNotifier;
use kindred::adapters::sqlite::{
    create_migrated_test_pool, SqliteJobQueue, SqliteMatchRepository, SqliteMemberRepository,
    SqliteProfileRepository, SqliteVectorStore,
};
use kindred::domain::models::{
    ConnectionType, JobOptions, JobsConfig, MatchingConfig, Member, Profile,
};
use kindred::domain::ports::MemberRepository;
use kindred::services::{
    EmbeddingWorker, EmbeddingWorkerPool, IntroOrchestrator, MatchingService, ProfileService,
};

pub const DIMENSION: usize = 64;

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
/// Call this at the beginning of tests that need logging.
#[allow(dead_code)]
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

#[allow(dead_code)]
pub struct TestApp {
    pub members: Arc<SqliteMemberRepository>,
    pub profiles: Arc<SqliteProfileRepository>,
    pub vectors: Arc<SqliteVectorStore>,
    pub jobs: Arc<SqliteJobQueue>,
    pub matches: Arc<SqliteMatchRepository>,
    pub provider: Arc<MockEmbeddingProvider>,
    pub notifier: Arc<RecordingNotifier>,
    pub jobs_config: JobsConfig,
    pub matching_config: MatchingConfig,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn new() -> Self {
        let pool = create_migrated_test_pool()
            .await
            .expect("failed to create test database");

        Self {
            members: Arc::new(SqliteMemberRepository::new(pool.clone())),
            profiles: Arc::new(SqliteProfileRepository::new(pool.clone())),
            vectors: Arc::new(SqliteVectorStore::new(pool.clone())),
            jobs: Arc::new(SqliteJobQueue::new(pool.clone())),
            matches: Arc::new(SqliteMatchRepository::new(pool)),
            provider: Arc::new(MockEmbeddingProvider::new(DIMENSION)),
            notifier: Arc::new(RecordingNotifier::new()),
            jobs_config: JobsConfig {
                max_attempts: 3,
                backoff_base_ms: 1,
                workers: 2,
                poll_interval_ms: 10,
            },
            matching_config: MatchingConfig::default(),
        }
    }

    pub fn job_options(&self) -> JobOptions {
        JobOptions {
            max_attempts: self.jobs_config.max_attempts,
            backoff_base: Duration::from_millis(self.jobs_config.backoff_base_ms),
        }
    }

    pub fn profile_service(&self) -> ProfileService {
        ProfileService::new(
            self.members.clone(),
            self.profiles.clone(),
            self.jobs.clone(),
            self.job_options(),
        )
    }

    pub fn worker(&self) -> EmbeddingWorker {
        EmbeddingWorker::new(
            self.jobs.clone(),
            self.profiles.clone(),
            self.provider.clone(),
            self.vectors.clone(),
        )
    }

    pub fn worker_pool(&self) -> EmbeddingWorkerPool {
        EmbeddingWorkerPool::new(Arc::new(self.worker()), &self.jobs_config)
    }

    pub fn matching(&self) -> MatchingService {
        MatchingService::new(
            self.members.clone(),
            self.profiles.clone(),
            self.vectors.clone(),
            self.matches.clone(),
            &self.matching_config,
        )
    }

    pub fn orchestrator(&self) -> IntroOrchestrator {
        self.orchestrator_with_ttl(self.matching_config.match_ttl())
    }

    pub fn orchestrator_with_ttl(&self, ttl: chrono::Duration) -> IntroOrchestrator {
        IntroOrchestrator::new(self.members.clone(), self.matches.clone(), self.notifier.clone(), ttl)
    }

    pub async fn add_member(&self, tenant_id: Uuid, organization_id: Uuid, name: &str, domain: &str) -> Member {
        let member = Member::new(
            tenant_id,
            organization_id,
            domain,
            name,
            format!("{}@{domain}", name.to_lowercase()),
        );
        self.members.create(&member).await.expect("failed to create member");
        member
    }

    pub async fn add_profile(
        &self,
        member: &Member,
        interest: &str,
        project: &str,
        rabbit_hole: Option<&str>,
        connection_type: ConnectionType,
    ) -> Profile {
        self.profile_service()
            .create_profile(
                member.id,
                interest.to_string(),
                project.to_string(),
                rabbit_hole.map(ToString::to_string),
                connection_type,
            )
            .await
            .expect("failed to create profile")
    }

    /// Run queued embedding jobs one at a time until the queue is empty.
    pub async fn embed_all(&self) -> usize {
        let worker = self.worker();
        let mut processed = 0;
        while worker
            .process_next()
            .await
            .expect("queue error")
            .is_some()
        {
            processed += 1;
        }
        processed
    }
}
