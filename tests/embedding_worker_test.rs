//! Embedding job lifecycle: retries, permanent failure, re-embedding and
//! pool draining.

mod common;

use common::{TestApp, DIMENSION};
use uuid::Uuid;

use kindred::adapters::embeddings::MockEmbedding;
use kindred::domain::models::{ConnectionType, EmbeddingStatus, JobStatus, ProfileUpdate};
use kindred::domain::ports::VectorStore;
use kindred::services::JobOutcome;

#[tokio::test]
async fn test_job_fails_permanently_after_max_attempts() {
    let app = TestApp::new().await;
    let member = app.add_member(Uuid::new_v4(), Uuid::new_v4(), "Ada", "acme.io").await;
    app.add_profile(&member, "Analog synths", "Modular patch library", None, ConnectionType::Friendship)
        .await;
    app.provider.fail_next(3, "provider down").await;

    let report = app.worker().process_next().await.unwrap().expect("a job was queued");
    assert_eq!(report.user_id, member.id);
    assert_eq!(report.outcome, JobOutcome::Failed);
    assert_eq!(app.provider.call_count(), 3);

    let job = app.profile_service().latest_job(member.id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.attempts, 3);
    assert!(job.last_error.unwrap_or_default().contains("provider down"));
    assert!(job.finished_at.is_some());

    assert!(app.vectors.get(member.id).await.unwrap().is_none());
    assert_eq!(
        app.profile_service().embedding_status(member.id).await.unwrap(),
        Some(EmbeddingStatus::Failed)
    );

    // Failed jobs are not picked up again.
    assert!(app.worker().process_next().await.unwrap().is_none());
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let app = TestApp::new().await;
    let member = app.add_member(Uuid::new_v4(), Uuid::new_v4(), "Ada", "acme.io").await;
    app.add_profile(&member, "Analog synths", "Modular patch library", None, ConnectionType::Friendship)
        .await;
    app.provider.fail_next(2, "rate limited").await;

    let report = app.worker().process_next().await.unwrap().unwrap();
    assert_eq!(report.outcome, JobOutcome::Completed);

    let job = app.profile_service().latest_job(member.id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.attempts, 3);

    let embedding = app.vectors.get(member.id).await.unwrap().expect("vector stored");
    assert_eq!(embedding.dimension(), DIMENSION);
}

#[tokio::test]
async fn test_wrong_dimension_counts_as_failure() {
    let app = TestApp::new().await;
    let member = app.add_member(Uuid::new_v4(), Uuid::new_v4(), "Ada", "acme.io").await;
    app.add_profile(&member, "Analog synths", "Modular patch library", None, ConnectionType::Friendship)
        .await;
    for _ in 0..3 {
        app.provider.push(MockEmbedding::Vector(vec![1.0, 0.0])).await;
    }

    let report = app.worker().process_next().await.unwrap().unwrap();
    assert_eq!(report.outcome, JobOutcome::Failed);
    let job = app.profile_service().latest_job(member.id).await.unwrap().unwrap();
    assert!(job.last_error.unwrap_or_default().contains("dimensions"));
}

#[tokio::test]
async fn test_only_semantic_updates_reembed() {
    let app = TestApp::new().await;
    let member = app.add_member(Uuid::new_v4(), Uuid::new_v4(), "Ada", "acme.io").await;
    app.add_profile(&member, "Analog synths", "Modular patch library", None, ConnectionType::Friendship)
        .await;
    app.embed_all().await;
    let first_job = app.profile_service().latest_job(member.id).await.unwrap().unwrap();

    let service = app.profile_service();
    service
        .update_profile(
            member.id,
            ProfileUpdate {
                connection_type: Some(ConnectionType::Mentorship),
                ..ProfileUpdate::default()
            },
        )
        .await
        .unwrap();
    let after_type_change = service.latest_job(member.id).await.unwrap().unwrap();
    assert_eq!(after_type_change.id, first_job.id);

    let updated = service
        .update_profile(
            member.id,
            ProfileUpdate {
                rabbit_hole: Some(Some("Wavetable synthesis".to_string())),
                ..ProfileUpdate::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.rabbit_hole.as_deref(), Some("Wavetable synthesis"));
    assert_eq!(updated.connection_type, ConnectionType::Mentorship);

    let requeued = service.latest_job(member.id).await.unwrap().unwrap();
    assert_ne!(requeued.id, first_job.id);
    assert_eq!(requeued.status, JobStatus::Waiting);
    assert_eq!(service.embedding_status(member.id).await.unwrap(), Some(EmbeddingStatus::Pending));
}

#[tokio::test]
async fn test_pool_drains_queue() {
    let app = TestApp::new().await;
    let tenant = Uuid::new_v4();
    let mut members = Vec::new();
    for i in 0..5 {
        let member = app
            .add_member(tenant, Uuid::new_v4(), &format!("Member{i}"), "acme.io")
            .await;
        app.add_profile(&member, "Home espresso", &format!("Roast log {i}"), None, ConnectionType::Networking)
            .await;
        members.push(member);
    }

    let report = app.worker_pool().drain().await.unwrap();
    assert_eq!(report.completed, 5);
    assert_eq!(report.failed, 0);

    let ids: Vec<Uuid> = members.iter().map(|m| m.id).collect();
    assert_eq!(app.vectors.existing(&ids).await.unwrap().len(), 5);
}

#[tokio::test]
async fn test_running_pool_picks_up_new_jobs() {
    let app = TestApp::new().await;
    let member = app.add_member(Uuid::new_v4(), Uuid::new_v4(), "Ada", "acme.io").await;

    let handle = app.worker_pool().spawn().await.unwrap();
    let service = app.profile_service().with_wake(handle.wake_handle());
    service
        .create_profile(
            member.id,
            "Letterpress printing".to_string(),
            "Wood type catalog".to_string(),
            None,
            ConnectionType::Collaboration,
        )
        .await
        .unwrap();

    let mut embedded = false;
    for _ in 0..200 {
        if app.vectors.get(member.id).await.unwrap().is_some() {
            embedded = true;
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    handle.shutdown().await;
    assert!(embedded, "worker pool never embedded the profile");
}
