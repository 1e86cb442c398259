//! Notifier that keeps every delivery in memory.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ContactCard, Member};
use crate::domain::ports::{IntroContext, IntroNotifier};

/// One delivered notification.
#[derive(Debug, Clone, PartialEq)]
pub struct SentIntro {
    pub recipient_id: Uuid,
    pub other_party: ContactCard,
    pub shared_interest: String,
    pub context: IntroContext,
}

#[derive(Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<RwLock<Vec<SentIntro>>>,
    failing: Arc<AtomicBool>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every delivery fail until reset.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn sent(&self) -> Vec<SentIntro> {
        self.sent.read().await.clone()
    }

    pub async fn sent_to(&self, recipient_id: Uuid) -> Vec<SentIntro> {
        self.sent
            .read()
            .await
            .iter()
            .filter(|s| s.recipient_id == recipient_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl IntroNotifier for RecordingNotifier {
    async fn notify_mutual_intro(
        &self,
        recipient: &Member,
        other_party: &ContactCard,
        shared_interest: &str,
        context: &IntroContext,
    ) -> DomainResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DomainError::ProviderFailed("notification delivery failed".to_string()));
        }

        self.sent.write().await.push(SentIntro {
            recipient_id: recipient.id,
            other_party: other_party.clone(),
            shared_interest: shared_interest.to_string(),
            context: context.clone(),
        });
        Ok(())
    }
}
