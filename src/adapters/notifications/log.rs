//! Notifier that emits a structured tracing event per introduction.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{ContactCard, Member};
use crate::domain::ports::{IntroContext, IntroNotifier};

#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl IntroNotifier for LogNotifier {
    async fn notify_mutual_intro(
        &self,
        recipient: &Member,
        other_party: &ContactCard,
        shared_interest: &str,
        context: &IntroContext,
    ) -> DomainResult<()> {
        tracing::info!(
            target: "kindred::intro",
            recipient_id = %recipient.id,
            recipient_email = %recipient.email,
            other_party_id = %other_party.user_id,
            other_party_name = %other_party.display_name,
            other_party_email = %other_party.email,
            shared_interest,
            match_id = %context.match_id,
            intro_id = %context.intro_id,
            final_score = context.final_score,
            "mutual introduction"
        );
        Ok(())
    }
}
