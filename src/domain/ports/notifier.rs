//! Introduction notification port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{ContactCard, Member};

/// Ranking context attached to an introduction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntroContext {
    pub match_id: Uuid,
    pub intro_id: Uuid,
    pub final_score: f32,
    pub reasons: Vec<String>,
}

/// Delivers mutual-match introductions. Content and transport are the
/// implementation's concern.
#[async_trait]
pub trait IntroNotifier: Send + Sync {
    async fn notify_mutual_intro(
        &self,
        recipient: &Member,
        other_party: &ContactCard,
        shared_interest: &str,
        context: &IntroContext,
    ) -> DomainResult<()>;
}
