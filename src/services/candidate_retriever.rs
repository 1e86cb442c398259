//! Candidate retrieval for a match request.

use std::sync::Arc;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::Member;
use crate::domain::ports::{MemberRepository, VectorStore};
use crate::services::filters::FilterChain;

/// Default upper bound on candidates scored per request.
pub const DEFAULT_CANDIDATE_CAP: usize = 100;

/// The source member, their vector, and who may be scored against them.
#[derive(Debug, Clone)]
pub struct CandidatePool {
    pub source: Member,
    pub source_vector: Vec<f32>,
    /// Active members of the source's tenant with an embedding that passed
    /// the filter chain, never the source. At most `cap` long.
    pub candidate_ids: Vec<Uuid>,
}

pub struct CandidateRetriever {
    members: Arc<dyn MemberRepository>,
    vectors: Arc<dyn VectorStore>,
    cap: usize,
}

impl CandidateRetriever {
    pub fn new(members: Arc<dyn MemberRepository>, vectors: Arc<dyn VectorStore>, cap: usize) -> Self {
        Self {
            members,
            vectors,
            cap: cap.max(1),
        }
    }

    /// Collect the source's candidates, run them through `filters`, then cap.
    ///
    /// The cap applies to survivors, so members the source already acted on
    /// never crowd out the ones they have not seen yet.
    pub async fn retrieve(&self, source_id: Uuid, filters: &FilterChain) -> DomainResult<CandidatePool> {
        let source = self
            .members
            .get(source_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Member", source_id))?;

        let source_vector = self
            .vectors
            .get(source_id)
            .await?
            .ok_or(DomainError::NoEmbedding(source_id))?
            .vector;

        let others: Vec<Uuid> = self
            .members
            .list_active_in_tenant(source.tenant_id)
            .await?
            .into_iter()
            .map(|m| m.id)
            .filter(|id| *id != source_id)
            .collect();

        let embedded = self.vectors.existing(&others).await?;
        let with_vectors: Vec<Uuid> = others.into_iter().filter(|id| embedded.contains(id)).collect();
        let considered = with_vectors.len();

        let mut candidate_ids = filters.apply(&source, with_vectors).await?;
        candidate_ids.truncate(self.cap);

        tracing::debug!(
            source = %source_id,
            considered,
            candidates = candidate_ids.len(),
            "retrieved candidates"
        );
        Ok(CandidatePool {
            source,
            source_vector,
            candidate_ids,
        })
    }
}
