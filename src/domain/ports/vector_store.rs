//! Vector store port.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::Embedding;

/// Persistence for one embedding per member plus a similarity primitive.
///
/// Implementations score with `domain::models::cosine_similarity` so that
/// every backend agrees on the numbers.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or replace the member's vector. Last write wins.
    async fn upsert(&self, user_id: Uuid, vector: &[f32]) -> DomainResult<Embedding>;

    /// Get the stored embedding for a member.
    async fn get(&self, user_id: Uuid) -> DomainResult<Option<Embedding>>;

    /// The subset of `user_ids` that have a stored embedding.
    async fn existing(&self, user_ids: &[Uuid]) -> DomainResult<HashSet<Uuid>>;

    /// Cosine similarity of `source` against each candidate's stored vector.
    ///
    /// Candidates without a stored vector are absent from the result. The
    /// map carries no ordering.
    async fn similarity(
        &self,
        source: &[f32],
        candidate_ids: &[Uuid],
    ) -> DomainResult<HashMap<Uuid, f32>>;
}
