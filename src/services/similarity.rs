//! Similarity strategy.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::ports::VectorStore;

/// Scores candidates against a source vector. The result is unordered.
#[async_trait]
pub trait SimilarityStrategy: Send + Sync {
    async fn score(&self, source: &[f32], candidate_ids: &[Uuid]) -> DomainResult<HashMap<Uuid, f32>>;
}

/// Cosine similarity through the vector store, clamped into `[0, 1]`.
pub struct CosineSimilarity {
    vectors: Arc<dyn VectorStore>,
}

impl CosineSimilarity {
    pub fn new(vectors: Arc<dyn VectorStore>) -> Self {
        Self { vectors }
    }
}

/// Clamp a raw cosine score into `[0, 1]`. NaN scores 0.
pub fn clamp_score(score: f32) -> f32 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}

#[async_trait]
impl SimilarityStrategy for CosineSimilarity {
    async fn score(&self, source: &[f32], candidate_ids: &[Uuid]) -> DomainResult<HashMap<Uuid, f32>> {
        let raw = self.vectors.similarity(source, candidate_ids).await?;
        Ok(raw.into_iter().map(|(id, s)| (id, clamp_score(s))).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryVectorStore;

    #[test]
    fn test_clamp_score() {
        assert_eq!(clamp_score(-0.4), 0.0);
        assert_eq!(clamp_score(1.000_001), 1.0);
        assert_eq!(clamp_score(f32::NAN), 0.0);
        assert_eq!(clamp_score(0.42), 0.42);
    }

    #[tokio::test]
    async fn test_opposite_vectors_score_zero() {
        let store = Arc::new(InMemoryVectorStore::new());
        let same = Uuid::new_v4();
        let opposite = Uuid::new_v4();
        store.upsert(same, &[1.0, 2.0]).await.unwrap();
        store.upsert(opposite, &[-1.0, -2.0]).await.unwrap();

        let scores = CosineSimilarity::new(store)
            .score(&[1.0, 2.0], &[same, opposite])
            .await
            .unwrap();
        assert!((scores[&same] - 1.0).abs() < 1e-6);
        assert_eq!(scores[&opposite], 0.0);
    }
}
