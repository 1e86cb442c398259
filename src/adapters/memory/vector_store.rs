//! In-memory vector store.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{cosine_similarity, Embedding};
use crate::domain::ports::VectorStore;

/// A `VectorStore` held in a map. Used by tests, benches and as a reference
/// for other backends.
#[derive(Clone, Default)]
pub struct InMemoryVectorStore {
    embeddings: Arc<RwLock<HashMap<Uuid, Embedding>>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.embeddings.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.embeddings.read().await.is_empty()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn upsert(&self, user_id: Uuid, vector: &[f32]) -> DomainResult<Embedding> {
        if vector.is_empty() {
            return Err(DomainError::InvalidVectorFormat("empty vector".to_string()));
        }

        let mut embeddings = self.embeddings.write().await;
        let embedding = match embeddings.get(&user_id) {
            Some(existing) => Embedding {
                vector: vector.to_vec(),
                updated_at: Utc::now(),
                ..existing.clone()
            },
            None => Embedding::new(user_id, vector.to_vec()),
        };
        embeddings.insert(user_id, embedding.clone());
        Ok(embedding)
    }

    async fn get(&self, user_id: Uuid) -> DomainResult<Option<Embedding>> {
        Ok(self.embeddings.read().await.get(&user_id).cloned())
    }

    async fn existing(&self, user_ids: &[Uuid]) -> DomainResult<HashSet<Uuid>> {
        let embeddings = self.embeddings.read().await;
        Ok(user_ids
            .iter()
            .filter(|id| embeddings.contains_key(id))
            .copied()
            .collect())
    }

    async fn similarity(
        &self,
        source: &[f32],
        candidate_ids: &[Uuid],
    ) -> DomainResult<HashMap<Uuid, f32>> {
        let embeddings = self.embeddings.read().await;
        let mut scores = HashMap::with_capacity(candidate_ids.len());
        for id in candidate_ids {
            if let Some(embedding) = embeddings.get(id) {
                scores.insert(*id, cosine_similarity(source, &embedding.vector)?);
            }
        }
        Ok(scores)
    }
}
