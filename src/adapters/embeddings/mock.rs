//! Deterministic embedding provider for tests and offline runs.
//!
//! Texts are embedded as a hashed bag of words: each lowercase token
//! lands in a fixed bucket and the vector is L2-normalized. Identical text
//! gives identical vectors, and shared words raise cosine similarity.
//! Failures can be scripted ahead of calls.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::EmbeddingProvider;

/// A scripted outcome for one `embed` call.
#[derive(Debug, Clone)]
pub enum MockEmbedding {
    /// Return this exact vector.
    Vector(Vec<f32>),
    /// Fail the call with this message.
    Failure(String),
}

impl MockEmbedding {
    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure(error.into())
    }
}

/// Mock embedding provider.
pub struct MockEmbeddingProvider {
    dimension: usize,
    scripted: Arc<RwLock<VecDeque<MockEmbedding>>>,
    calls: Arc<AtomicUsize>,
}

impl MockEmbeddingProvider {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
            scripted: Arc::new(RwLock::new(VecDeque::new())),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Queue an outcome; queued outcomes are consumed before hashing applies.
    pub async fn push(&self, outcome: MockEmbedding) {
        self.scripted.write().await.push_back(outcome);
    }

    /// Fail the next `n` calls.
    pub async fn fail_next(&self, n: usize, error: &str) {
        let mut scripted = self.scripted.write().await;
        for _ in 0..n {
            scripted.push_back(MockEmbedding::failure(error));
        }
    }

    /// Number of `embed` calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The vector `embed` returns for `text` when nothing is scripted.
    pub fn hashed_vector(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        for token in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let bucket = (fnv1a(token.as_bytes()) % self.dimension as u64) as usize;
            vector[bucket] += 1.0;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0xcbf2_9ce4_8422_2325u64, |hash, b| {
        (hash ^ u64::from(*b)).wrapping_mul(0x0100_0000_01b3)
    })
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> DomainResult<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match self.scripted.write().await.pop_front() {
            Some(MockEmbedding::Vector(v)) => Ok(v),
            Some(MockEmbedding::Failure(msg)) => Err(DomainError::ProviderFailed(msg)),
            None => Ok(self.hashed_vector(text)),
        }
    }
}
