//! Embedding and embedding-job domain models.
//!
//! Vectors are persisted as little-endian `f32` bytes. Cosine math lives
//! here so every `VectorStore` adapter scores candidates the same way.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};

/// The stored semantic vector for one member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Embedding {
    pub user_id: Uuid,
    pub vector: Vec<f32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Embedding {
    pub fn new(user_id: Uuid, vector: Vec<f32>) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            vector,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn dimension(&self) -> usize {
        self.vector.len()
    }
}

/// Serialize an embedding vector to bytes for storage.
pub fn vector_to_bytes(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Deserialize an embedding vector from stored bytes.
pub fn bytes_to_vector(bytes: &[u8]) -> DomainResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(DomainError::InvalidVectorFormat(format!(
            "byte length {} is not a multiple of 4",
            bytes.len()
        )));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

/// Cosine similarity (`1 - cosine distance`) between two vectors.
///
/// Zero-magnitude vectors have no direction and score 0. Mismatched
/// dimensions are a storage defect and surface as `InvalidVectorFormat`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> DomainResult<f32> {
    if a.len() != b.len() {
        return Err(DomainError::InvalidVectorFormat(format!(
            "dimension mismatch: {} vs {}",
            a.len(),
            b.len()
        )));
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return Ok(0.0);
    }

    Ok(dot / (mag_a * mag_b))
}

/// Lifecycle of a queued embedding job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Waiting,
    Active,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "waiting" => Some(Self::Waiting),
            "active" => Some(Self::Active),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// What a client polling for embedding progress sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl From<JobStatus> for EmbeddingStatus {
    fn from(status: JobStatus) -> Self {
        match status {
            JobStatus::Waiting => Self::Pending,
            JobStatus::Active => Self::Processing,
            JobStatus::Completed => Self::Completed,
            JobStatus::Failed => Self::Failed,
        }
    }
}

impl std::fmt::Display for EmbeddingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Work item handed to the queue on every semantic profile write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingJobPayload {
    pub user_id: Uuid,
    pub profile_id: Uuid,
}

/// Retry options recorded on each job at enqueue time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobOptions {
    pub max_attempts: u32,
    pub backoff_base: Duration,
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: Duration::from_secs(2),
        }
    }
}

/// A persisted embedding job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingJob {
    pub id: Uuid,
    pub user_id: Uuid,
    pub profile_id: Uuid,
    pub status: JobStatus,
    pub attempts: u32,
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl EmbeddingJob {
    pub fn new(payload: EmbeddingJobPayload, options: JobOptions) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: payload.user_id,
            profile_id: payload.profile_id,
            status: JobStatus::Waiting,
            attempts: 0,
            max_attempts: options.max_attempts,
            backoff_base_ms: u64::try_from(options.backoff_base.as_millis()).unwrap_or(u64::MAX),
            last_error: None,
            created_at: now,
            updated_at: now,
            started_at: None,
            finished_at: None,
        }
    }

    pub fn payload(&self) -> EmbeddingJobPayload {
        EmbeddingJobPayload {
            user_id: self.user_id,
            profile_id: self.profile_id,
        }
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn attempts_remaining(&self) -> u32 {
        self.max_attempts.saturating_sub(self.attempts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_bytes_roundtrip() {
        let vector = vec![0.25f32, -1.5, 3.0];
        let bytes = vector_to_bytes(&vector);
        assert_eq!(bytes.len(), 12);
        assert_eq!(bytes_to_vector(&bytes).unwrap(), vector);
    }

    #[test]
    fn test_invalid_byte_length_rejected() {
        let err = bytes_to_vector(&[0u8; 7]).unwrap_err();
        assert!(matches!(err, DomainError::InvalidVectorFormat(_)));
    }

    #[test]
    fn test_cosine_of_self_is_one() {
        let v = vec![0.3f32, 0.4, 0.5, -0.1];
        let sim = cosine_similarity(&v, &v).unwrap();
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal_is_zero() {
        let sim = cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap();
        assert!(sim.abs() < 1e-6);
    }

    #[test]
    fn test_cosine_zero_magnitude() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]).unwrap(), 0.0);
    }

    #[test]
    fn test_cosine_dimension_mismatch() {
        assert!(matches!(
            cosine_similarity(&[1.0], &[1.0, 0.0]),
            Err(DomainError::InvalidVectorFormat(_))
        ));
    }

    #[test]
    fn test_job_status_mapping() {
        assert_eq!(EmbeddingStatus::from(JobStatus::Waiting), EmbeddingStatus::Pending);
        assert_eq!(EmbeddingStatus::from(JobStatus::Active), EmbeddingStatus::Processing);
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Active.is_terminal());
    }

    #[test]
    fn test_new_job_defaults() {
        let payload = EmbeddingJobPayload {
            user_id: Uuid::new_v4(),
            profile_id: Uuid::new_v4(),
        };
        let job = EmbeddingJob::new(payload, JobOptions::default());
        assert_eq!(job.status, JobStatus::Waiting);
        assert_eq!(job.max_attempts, 3);
        assert_eq!(job.backoff_base(), Duration::from_secs(2));
        assert_eq!(job.attempts_remaining(), 3);
        assert_eq!(job.payload(), payload);
    }
}
