//! Domain errors for the Kindred matching system.

use thiserror::Error;
use uuid::Uuid;

/// Domain-level errors that can occur in the Kindred system.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The source member has no stored embedding yet (onboarding incomplete).
    #[error("No embedding stored for user {0}; complete the profile to enable matching")]
    NoEmbedding(Uuid),

    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Invalid vector format: {0}")]
    InvalidVectorFormat(String),

    /// Embedding generation gave up; surfaced to pollers, never to the profile writer.
    #[error("Embedding job {job_id} exhausted after {attempts} attempts: {last_error}")]
    JobExhausted {
        job_id: Uuid,
        attempts: u32,
        last_error: String,
    },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid state transition from {from} to {to}: {reason}")]
    InvalidStateTransition {
        from: String,
        to: String,
        reason: String,
    },

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Embedding provider failed: {0}")]
    ProviderFailed(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return DomainError::Conflict(db_err.message().to_string());
            }
        }
        DomainError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let id = Uuid::new_v4();
        let err = DomainError::not_found("Profile", id);
        assert_eq!(err.to_string(), format!("Profile not found: {id}"));
    }

    #[test]
    fn test_no_embedding_mentions_onboarding() {
        let err = DomainError::NoEmbedding(Uuid::nil());
        assert!(err.to_string().contains("complete the profile"));
    }

    #[test]
    fn test_json_error_maps_to_serialization() {
        let err: DomainError = serde_json::from_str::<Vec<String>>("{").unwrap_err().into();
        assert!(matches!(err, DomainError::SerializationError(_)));
    }
}
