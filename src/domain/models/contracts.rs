//! Request and response contracts consumed by outer surfaces (HTTP, CLI).
//!
//! Validation is explicit: callers run `validate` and get a typed error back.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::matching::MatchScores;

/// Default number of suggestions returned.
pub const DEFAULT_MATCH_LIMIT: usize = 10;

/// Upper bound on suggestions per request.
pub const MAX_MATCH_LIMIT: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateMatchesRequest {
    pub user_id: Uuid,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub min_similarity_score: f32,
    /// Falls back to the configured weight when absent.
    #[serde(default)]
    pub diversity_weight: Option<f32>,
}

const fn default_limit() -> usize {
    DEFAULT_MATCH_LIMIT
}

impl GenerateMatchesRequest {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            limit: DEFAULT_MATCH_LIMIT,
            min_similarity_score: 0.0,
            diversity_weight: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_min_similarity(mut self, min_similarity_score: f32) -> Self {
        self.min_similarity_score = min_similarity_score;
        self
    }

    pub fn with_diversity_weight(mut self, weight: f32) -> Self {
        self.diversity_weight = Some(weight);
        self
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.limit == 0 || self.limit > MAX_MATCH_LIMIT {
            return Err(DomainError::ValidationFailed(format!(
                "limit must be between 1 and {MAX_MATCH_LIMIT}, got {}",
                self.limit
            )));
        }
        validate_unit_interval("minSimilarityScore", self.min_similarity_score)?;
        if let Some(weight) = self.diversity_weight {
            validate_unit_interval("diversityWeight", weight)?;
        }
        Ok(())
    }
}

/// Reject NaN and anything outside `[0, 1]`.
pub fn validate_unit_interval(field: &str, value: f32) -> DomainResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(DomainError::ValidationFailed(format!(
            "{field} must be within [0, 1], got {value}"
        )));
    }
    Ok(())
}

/// One ranked suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSuggestion {
    pub candidate_id: Uuid,
    pub similarity_score: f32,
    pub diversity_score: f32,
    pub final_score: f32,
    pub reasons: Vec<String>,
}

impl MatchSuggestion {
    /// The decision payload a member sends back when acting on this suggestion.
    pub fn to_candidate(&self) -> MatchCandidate {
        MatchCandidate {
            candidate_id: self.candidate_id,
            scores: MatchScores {
                similarity_score: self.similarity_score,
                diversity_score: self.diversity_score,
                final_score: self.final_score,
                reasons: self.reasons.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateMatchesResponse {
    pub matches: Vec<MatchSuggestion>,
}

/// The candidate a member accepts or passes on.
///
/// Scores are only persisted when the action creates the match row; the
/// second side's scores are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchCandidate {
    pub candidate_id: Uuid,
    #[serde(flatten)]
    pub scores: MatchScores,
}

impl MatchCandidate {
    /// A candidate without ranking context (e.g. answering a pending match).
    pub fn bare(candidate_id: Uuid) -> Self {
        Self {
            candidate_id,
            scores: MatchScores::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcceptStatus {
    Accepted,
    Mutual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptOutcome {
    pub status: AcceptStatus,
    pub match_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intro_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassStatus {
    Passed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassOutcome {
    pub status: PassStatus,
    pub match_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_request_is_valid() {
        assert!(GenerateMatchesRequest::new(Uuid::new_v4()).validate().is_ok());
    }

    #[test]
    fn test_limit_bounds() {
        let req = GenerateMatchesRequest::new(Uuid::new_v4()).with_limit(0);
        assert!(matches!(req.validate(), Err(DomainError::ValidationFailed(_))));
        let req = GenerateMatchesRequest::new(Uuid::new_v4()).with_limit(MAX_MATCH_LIMIT + 1);
        assert!(req.validate().is_err());
        let req = GenerateMatchesRequest::new(Uuid::new_v4()).with_limit(MAX_MATCH_LIMIT);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_weight_and_similarity_bounds() {
        let req = GenerateMatchesRequest::new(Uuid::new_v4()).with_diversity_weight(1.5);
        assert!(req.validate().is_err());
        let req = GenerateMatchesRequest::new(Uuid::new_v4()).with_min_similarity(-0.1);
        assert!(req.validate().is_err());
        let req = GenerateMatchesRequest::new(Uuid::new_v4()).with_min_similarity(f32::NAN);
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_request_deserializes_with_defaults() {
        let id = Uuid::new_v4();
        let req: GenerateMatchesRequest =
            serde_json::from_value(serde_json::json!({ "userId": id })).unwrap();
        assert_eq!(req.limit, DEFAULT_MATCH_LIMIT);
        assert_eq!(req.min_similarity_score, 0.0);
        assert!(req.diversity_weight.is_none());
    }

    #[test]
    fn test_accept_outcome_omits_missing_intro() {
        let outcome = AcceptOutcome {
            status: AcceptStatus::Accepted,
            match_id: Uuid::nil(),
            intro_id: None,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "accepted");
        assert!(json.get("introId").is_none());
    }
}
