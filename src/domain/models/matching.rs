//! Match and introduction domain models.
//!
//! A match is keyed by the sorted pair of user ids so both sides of a pair
//! always resolve to the same row, no matter who acts first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};

/// Canonical unordered pair of user ids (`low < high`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PairKey {
    pub low: Uuid,
    pub high: Uuid,
}

impl PairKey {
    /// Build the canonical key for two distinct users.
    pub fn new(a: Uuid, b: Uuid) -> DomainResult<Self> {
        if a == b {
            return Err(DomainError::ValidationFailed(
                "a member cannot be matched with themselves".to_string(),
            ));
        }
        Ok(if a < b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        })
    }

    pub fn contains(&self, user_id: Uuid) -> bool {
        self.low == user_id || self.high == user_id
    }

    /// The other member of the pair, if `user_id` belongs to it.
    pub fn other(&self, user_id: Uuid) -> Option<Uuid> {
        if user_id == self.low {
            Some(self.high)
        } else if user_id == self.high {
            Some(self.low)
        } else {
            None
        }
    }
}

/// Status of a match in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// One side accepted; waiting on the other.
    AcceptedByOne,
    /// Both sides accepted.
    Mutual,
    /// Declined by either side.
    Passed,
    /// Nobody reciprocated before the TTL elapsed.
    Expired,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AcceptedByOne => "accepted_by_one",
            Self::Mutual => "mutual",
            Self::Passed => "passed",
            Self::Expired => "expired",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "accepted_by_one" => Some(Self::AcceptedByOne),
            "mutual" => Some(Self::Mutual),
            "passed" => Some(Self::Passed),
            "expired" => Some(Self::Expired),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::AcceptedByOne)
    }

    /// Valid transitions from this status.
    pub fn valid_transitions(&self) -> Vec<MatchStatus> {
        match self {
            Self::AcceptedByOne => vec![Self::Mutual, Self::Passed, Self::Expired],
            Self::Mutual | Self::Passed | Self::Expired => vec![],
        }
    }

    pub fn can_transition_to(&self, new_status: Self) -> bool {
        self.valid_transitions().contains(&new_status)
    }
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scores and reasons captured when the match was surfaced.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchScores {
    pub similarity_score: f32,
    pub diversity_score: f32,
    pub final_score: f32,
    pub reasons: Vec<String>,
}

/// A persisted match between two members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: Uuid,
    pub pair: PairKey,
    /// The member whose action created the row.
    pub initiator_id: Uuid,
    pub scores: MatchScores,
    pub status: MatchStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Match {
    pub fn new(
        pair: PairKey,
        initiator_id: Uuid,
        scores: MatchScores,
        status: MatchStatus,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            pair,
            initiator_id,
            scores,
            status,
            created_at: now,
            updated_at: now,
            expires_at,
        }
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == MatchStatus::AcceptedByOne && self.expires_at.is_some_and(|t| t <= now)
    }

    /// The strongest shared-interest reason, used as the intro headline.
    pub fn shared_interest(&self) -> &str {
        self.scores
            .reasons
            .first()
            .map_or("your shared interests", String::as_str)
    }
}

/// Per-side acceptance recorded on an intro.
///
/// Intros are only created once a match is mutual, so both sides are
/// written as `Accepted`. `Pending` remains part of the column's domain
/// and still parses, but no code path writes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntroSideStatus {
    Pending,
    Accepted,
}

impl IntroSideStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "accepted" => Some(Self::Accepted),
            _ => None,
        }
    }
}

/// Overall intro status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntroStatus {
    /// Created, notifications not yet confirmed.
    Pending,
    /// Both parties were notified.
    Notified,
}

impl IntroStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Notified => "notified",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "notified" => Some(Self::Notified),
            _ => None,
        }
    }
}

/// The introduction created for a mutual match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Intro {
    pub id: Uuid,
    pub match_id: Uuid,
    pub low_status: IntroSideStatus,
    pub high_status: IntroSideStatus,
    pub status: IntroStatus,
    pub created_at: DateTime<Utc>,
    pub notified_at: Option<DateTime<Utc>>,
}

impl Intro {
    /// An intro for a mutual match. Both sides are always `Accepted` here;
    /// nothing creates an intro for a one-sided acceptance.
    pub fn for_mutual(match_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            match_id,
            low_status: IntroSideStatus::Accepted,
            high_status: IntroSideStatus::Accepted,
            status: IntroStatus::Pending,
            created_at: Utc::now(),
            notified_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutual_intro_records_both_sides_accepted() {
        let match_id = Uuid::new_v4();
        let intro = Intro::for_mutual(match_id);
        assert_eq!(intro.match_id, match_id);
        assert_eq!(intro.low_status, IntroSideStatus::Accepted);
        assert_eq!(intro.high_status, IntroSideStatus::Accepted);
        assert_eq!(intro.status, IntroStatus::Pending);
        assert!(intro.notified_at.is_none());
    }

    #[test]
    fn test_pair_key_is_order_independent() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(PairKey::new(a, b).unwrap(), PairKey::new(b, a).unwrap());
        let key = PairKey::new(a, b).unwrap();
        assert!(key.low < key.high);
        assert_eq!(key.other(a), Some(b));
        assert_eq!(key.other(Uuid::new_v4()), None);
    }

    #[test]
    fn test_pair_key_rejects_self() {
        let a = Uuid::new_v4();
        assert!(matches!(PairKey::new(a, a), Err(DomainError::ValidationFailed(_))));
    }

    #[test]
    fn test_status_transitions() {
        assert!(MatchStatus::AcceptedByOne.can_transition_to(MatchStatus::Mutual));
        assert!(MatchStatus::AcceptedByOne.can_transition_to(MatchStatus::Expired));
        assert!(!MatchStatus::Passed.can_transition_to(MatchStatus::Mutual));
        assert!(!MatchStatus::Mutual.can_transition_to(MatchStatus::Passed));
        assert!(MatchStatus::Expired.is_terminal());
    }

    #[test]
    fn test_status_roundtrip() {
        for status in [
            MatchStatus::AcceptedByOne,
            MatchStatus::Mutual,
            MatchStatus::Passed,
            MatchStatus::Expired,
        ] {
            assert_eq!(MatchStatus::from_str(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_overdue_only_when_waiting() {
        let pair = PairKey::new(Uuid::new_v4(), Uuid::new_v4()).unwrap();
        let past = Utc::now() - chrono::Duration::hours(1);
        let mut m = Match::new(pair, pair.low, MatchScores::default(), MatchStatus::AcceptedByOne, Some(past));
        assert!(m.is_overdue(Utc::now()));
        m.status = MatchStatus::Mutual;
        assert!(!m.is_overdue(Utc::now()));
    }

    #[test]
    fn test_shared_interest_fallback() {
        let pair = PairKey::new(Uuid::new_v4(), Uuid::new_v4()).unwrap();
        let m = Match::new(pair, pair.low, MatchScores::default(), MatchStatus::Mutual, None);
        assert_eq!(m.shared_interest(), "your shared interests");
    }
}
