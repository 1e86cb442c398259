//! Diversity-aware reranking.
//!
//! The final score blends semantic similarity with how different the
//! candidate is from the source along organizational lines:
//!
//! ```text
//! final = similarity * (1 - w) + diversity * w
//! ```

use std::cmp::Ordering;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{validate_unit_interval, Member, Profile};

pub const DEFAULT_DIVERSITY_WEIGHT: f32 = 0.3;

// Contributions in tenths, so three differing dimensions sum to exactly 1.0.
const ORGANIZATION_TENTHS: u8 = 4;
const CONNECTION_TYPE_TENTHS: u8 = 3;
const DOMAIN_TENTHS: u8 = 3;

/// A filtered candidate with its similarity score.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub member: Member,
    pub profile: Option<Profile>,
    pub similarity: f32,
}

#[derive(Debug, Clone)]
pub struct RankedCandidate {
    pub member: Member,
    pub profile: Option<Profile>,
    pub similarity_score: f32,
    pub diversity_score: f32,
    pub final_score: f32,
}

/// Additive diversity score in `[0, 1]`.
///
/// A candidate without a profile counts as sharing the source's connection
/// type.
pub fn diversity_score(source: &Member, source_profile: &Profile, candidate: &Member, candidate_profile: Option<&Profile>) -> f32 {
    let mut tenths = 0u8;
    if source.organization_id != candidate.organization_id {
        tenths += ORGANIZATION_TENTHS;
    }
    if candidate_profile.is_some_and(|p| p.connection_type != source_profile.connection_type) {
        tenths += CONNECTION_TYPE_TENTHS;
    }
    if source.organization_domain != candidate.organization_domain {
        tenths += DOMAIN_TENTHS;
    }
    f32::from(tenths.min(10)) / 10.0
}

pub fn final_score(similarity: f32, diversity: f32, weight: f32) -> f32 {
    similarity * (1.0 - weight) + diversity * weight
}

/// Descending final score, then descending similarity, then ascending id.
fn compare(a: &RankedCandidate, b: &RankedCandidate) -> Ordering {
    b.final_score
        .total_cmp(&a.final_score)
        .then_with(|| b.similarity_score.total_cmp(&a.similarity_score))
        .then_with(|| a.member.id.cmp(&b.member.id))
}

pub trait RankingStrategy: Send + Sync {
    fn rank(
        &self,
        source: &Member,
        source_profile: Option<&Profile>,
        candidates: Vec<ScoredCandidate>,
        weight: f32,
    ) -> DomainResult<Vec<RankedCandidate>>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DiversityRanker;

impl RankingStrategy for DiversityRanker {
    fn rank(
        &self,
        source: &Member,
        source_profile: Option<&Profile>,
        candidates: Vec<ScoredCandidate>,
        weight: f32,
    ) -> DomainResult<Vec<RankedCandidate>> {
        let source_profile = source_profile.filter(|p| p.is_complete()).ok_or_else(|| {
            DomainError::PreconditionFailed(format!("member {} has no completed profile", source.id))
        })?;
        validate_unit_interval("diversityWeight", weight)?;

        let mut ranked: Vec<RankedCandidate> = candidates
            .into_iter()
            .map(|c| {
                let diversity = diversity_score(source, source_profile, &c.member, c.profile.as_ref());
                RankedCandidate {
                    final_score: final_score(c.similarity, diversity, weight),
                    similarity_score: c.similarity,
                    diversity_score: diversity,
                    member: c.member,
                    profile: c.profile,
                }
            })
            .collect();

        ranked.sort_by(compare);
        Ok(ranked)
    }
}
