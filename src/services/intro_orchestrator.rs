//! Match and intro lifecycle.
//!
//! ```text
//! none --accept--> accepted_by_one --accept (other side)--> mutual
//!   |                     |  \--pass (other side)--> passed
//!   |                     \--ttl--> expired
//!   \--pass--> passed
//! ```
//!
//! Every write is either an insert guarded by the pair's unique key or a
//! compare-and-set on status, so concurrent actions on one pair settle on a
//! single row and at most one intro. Losing a race re-reads and retries.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    AcceptOutcome, AcceptStatus, Intro, IntroStatus, Match, MatchCandidate, MatchStatus, Member,
    PairKey, PassOutcome, PassStatus,
};
use crate::domain::ports::{IntroContext, IntroNotifier, MatchRepository, MemberRepository};
use crate::services::filters::FilterChain;

const MAX_RACE_RETRIES: usize = 3;

pub struct IntroOrchestrator {
    members: Arc<dyn MemberRepository>,
    matches: Arc<dyn MatchRepository>,
    notifier: Arc<dyn IntroNotifier>,
    eligibility: FilterChain,
    match_ttl: chrono::Duration,
}

impl IntroOrchestrator {
    pub fn new(
        members: Arc<dyn MemberRepository>,
        matches: Arc<dyn MatchRepository>,
        notifier: Arc<dyn IntroNotifier>,
        match_ttl: chrono::Duration,
    ) -> Self {
        Self {
            eligibility: FilterChain::pair_eligibility(members.clone()),
            members,
            matches,
            notifier,
            match_ttl,
        }
    }

    /// Record `user_id` accepting `candidate`.
    #[instrument(skip(self, candidate), fields(candidate_id = %candidate.candidate_id))]
    pub async fn accept(&self, user_id: Uuid, candidate: &MatchCandidate) -> DomainResult<AcceptOutcome> {
        let pair = self.resolve_pair(user_id, candidate.candidate_id).await?;

        for _ in 0..MAX_RACE_RETRIES {
            let now = Utc::now();
            let Some(existing) = self.matches.get_by_pair(pair).await? else {
                let m = Match::new(
                    pair,
                    user_id,
                    candidate.scores.clone(),
                    MatchStatus::AcceptedByOne,
                    Some(now + self.match_ttl),
                );
                if self.matches.insert_if_absent(&m).await? {
                    tracing::info!(match_id = %m.id, "match accepted by first member");
                    return Ok(AcceptOutcome {
                        status: AcceptStatus::Accepted,
                        match_id: m.id,
                        intro_id: None,
                    });
                }
                continue;
            };

            match existing.status {
                MatchStatus::AcceptedByOne => {
                    if existing.is_overdue(now) {
                        self.expire(&existing, now).await?;
                        return Err(invalid(MatchStatus::Expired, MatchStatus::Mutual, "the acceptance window has closed"));
                    }
                    if existing.initiator_id == user_id {
                        return Ok(AcceptOutcome {
                            status: AcceptStatus::Accepted,
                            match_id: existing.id,
                            intro_id: None,
                        });
                    }
                    if self
                        .matches
                        .compare_and_set_status(existing.id, MatchStatus::AcceptedByOne, MatchStatus::Mutual, now)
                        .await?
                    {
                        tracing::info!(match_id = %existing.id, "match is mutual");
                        let mutual = Match {
                            status: MatchStatus::Mutual,
                            updated_at: now,
                            ..existing
                        };
                        let intro = self.create_intro(&mutual).await?;
                        return Ok(mutual_outcome(&mutual, &intro));
                    }
                }
                MatchStatus::Mutual => {
                    let intro = self.create_intro(&existing).await?;
                    return Ok(mutual_outcome(&existing, &intro));
                }
                MatchStatus::Passed | MatchStatus::Expired => {
                    return Err(invalid(existing.status, MatchStatus::Mutual, "the match is closed"));
                }
            }
        }

        Err(DomainError::Conflict(format!(
            "match for {} and {} kept changing underneath accept",
            pair.low, pair.high
        )))
    }

    /// Record `user_id` passing on `candidate`.
    #[instrument(skip(self, candidate), fields(candidate_id = %candidate.candidate_id))]
    pub async fn pass(&self, user_id: Uuid, candidate: &MatchCandidate) -> DomainResult<PassOutcome> {
        let pair = self.resolve_pair(user_id, candidate.candidate_id).await?;

        for _ in 0..MAX_RACE_RETRIES {
            let now = Utc::now();
            let Some(existing) = self.matches.get_by_pair(pair).await? else {
                let m = Match::new(pair, user_id, candidate.scores.clone(), MatchStatus::Passed, None);
                if self.matches.insert_if_absent(&m).await? {
                    tracing::info!(match_id = %m.id, "match passed");
                    return Ok(passed(m.id));
                }
                continue;
            };

            match existing.status {
                MatchStatus::AcceptedByOne => {
                    if existing.is_overdue(now) {
                        self.expire(&existing, now).await?;
                        return Err(invalid(MatchStatus::Expired, MatchStatus::Passed, "the acceptance window has closed"));
                    }
                    if self
                        .matches
                        .compare_and_set_status(existing.id, MatchStatus::AcceptedByOne, MatchStatus::Passed, now)
                        .await?
                    {
                        tracing::info!(match_id = %existing.id, "pending match declined");
                        return Ok(passed(existing.id));
                    }
                }
                status => {
                    return Err(invalid(status, MatchStatus::Passed, "the match is already decided"));
                }
            }
        }

        Err(DomainError::Conflict(format!(
            "match for {} and {} kept changing underneath pass",
            pair.low, pair.high
        )))
    }

    /// Create the intro for a mutual match, or return the existing one.
    ///
    /// Both members are notified only by the call that creates the intro.
    /// A failed delivery leaves the intro pending; it is not retried here.
    #[instrument(skip(self, m), fields(match_id = %m.id))]
    pub async fn create_intro(&self, m: &Match) -> DomainResult<Intro> {
        if m.status != MatchStatus::Mutual {
            return Err(DomainError::PreconditionFailed(format!(
                "match {} is {}, intros need a mutual match",
                m.id, m.status
            )));
        }

        let (intro, created) = self.matches.create_intro(&Intro::for_mutual(m.id)).await?;
        if !created {
            tracing::debug!(intro_id = %intro.id, "intro already exists");
            return Ok(intro);
        }

        match self.notify_both(m, &intro).await {
            Ok(()) => {
                let now = Utc::now();
                self.matches.mark_intro_notified(intro.id, now).await?;
                tracing::info!(intro_id = %intro.id, "intro sent");
                Ok(Intro {
                    status: IntroStatus::Notified,
                    notified_at: Some(now),
                    ..intro
                })
            }
            Err(e) => {
                tracing::warn!(intro_id = %intro.id, error = %e, "intro notification failed");
                Ok(intro)
            }
        }
    }

    async fn notify_both(&self, m: &Match, intro: &Intro) -> DomainResult<()> {
        let members = self.members.get_many(&[m.pair.low, m.pair.high]).await?;
        let find = |id: Uuid| -> DomainResult<&Member> {
            members
                .iter()
                .find(|member| member.id == id)
                .ok_or_else(|| DomainError::not_found("Member", id))
        };
        let low = find(m.pair.low)?;
        let high = find(m.pair.high)?;

        let context = IntroContext {
            match_id: m.id,
            intro_id: intro.id,
            final_score: m.scores.final_score,
            reasons: m.scores.reasons.clone(),
        };
        let shared_interest = m.shared_interest();

        self.notifier
            .notify_mutual_intro(low, &high.contact_card(), shared_interest, &context)
            .await?;
        self.notifier
            .notify_mutual_intro(high, &low.contact_card(), shared_interest, &context)
            .await
    }

    /// Acceptances by others waiting on `user_id`.
    pub async fn pending_for(&self, user_id: Uuid) -> DomainResult<Vec<Match>> {
        self.matches.pending_for(user_id).await
    }

    /// Expire overdue acceptances. Returns how many were expired.
    pub async fn expire_stale(&self, now: DateTime<Utc>) -> DomainResult<u64> {
        let expired = self.matches.expire_stale(now).await?;
        if expired > 0 {
            tracing::info!(expired, "expired stale matches");
        }
        Ok(expired)
    }

    pub async fn get_match(&self, user_id: Uuid, other_id: Uuid) -> DomainResult<Option<Match>> {
        self.matches.get_by_pair(PairKey::new(user_id, other_id)?).await
    }

    pub async fn get_intro(&self, match_id: Uuid) -> DomainResult<Option<Intro>> {
        self.matches.get_intro_by_match(match_id).await
    }

    /// Both members must exist, and the pair must still be one the
    /// matching pipeline could have suggested: same tenant, no block either
    /// way, both active.
    async fn resolve_pair(&self, user_id: Uuid, candidate_id: Uuid) -> DomainResult<PairKey> {
        let pair = PairKey::new(user_id, candidate_id)?;
        let found = self.members.get_many(&[pair.low, pair.high]).await?;
        let find = |id: Uuid| {
            found
                .iter()
                .find(|m| m.id == id)
                .ok_or_else(|| DomainError::not_found("Member", id))
        };
        let user = find(user_id)?;
        find(candidate_id)?;

        if !user.is_active() {
            return Err(DomainError::ValidationFailed(format!(
                "member {user_id} is {} and cannot act on matches",
                user.status.as_str()
            )));
        }
        if self.eligibility.apply(user, vec![candidate_id]).await?.is_empty() {
            return Err(DomainError::ValidationFailed(format!(
                "member {candidate_id} is not an eligible match for {user_id}"
            )));
        }
        Ok(pair)
    }

    async fn expire(&self, m: &Match, now: DateTime<Utc>) -> DomainResult<()> {
        if self
            .matches
            .compare_and_set_status(m.id, MatchStatus::AcceptedByOne, MatchStatus::Expired, now)
            .await?
        {
            tracing::info!(match_id = %m.id, "match expired on late action");
        }
        Ok(())
    }
}

fn invalid(from: MatchStatus, to: MatchStatus, reason: &str) -> DomainError {
    DomainError::InvalidStateTransition {
        from: from.to_string(),
        to: to.to_string(),
        reason: reason.to_string(),
    }
}

fn mutual_outcome(m: &Match, intro: &Intro) -> AcceptOutcome {
    AcceptOutcome {
        status: AcceptStatus::Mutual,
        match_id: m.id,
        intro_id: Some(intro.id),
    }
}

fn passed(match_id: Uuid) -> PassOutcome {
    PassOutcome {
        status: PassStatus::Passed,
        match_id,
    }
}
