//! Match and intro store port.
//!
//! The store only offers atomic primitives. Lifecycle rules live in
//! `services::intro_orchestrator`, which composes them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Intro, Match, MatchStatus, PairKey};

#[async_trait]
pub trait MatchRepository: Send + Sync {
    /// Insert the match unless its pair already has one.
    ///
    /// Returns `false` when another row for the pair won the race.
    async fn insert_if_absent(&self, m: &Match) -> DomainResult<bool>;

    /// Get a match by ID.
    async fn get(&self, id: Uuid) -> DomainResult<Option<Match>>;

    /// Get the match for a pair, whatever its status.
    async fn get_by_pair(&self, pair: PairKey) -> DomainResult<Option<Match>>;

    /// Move a match from `from` to `to` only if it is still in `from`.
    ///
    /// Returns whether this call performed the transition.
    async fn compare_and_set_status(
        &self,
        id: Uuid,
        from: MatchStatus,
        to: MatchStatus,
        at: DateTime<Utc>,
    ) -> DomainResult<bool>;

    /// Everyone `user_id` shares a match row with, in any status.
    async fn partner_ids(&self, user_id: Uuid) -> DomainResult<HashSet<Uuid>>;

    /// Open acceptances by someone else that wait on `user_id`, oldest first.
    async fn pending_for(&self, user_id: Uuid) -> DomainResult<Vec<Match>>;

    /// Expire every `accepted_by_one` match whose expiry is at or before `now`.
    async fn expire_stale(&self, now: DateTime<Utc>) -> DomainResult<u64>;

    /// Insert an intro unless the match already has one.
    ///
    /// Returns the stored intro and whether this call created it.
    async fn create_intro(&self, intro: &Intro) -> DomainResult<(Intro, bool)>;

    /// Get the intro for a match.
    async fn get_intro_by_match(&self, match_id: Uuid) -> DomainResult<Option<Intro>>;

    /// Mark an intro as notified.
    async fn mark_intro_notified(&self, intro_id: Uuid, at: DateTime<Utc>) -> DomainResult<()>;
}
