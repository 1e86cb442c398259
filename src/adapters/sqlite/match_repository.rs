//! SQLite implementation of the MatchRepository.
//!
//! `UNIQUE(user_low, user_high)` and `UNIQUE(match_id)` carry the
//! exactly-once guarantees; every write is a single conditional statement.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::collections::HashSet;
use uuid::Uuid;

use super::{format_datetime, parse_datetime, parse_optional_datetime, parse_uuid};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    Intro, IntroSideStatus, IntroStatus, Match, MatchScores, MatchStatus, PairKey,
};
use crate::domain::ports::MatchRepository;

const MATCH_COLUMNS: &str = "id, user_low, user_high, initiator_id, similarity_score, diversity_score, \
     final_score, reasons, status, created_at, updated_at, expires_at";

const INTRO_COLUMNS: &str = "id, match_id, low_status, high_status, status, created_at, notified_at";

#[derive(Clone)]
pub struct SqliteMatchRepository {
    pool: SqlitePool,
}

impl SqliteMatchRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MatchRepository for SqliteMatchRepository {
    async fn insert_if_absent(&self, m: &Match) -> DomainResult<bool> {
        let reasons_json = serde_json::to_string(&m.scores.reasons)?;

        let result = sqlx::query(
            r#"INSERT INTO matches (id, user_low, user_high, initiator_id, similarity_score, diversity_score,
                   final_score, reasons, status, created_at, updated_at, expires_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT(user_low, user_high) DO NOTHING"#,
        )
        .bind(m.id.to_string())
        .bind(m.pair.low.to_string())
        .bind(m.pair.high.to_string())
        .bind(m.initiator_id.to_string())
        .bind(f64::from(m.scores.similarity_score))
        .bind(f64::from(m.scores.diversity_score))
        .bind(f64::from(m.scores.final_score))
        .bind(&reasons_json)
        .bind(m.status.as_str())
        .bind(format_datetime(m.created_at))
        .bind(format_datetime(m.updated_at))
        .bind(m.expires_at.map(format_datetime))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<Match>> {
        let row: Option<MatchRow> =
            sqlx::query_as(&format!("SELECT {MATCH_COLUMNS} FROM matches WHERE id = ?"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;

        row.map(|r| r.try_into()).transpose()
    }

    async fn get_by_pair(&self, pair: PairKey) -> DomainResult<Option<Match>> {
        let row: Option<MatchRow> = sqlx::query_as(&format!(
            "SELECT {MATCH_COLUMNS} FROM matches WHERE user_low = ? AND user_high = ?"
        ))
        .bind(pair.low.to_string())
        .bind(pair.high.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.try_into()).transpose()
    }

    async fn compare_and_set_status(
        &self,
        id: Uuid,
        from: MatchStatus,
        to: MatchStatus,
        at: DateTime<Utc>,
    ) -> DomainResult<bool> {
        if !from.can_transition_to(to) {
            return Err(DomainError::InvalidStateTransition {
                from: from.to_string(),
                to: to.to_string(),
                reason: "transition not allowed".to_string(),
            });
        }

        let result = sqlx::query("UPDATE matches SET status = ?, updated_at = ? WHERE id = ? AND status = ?")
            .bind(to.as_str())
            .bind(format_datetime(at))
            .bind(id.to_string())
            .bind(from.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn partner_ids(&self, user_id: Uuid) -> DomainResult<HashSet<Uuid>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"SELECT user_high FROM matches WHERE user_low = ?
               UNION
               SELECT user_low FROM matches WHERE user_high = ?"#,
        )
        .bind(user_id.to_string())
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(|(id,)| parse_uuid(id)).collect()
    }

    async fn pending_for(&self, user_id: Uuid) -> DomainResult<Vec<Match>> {
        let rows: Vec<MatchRow> = sqlx::query_as(&format!(
            r#"SELECT {MATCH_COLUMNS} FROM matches
               WHERE status = 'accepted_by_one'
                 AND (user_low = ? OR user_high = ?)
                 AND initiator_id != ?
               ORDER BY created_at, id"#
        ))
        .bind(user_id.to_string())
        .bind(user_id.to_string())
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    async fn expire_stale(&self, now: DateTime<Utc>) -> DomainResult<u64> {
        let now = format_datetime(now);
        let result = sqlx::query(
            r#"UPDATE matches SET status = 'expired', updated_at = ?
               WHERE status = 'accepted_by_one' AND expires_at IS NOT NULL AND expires_at <= ?"#,
        )
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn create_intro(&self, intro: &Intro) -> DomainResult<(Intro, bool)> {
        let result = sqlx::query(
            r#"INSERT INTO intros (id, match_id, low_status, high_status, status, created_at, notified_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT(match_id) DO NOTHING"#,
        )
        .bind(intro.id.to_string())
        .bind(intro.match_id.to_string())
        .bind(intro.low_status.as_str())
        .bind(intro.high_status.as_str())
        .bind(intro.status.as_str())
        .bind(format_datetime(intro.created_at))
        .bind(intro.notified_at.map(format_datetime))
        .execute(&self.pool)
        .await?;

        let created = result.rows_affected() == 1;
        let stored = self
            .get_intro_by_match(intro.match_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Intro", intro.match_id))?;

        Ok((stored, created))
    }

    async fn get_intro_by_match(&self, match_id: Uuid) -> DomainResult<Option<Intro>> {
        let row: Option<IntroRow> =
            sqlx::query_as(&format!("SELECT {INTRO_COLUMNS} FROM intros WHERE match_id = ?"))
                .bind(match_id.to_string())
                .fetch_optional(&self.pool)
                .await?;

        row.map(|r| r.try_into()).transpose()
    }

    async fn mark_intro_notified(&self, intro_id: Uuid, at: DateTime<Utc>) -> DomainResult<()> {
        let result = sqlx::query("UPDATE intros SET status = 'notified', notified_at = ? WHERE id = ?")
            .bind(format_datetime(at))
            .bind(intro_id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("Intro", intro_id));
        }
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct MatchRow {
    id: String,
    user_low: String,
    user_high: String,
    initiator_id: String,
    similarity_score: f64,
    diversity_score: f64,
    final_score: f64,
    reasons: String,
    status: String,
    created_at: String,
    updated_at: String,
    expires_at: Option<String>,
}

impl TryFrom<MatchRow> for Match {
    type Error = DomainError;

    fn try_from(row: MatchRow) -> Result<Self, Self::Error> {
        let status = MatchStatus::from_str(&row.status)
            .ok_or_else(|| DomainError::SerializationError(format!("Invalid match status: {}", row.status)))?;
        let reasons: Vec<String> = serde_json::from_str(&row.reasons)
            .map_err(|e| DomainError::SerializationError(e.to_string()))?;

        Ok(Match {
            id: parse_uuid(&row.id)?,
            pair: PairKey::new(parse_uuid(&row.user_low)?, parse_uuid(&row.user_high)?)?,
            initiator_id: parse_uuid(&row.initiator_id)?,
            scores: MatchScores {
                similarity_score: row.similarity_score as f32,
                diversity_score: row.diversity_score as f32,
                final_score: row.final_score as f32,
                reasons,
            },
            status,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
            expires_at: parse_optional_datetime(row.expires_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct IntroRow {
    id: String,
    match_id: String,
    low_status: String,
    high_status: String,
    status: String,
    created_at: String,
    notified_at: Option<String>,
}

impl TryFrom<IntroRow> for Intro {
    type Error = DomainError;

    fn try_from(row: IntroRow) -> Result<Self, Self::Error> {
        let side = |s: &str| {
            IntroSideStatus::from_str(s)
                .ok_or_else(|| DomainError::SerializationError(format!("Invalid intro side status: {s}")))
        };
        let status = IntroStatus::from_str(&row.status)
            .ok_or_else(|| DomainError::SerializationError(format!("Invalid intro status: {}", row.status)))?;

        Ok(Intro {
            id: parse_uuid(&row.id)?,
            match_id: parse_uuid(&row.match_id)?,
            low_status: side(&row.low_status)?,
            high_status: side(&row.high_status)?,
            status,
            created_at: parse_datetime(&row.created_at)?,
            notified_at: parse_optional_datetime(row.notified_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::{create_migrated_test_pool, SqliteMemberRepository};
    use crate::domain::models::Member;
    use crate::domain::ports::MemberRepository;

    async fn setup() -> (SqliteMatchRepository, PairKey) {
        let pool = create_migrated_test_pool().await.unwrap();
        let members = SqliteMemberRepository::new(pool.clone());
        let tenant = Uuid::new_v4();
        let a = Member::new(tenant, Uuid::new_v4(), "a.com", "A", "a@a.com");
        let b = Member::new(tenant, Uuid::new_v4(), "b.com", "B", "b@b.com");
        members.create(&a).await.unwrap();
        members.create(&b).await.unwrap();
        (SqliteMatchRepository::new(pool), PairKey::new(a.id, b.id).unwrap())
    }

    fn scores() -> MatchScores {
        MatchScores {
            similarity_score: 0.8,
            diversity_score: 1.0,
            final_score: 0.86,
            reasons: vec!["Shared interest in sustainable".to_string()],
        }
    }

    #[tokio::test]
    async fn test_pair_is_unique_regardless_of_initiator() {
        let (repo, pair) = setup().await;
        let first = Match::new(pair, pair.low, scores(), MatchStatus::AcceptedByOne, None);
        let second = Match::new(pair, pair.high, scores(), MatchStatus::Passed, None);

        assert!(repo.insert_if_absent(&first).await.unwrap());
        assert!(!repo.insert_if_absent(&second).await.unwrap());

        let stored = repo.get_by_pair(pair).await.unwrap().unwrap();
        assert_eq!(stored.id, first.id);
        assert_eq!(stored.initiator_id, pair.low);
        assert_eq!(stored.scores.reasons, scores().reasons);
        assert!((stored.scores.final_score - 0.86).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_compare_and_set_only_from_expected_status() {
        let (repo, pair) = setup().await;
        let m = Match::new(pair, pair.low, scores(), MatchStatus::AcceptedByOne, None);
        repo.insert_if_absent(&m).await.unwrap();

        let now = Utc::now();
        assert!(repo.compare_and_set_status(m.id, MatchStatus::AcceptedByOne, MatchStatus::Mutual, now).await.unwrap());
        assert!(!repo.compare_and_set_status(m.id, MatchStatus::AcceptedByOne, MatchStatus::Mutual, now).await.unwrap());
        assert!(matches!(
            repo.compare_and_set_status(m.id, MatchStatus::Mutual, MatchStatus::Passed, now).await,
            Err(DomainError::InvalidStateTransition { .. })
        ));
        assert_eq!(repo.get(m.id).await.unwrap().unwrap().status, MatchStatus::Mutual);
    }

    #[tokio::test]
    async fn test_pending_for_and_partners() {
        let (repo, pair) = setup().await;
        let m = Match::new(pair, pair.low, scores(), MatchStatus::AcceptedByOne, None);
        repo.insert_if_absent(&m).await.unwrap();

        assert_eq!(repo.pending_for(pair.high).await.unwrap().len(), 1);
        assert!(repo.pending_for(pair.low).await.unwrap().is_empty());
        assert!(repo.partner_ids(pair.low).await.unwrap().contains(&pair.high));
        assert!(repo.partner_ids(pair.high).await.unwrap().contains(&pair.low));
    }

    #[tokio::test]
    async fn test_expire_stale() {
        let (repo, pair) = setup().await;
        let past = Utc::now() - chrono::Duration::hours(1);
        let m = Match::new(pair, pair.low, scores(), MatchStatus::AcceptedByOne, Some(past));
        repo.insert_if_absent(&m).await.unwrap();

        assert_eq!(repo.expire_stale(Utc::now()).await.unwrap(), 1);
        assert_eq!(repo.expire_stale(Utc::now()).await.unwrap(), 0);
        assert_eq!(repo.get(m.id).await.unwrap().unwrap().status, MatchStatus::Expired);
    }

    #[tokio::test]
    async fn test_intro_is_unique_per_match() {
        let (repo, pair) = setup().await;
        let m = Match::new(pair, pair.low, scores(), MatchStatus::Mutual, None);
        repo.insert_if_absent(&m).await.unwrap();

        let (first, created) = repo.create_intro(&Intro::for_mutual(m.id)).await.unwrap();
        assert!(created);
        let (second, created) = repo.create_intro(&Intro::for_mutual(m.id)).await.unwrap();
        assert!(!created);
        assert_eq!(first.id, second.id);

        repo.mark_intro_notified(first.id, Utc::now()).await.unwrap();
        let stored = repo.get_intro_by_match(m.id).await.unwrap().unwrap();
        assert_eq!(stored.status, IntroStatus::Notified);
        assert!(stored.notified_at.is_some());
    }
}
