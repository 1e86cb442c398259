//! SQLite implementation of the MemberRepository.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use std::collections::HashSet;
use uuid::Uuid;

use super::{format_datetime, parse_datetime, parse_uuid, placeholders};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Member, MemberStatus};
use crate::domain::ports::MemberRepository;

const MEMBER_COLUMNS: &str =
    "id, tenant_id, organization_id, organization_domain, display_name, email, status, created_at";

#[derive(Clone)]
pub struct SqliteMemberRepository {
    pool: SqlitePool,
}

impl SqliteMemberRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MemberRepository for SqliteMemberRepository {
    async fn create(&self, member: &Member) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT INTO members (id, tenant_id, organization_id, organization_domain, display_name, email, status, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(member.id.to_string())
        .bind(member.tenant_id.to_string())
        .bind(member.organization_id.to_string())
        .bind(&member.organization_domain)
        .bind(&member.display_name)
        .bind(&member.email)
        .bind(member.status.as_str())
        .bind(format_datetime(member.created_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<Member>> {
        let row: Option<MemberRow> =
            sqlx::query_as(&format!("SELECT {MEMBER_COLUMNS} FROM members WHERE id = ?"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;

        row.map(|r| r.try_into()).transpose()
    }

    async fn get_many(&self, ids: &[Uuid]) -> DomainResult<Vec<Member>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT {MEMBER_COLUMNS} FROM members WHERE id IN ({})",
            placeholders(ids.len())
        );
        let mut q = sqlx::query_as::<_, MemberRow>(&sql);
        for id in ids {
            q = q.bind(id.to_string());
        }

        let rows = q.fetch_all(&self.pool).await?;
        rows.into_iter().map(|r| r.try_into()).collect()
    }

    async fn list_active_in_tenant(&self, tenant_id: Uuid) -> DomainResult<Vec<Member>> {
        let rows: Vec<MemberRow> = sqlx::query_as(&format!(
            "SELECT {MEMBER_COLUMNS} FROM members WHERE tenant_id = ? AND status = 'active' ORDER BY created_at, id"
        ))
        .bind(tenant_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    async fn block(&self, blocker_id: Uuid, blocked_id: Uuid) -> DomainResult<()> {
        if blocker_id == blocked_id {
            return Err(DomainError::ValidationFailed(
                "a member cannot block themselves".to_string(),
            ));
        }

        let result = sqlx::query(
            r#"INSERT INTO member_blocks (blocker_id, blocked_id, created_at)
               SELECT ?, ?, ?
               WHERE EXISTS (SELECT 1 FROM members WHERE id = ?)
                 AND EXISTS (SELECT 1 FROM members WHERE id = ?)
               ON CONFLICT(blocker_id, blocked_id) DO NOTHING"#,
        )
        .bind(blocker_id.to_string())
        .bind(blocked_id.to_string())
        .bind(format_datetime(Utc::now()))
        .bind(blocker_id.to_string())
        .bind(blocked_id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 && self.get(blocker_id).await?.is_none() {
            return Err(DomainError::not_found("Member", blocker_id));
        }
        if result.rows_affected() == 0 && self.get(blocked_id).await?.is_none() {
            return Err(DomainError::not_found("Member", blocked_id));
        }

        Ok(())
    }

    async fn blocked_relations(&self, user_id: Uuid) -> DomainResult<HashSet<Uuid>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"SELECT blocked_id FROM member_blocks WHERE blocker_id = ?
               UNION
               SELECT blocker_id FROM member_blocks WHERE blocked_id = ?"#,
        )
        .bind(user_id.to_string())
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(|(id,)| parse_uuid(id)).collect()
    }
}

#[derive(sqlx::FromRow)]
struct MemberRow {
    id: String,
    tenant_id: String,
    organization_id: String,
    organization_domain: String,
    display_name: String,
    email: String,
    status: String,
    created_at: String,
}

impl TryFrom<MemberRow> for Member {
    type Error = DomainError;

    fn try_from(row: MemberRow) -> Result<Self, Self::Error> {
        let status = MemberStatus::from_str(&row.status)
            .ok_or_else(|| DomainError::SerializationError(format!("Invalid member status: {}", row.status)))?;

        Ok(Member {
            id: parse_uuid(&row.id)?,
            tenant_id: parse_uuid(&row.tenant_id)?,
            organization_id: parse_uuid(&row.organization_id)?,
            organization_domain: row.organization_domain,
            display_name: row.display_name,
            email: row.email,
            status,
            created_at: parse_datetime(&row.created_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;

    async fn setup_test_repo() -> SqliteMemberRepository {
        let pool = create_migrated_test_pool().await.unwrap();
        SqliteMemberRepository::new(pool)
    }

    fn member(tenant: Uuid, email: &str) -> Member {
        Member::new(tenant, Uuid::new_v4(), "acme.com", "Test Member", email)
    }

    #[tokio::test]
    async fn test_create_and_get_member() {
        let repo = setup_test_repo().await;
        let m = member(Uuid::new_v4(), "a@acme.com");
        repo.create(&m).await.unwrap();

        let retrieved = repo.get(m.id).await.unwrap().unwrap();
        assert_eq!(retrieved.email, "a@acme.com");
        assert_eq!(retrieved.tenant_id, m.tenant_id);
        assert_eq!(retrieved.status, MemberStatus::Active);
    }

    #[tokio::test]
    async fn test_duplicate_email_in_tenant_conflicts() {
        let repo = setup_test_repo().await;
        let tenant = Uuid::new_v4();
        repo.create(&member(tenant, "dup@acme.com")).await.unwrap();

        let err = repo.create(&member(tenant, "dup@acme.com")).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        repo.create(&member(Uuid::new_v4(), "dup@acme.com")).await.unwrap();
    }

    #[tokio::test]
    async fn test_list_active_in_tenant() {
        let repo = setup_test_repo().await;
        let tenant = Uuid::new_v4();
        let active = member(tenant, "a@acme.com");
        let suspended = member(tenant, "s@acme.com").with_status(MemberStatus::Suspended);
        let elsewhere = member(Uuid::new_v4(), "e@acme.com");
        for m in [&active, &suspended, &elsewhere] {
            repo.create(m).await.unwrap();
        }

        let listed = repo.list_active_in_tenant(tenant).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, active.id);
    }

    #[tokio::test]
    async fn test_blocks_are_visible_from_both_sides() {
        let repo = setup_test_repo().await;
        let tenant = Uuid::new_v4();
        let a = member(tenant, "a@acme.com");
        let b = member(tenant, "b@acme.com");
        repo.create(&a).await.unwrap();
        repo.create(&b).await.unwrap();

        repo.block(a.id, b.id).await.unwrap();
        repo.block(a.id, b.id).await.unwrap();

        assert!(repo.blocked_relations(a.id).await.unwrap().contains(&b.id));
        assert!(repo.blocked_relations(b.id).await.unwrap().contains(&a.id));
    }

    #[tokio::test]
    async fn test_block_unknown_member() {
        let repo = setup_test_repo().await;
        let a = member(Uuid::new_v4(), "a@acme.com");
        repo.create(&a).await.unwrap();

        let err = repo.block(a.id, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
        assert!(matches!(repo.block(a.id, a.id).await, Err(DomainError::ValidationFailed(_))));
    }

    #[tokio::test]
    async fn test_get_many_skips_unknown() {
        let repo = setup_test_repo().await;
        let a = member(Uuid::new_v4(), "a@acme.com");
        repo.create(&a).await.unwrap();

        let found = repo.get_many(&[a.id, Uuid::new_v4()]).await.unwrap();
        assert_eq!(found.len(), 1);
        assert!(repo.get_many(&[]).await.unwrap().is_empty());
    }
}
