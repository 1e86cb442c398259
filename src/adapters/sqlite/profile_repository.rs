//! SQLite implementation of the ProfileRepository.

use async_trait::async_trait;
use sqlx::SqlitePool;
use std::collections::HashMap;
use uuid::Uuid;

use super::{format_datetime, parse_datetime, parse_uuid, placeholders};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ConnectionType, Profile};
use crate::domain::ports::ProfileRepository;

const PROFILE_COLUMNS: &str =
    "id, user_id, niche_interest, project, rabbit_hole, connection_type, created_at, updated_at";

#[derive(Clone)]
pub struct SqliteProfileRepository {
    pool: SqlitePool,
}

impl SqliteProfileRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileRepository for SqliteProfileRepository {
    async fn create(&self, profile: &Profile) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT INTO profiles (id, user_id, niche_interest, project, rabbit_hole, connection_type, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(profile.id.to_string())
        .bind(profile.user_id.to_string())
        .bind(&profile.niche_interest)
        .bind(&profile.project)
        .bind(&profile.rabbit_hole)
        .bind(profile.connection_type.as_str())
        .bind(format_datetime(profile.created_at))
        .bind(format_datetime(profile.updated_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, profile: &Profile) -> DomainResult<()> {
        let result = sqlx::query(
            r#"UPDATE profiles SET niche_interest = ?, project = ?, rabbit_hole = ?,
               connection_type = ?, updated_at = ?
               WHERE id = ?"#,
        )
        .bind(&profile.niche_interest)
        .bind(&profile.project)
        .bind(&profile.rabbit_hole)
        .bind(profile.connection_type.as_str())
        .bind(format_datetime(profile.updated_at))
        .bind(profile.id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("Profile", profile.id));
        }

        Ok(())
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<Profile>> {
        let row: Option<ProfileRow> =
            sqlx::query_as(&format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = ?"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;

        row.map(|r| r.try_into()).transpose()
    }

    async fn get_by_user(&self, user_id: Uuid) -> DomainResult<Option<Profile>> {
        let row: Option<ProfileRow> =
            sqlx::query_as(&format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE user_id = ?"))
                .bind(user_id.to_string())
                .fetch_optional(&self.pool)
                .await?;

        row.map(|r| r.try_into()).transpose()
    }

    async fn get_many_by_users(&self, user_ids: &[Uuid]) -> DomainResult<HashMap<Uuid, Profile>> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let sql = format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE user_id IN ({})",
            placeholders(user_ids.len())
        );
        let mut q = sqlx::query_as::<_, ProfileRow>(&sql);
        for id in user_ids {
            q = q.bind(id.to_string());
        }

        let rows = q.fetch_all(&self.pool).await?;
        rows.into_iter()
            .map(|r| Profile::try_from(r).map(|p| (p.user_id, p)))
            .collect()
    }
}

#[derive(sqlx::FromRow)]
struct ProfileRow {
    id: String,
    user_id: String,
    niche_interest: String,
    project: String,
    rabbit_hole: Option<String>,
    connection_type: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = DomainError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let connection_type = ConnectionType::from_str(&row.connection_type).ok_or_else(|| {
            DomainError::SerializationError(format!("Invalid connection type: {}", row.connection_type))
        })?;

        Ok(Profile {
            id: parse_uuid(&row.id)?,
            user_id: parse_uuid(&row.user_id)?,
            niche_interest: row.niche_interest,
            project: row.project,
            rabbit_hole: row.rabbit_hole,
            connection_type,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
        })
    }
}
