//! Profile domain model.
//!
//! A profile holds the free-text answers that get embedded, plus the kind
//! of connection the member is looking for.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kind of connection a member would like to make.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionType {
    Mentorship,
    Collaboration,
    Friendship,
    Networking,
}

impl ConnectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mentorship => "mentorship",
            Self::Collaboration => "collaboration",
            Self::Friendship => "friendship",
            Self::Networking => "networking",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "mentorship" | "mentor" => Some(Self::Mentorship),
            "collaboration" | "collab" => Some(Self::Collaboration),
            "friendship" | "friend" => Some(Self::Friendship),
            "networking" => Some(Self::Networking),
            _ => None,
        }
    }
}

impl std::fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A member's matching profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub niche_interest: String,
    pub project: String,
    pub rabbit_hole: Option<String>,
    pub connection_type: ConnectionType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn new(
        user_id: Uuid,
        niche_interest: impl Into<String>,
        project: impl Into<String>,
        connection_type: ConnectionType,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            niche_interest: niche_interest.into(),
            project: project.into(),
            rabbit_hole: None,
            connection_type,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_rabbit_hole(mut self, rabbit_hole: impl Into<String>) -> Self {
        self.rabbit_hole = Some(rabbit_hole.into());
        self
    }

    /// A profile can be ranked once both required answers are filled in.
    pub fn is_complete(&self) -> bool {
        !self.niche_interest.trim().is_empty() && !self.project.trim().is_empty()
    }

    /// The text handed to the embedding provider.
    pub fn semantic_text(&self) -> String {
        let mut parts = vec![self.niche_interest.trim(), self.project.trim()];
        if let Some(rabbit_hole) = self.rabbit_hole.as_deref() {
            parts.push(rabbit_hole.trim());
        }
        parts
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Apply an update, returning whether any embedded field changed.
    pub fn apply(&mut self, update: ProfileUpdate) -> bool {
        let before = self.semantic_text();

        if let Some(niche_interest) = update.niche_interest {
            self.niche_interest = niche_interest;
        }
        if let Some(project) = update.project {
            self.project = project;
        }
        if let Some(rabbit_hole) = update.rabbit_hole {
            self.rabbit_hole = rabbit_hole.filter(|r| !r.trim().is_empty());
        }
        if let Some(connection_type) = update.connection_type {
            self.connection_type = connection_type;
        }
        self.updated_at = Utc::now();

        before != self.semantic_text()
    }
}

/// Partial profile update. `rabbit_hole: Some(None)` clears the field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub niche_interest: Option<String>,
    pub project: Option<String>,
    pub rabbit_hole: Option<Option<String>>,
    pub connection_type: Option<ConnectionType>,
}
