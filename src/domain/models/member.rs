//! Member domain model.
//!
//! Members are provisioned by an external directory. The matching core
//! only reads them, plus the block relations members maintain themselves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a member account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    Active,
    Inactive,
    Suspended,
}

impl Default for MemberStatus {
    fn default() -> Self {
        Self::Active
    }
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Suspended => "suspended",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            "suspended" => Some(Self::Suspended),
            _ => None,
        }
    }
}

/// A member of a tenant who can be matched with other members.
///
/// `tenant_id` is the isolation boundary (the customer account). The
/// organization fields describe the member's affiliation inside the tenant
/// and feed the diversity heuristic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub organization_id: Uuid,
    pub organization_domain: String,
    pub display_name: String,
    pub email: String,
    pub status: MemberStatus,
    pub created_at: DateTime<Utc>,
}

impl Member {
    pub fn new(
        tenant_id: Uuid,
        organization_id: Uuid,
        organization_domain: impl Into<String>,
        display_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            organization_id,
            organization_domain: organization_domain.into().to_lowercase(),
            display_name: display_name.into(),
            email: email.into(),
            status: MemberStatus::Active,
            created_at: Utc::now(),
        }
    }

    pub fn with_status(mut self, status: MemberStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == MemberStatus::Active
    }

    /// Contact details shared with the other party of an introduction.
    pub fn contact_card(&self) -> ContactCard {
        ContactCard {
            user_id: self.id,
            display_name: self.display_name.clone(),
            email: self.email.clone(),
        }
    }
}

/// What one party of a mutual match learns about the other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactCard {
    pub user_id: Uuid,
    pub display_name: String,
    pub email: String,
}
