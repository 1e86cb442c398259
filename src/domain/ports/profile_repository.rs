//! Profile repository port.

use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::Profile;

/// Repository interface for Profile persistence.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Create a profile. A second profile for the same member is a `Conflict`.
    async fn create(&self, profile: &Profile) -> DomainResult<()>;

    /// Update an existing profile.
    async fn update(&self, profile: &Profile) -> DomainResult<()>;

    /// Get a profile by ID.
    async fn get(&self, id: Uuid) -> DomainResult<Option<Profile>>;

    /// Get the profile owned by a member.
    async fn get_by_user(&self, user_id: Uuid) -> DomainResult<Option<Profile>>;

    /// Profiles for the given members, keyed by member ID.
    async fn get_many_by_users(&self, user_ids: &[Uuid]) -> DomainResult<HashMap<Uuid, Profile>>;
}
