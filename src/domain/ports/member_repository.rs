//! Member repository port.

use async_trait::async_trait;
use std::collections::HashSet;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::Member;

/// Read access to provisioned members and their block relations.
#[async_trait]
pub trait MemberRepository: Send + Sync {
    /// Create a member. A duplicate email inside a tenant is a `Conflict`.
    async fn create(&self, member: &Member) -> DomainResult<()>;

    /// Get a member by ID.
    async fn get(&self, id: Uuid) -> DomainResult<Option<Member>>;

    /// Get every member whose ID is in `ids`. Unknown IDs are skipped.
    async fn get_many(&self, ids: &[Uuid]) -> DomainResult<Vec<Member>>;

    /// Active members of a tenant, oldest first.
    async fn list_active_in_tenant(&self, tenant_id: Uuid) -> DomainResult<Vec<Member>>;

    /// Record that `blocker_id` blocked `blocked_id`. Repeating is a no-op.
    async fn block(&self, blocker_id: Uuid, blocked_id: Uuid) -> DomainResult<()>;

    /// Members with a block in either direction with `user_id`.
    async fn blocked_relations(&self, user_id: Uuid) -> DomainResult<HashSet<Uuid>>;
}
