//! Eligibility filters applied to a candidate list.
//!
//! Each filter only removes ids, so the chain's result is the same in any
//! order. Survivors keep their input order.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::Member;
use crate::domain::ports::{MatchRepository, MemberRepository};

#[async_trait]
pub trait CandidateFilter: Send + Sync {
    fn name(&self) -> &'static str;

    /// Return the subset of `candidates` that survives this filter.
    async fn apply(&self, source: &Member, candidates: Vec<Uuid>) -> DomainResult<Vec<Uuid>>;
}

fn without(candidates: Vec<Uuid>, excluded: &HashSet<Uuid>) -> Vec<Uuid> {
    candidates.into_iter().filter(|id| !excluded.contains(id)).collect()
}

/// Drops anyone the source already shares a match with, in any status.
pub struct PriorPairFilter {
    matches: Arc<dyn MatchRepository>,
}

impl PriorPairFilter {
    pub fn new(matches: Arc<dyn MatchRepository>) -> Self {
        Self { matches }
    }
}

#[async_trait]
impl CandidateFilter for PriorPairFilter {
    fn name(&self) -> &'static str {
        "prior_pair"
    }

    async fn apply(&self, source: &Member, candidates: Vec<Uuid>) -> DomainResult<Vec<Uuid>> {
        let partners = self.matches.partner_ids(source.id).await?;
        Ok(without(candidates, &partners))
    }
}

/// Drops anyone with a block in either direction.
pub struct BlocklistFilter {
    members: Arc<dyn MemberRepository>,
}

impl BlocklistFilter {
    pub fn new(members: Arc<dyn MemberRepository>) -> Self {
        Self { members }
    }
}

#[async_trait]
impl CandidateFilter for BlocklistFilter {
    fn name(&self) -> &'static str {
        "blocklist"
    }

    async fn apply(&self, source: &Member, candidates: Vec<Uuid>) -> DomainResult<Vec<Uuid>> {
        let blocked = self.members.blocked_relations(source.id).await?;
        Ok(without(candidates, &blocked))
    }
}

/// Drops anyone outside the source's tenant, and ids with no member record.
pub struct TenantIsolationFilter {
    members: Arc<dyn MemberRepository>,
}

impl TenantIsolationFilter {
    pub fn new(members: Arc<dyn MemberRepository>) -> Self {
        Self { members }
    }
}

#[async_trait]
impl CandidateFilter for TenantIsolationFilter {
    fn name(&self) -> &'static str {
        "tenant_isolation"
    }

    async fn apply(&self, source: &Member, candidates: Vec<Uuid>) -> DomainResult<Vec<Uuid>> {
        let same_tenant: HashSet<Uuid> = self
            .members
            .get_many(&candidates)
            .await?
            .into_iter()
            .filter(|m| m.tenant_id == source.tenant_id)
            .map(|m| m.id)
            .collect();

        Ok(candidates.into_iter().filter(|id| same_tenant.contains(id)).collect())
    }
}

/// Drops members who are not active, and ids with no member record.
pub struct ActiveMemberFilter {
    members: Arc<dyn MemberRepository>,
}

impl ActiveMemberFilter {
    pub fn new(members: Arc<dyn MemberRepository>) -> Self {
        Self { members }
    }
}

#[async_trait]
impl CandidateFilter for ActiveMemberFilter {
    fn name(&self) -> &'static str {
        "active_member"
    }

    async fn apply(&self, _source: &Member, candidates: Vec<Uuid>) -> DomainResult<Vec<Uuid>> {
        let active: HashSet<Uuid> = self
            .members
            .get_many(&candidates)
            .await?
            .into_iter()
            .filter(Member::is_active)
            .map(|m| m.id)
            .collect();

        Ok(candidates.into_iter().filter(|id| active.contains(id)).collect())
    }
}

/// Filters applied in sequence, stopping as soon as nobody is left.
pub struct FilterChain {
    filters: Vec<Box<dyn CandidateFilter>>,
}

impl FilterChain {
    pub fn new(filters: Vec<Box<dyn CandidateFilter>>) -> Self {
        Self { filters }
    }

    /// Prior-pair, blocklist and tenant isolation.
    pub fn standard(members: Arc<dyn MemberRepository>, matches: Arc<dyn MatchRepository>) -> Self {
        let filters: Vec<Box<dyn CandidateFilter>> = vec![
            Box::new(PriorPairFilter::new(matches)),
            Box::new(BlocklistFilter::new(members.clone())),
            Box::new(TenantIsolationFilter::new(members)),
        ];
        Self::new(filters)
    }

    /// Checks that still apply once a pair already has a match row:
    /// blocklist, tenant isolation and active status.
    pub fn pair_eligibility(members: Arc<dyn MemberRepository>) -> Self {
        let filters: Vec<Box<dyn CandidateFilter>> = vec![
            Box::new(BlocklistFilter::new(members.clone())),
            Box::new(TenantIsolationFilter::new(members.clone())),
            Box::new(ActiveMemberFilter::new(members)),
        ];
        Self::new(filters)
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub async fn apply(&self, source: &Member, mut candidates: Vec<Uuid>) -> DomainResult<Vec<Uuid>> {
        for filter in &self.filters {
            if candidates.is_empty() {
                break;
            }
            let before = candidates.len();
            candidates = filter.apply(source, candidates).await?;
            tracing::debug!(filter = filter.name(), removed = before - candidates.len(), "candidate filter applied");
        }
        Ok(candidates)
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    struct ExcludeSet(HashSet<Uuid>);

    #[async_trait]
    impl CandidateFilter for ExcludeSet {
        fn name(&self) -> &'static str {
            "exclude_set"
        }

        async fn apply(&self, _source: &Member, candidates: Vec<Uuid>) -> DomainResult<Vec<Uuid>> {
            Ok(without(candidates, &self.0))
        }
    }

    fn run(chain: &FilterChain, source: &Member, ids: Vec<Uuid>) -> Vec<Uuid> {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(chain.apply(source, ids))
            .unwrap()
    }

    proptest! {
        #[test]
        fn proptest_filter_order_does_not_matter(
            n in 0usize..40,
            masks in prop::collection::vec(prop::collection::vec(any::<bool>(), 40), 3),
        ) {
            let ids: Vec<Uuid> = (0..n).map(|_| Uuid::new_v4()).collect();
            let sets: Vec<HashSet<Uuid>> = masks
                .iter()
                .map(|mask| ids.iter().zip(mask).filter(|(_, m)| **m).map(|(id, _)| *id).collect())
                .collect();
            let source = Member::new(Uuid::new_v4(), Uuid::new_v4(), "a.com", "S", "s@a.com");

            let forward = FilterChain::new(sets.iter().cloned().map(|s| Box::new(ExcludeSet(s)) as Box<dyn CandidateFilter>).collect());
            let reverse = FilterChain::new(sets.iter().rev().cloned().map(|s| Box::new(ExcludeSet(s)) as Box<dyn CandidateFilter>).collect());

            let a = run(&forward, &source, ids.clone());
            let b = run(&reverse, &source, ids.clone());
            prop_assert_eq!(&a, &b);
            for id in &a {
                prop_assert!(sets.iter().all(|s| !s.contains(id)));
            }
        }
    }
}
