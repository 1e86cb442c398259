//! Match generation pipeline.
//!
//! retrieve -> filter -> score -> rank -> explain. Read-only over shared
//! state; any stage failing fails the request.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    GenerateMatchesRequest, GenerateMatchesResponse, MatchSuggestion, MatchingConfig,
};
use crate::domain::ports::{MatchRepository, MemberRepository, ProfileRepository, VectorStore};
use crate::services::candidate_retriever::CandidateRetriever;
use crate::services::filters::FilterChain;
use crate::services::ranking::{DiversityRanker, RankingStrategy, ScoredCandidate};
use crate::services::reasons::generate_reasons;
use crate::services::similarity::{CosineSimilarity, SimilarityStrategy};

pub struct MatchingService {
    members: Arc<dyn MemberRepository>,
    profiles: Arc<dyn ProfileRepository>,
    retriever: CandidateRetriever,
    filters: FilterChain,
    similarity: Box<dyn SimilarityStrategy>,
    ranker: Box<dyn RankingStrategy>,
    diversity_weight: f32,
}

impl MatchingService {
    /// Standard pipeline: cosine similarity, the three eligibility filters
    /// and diversity ranking.
    pub fn new(
        members: Arc<dyn MemberRepository>,
        profiles: Arc<dyn ProfileRepository>,
        vectors: Arc<dyn VectorStore>,
        matches: Arc<dyn MatchRepository>,
        config: &MatchingConfig,
    ) -> Self {
        Self {
            retriever: CandidateRetriever::new(members.clone(), vectors.clone(), config.candidate_cap),
            filters: FilterChain::standard(members.clone(), matches),
            similarity: Box::new(CosineSimilarity::new(vectors)),
            ranker: Box::new(DiversityRanker),
            diversity_weight: config.diversity_weight,
            members,
            profiles,
        }
    }

    pub fn with_filters(mut self, filters: FilterChain) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_similarity(mut self, similarity: Box<dyn SimilarityStrategy>) -> Self {
        self.similarity = similarity;
        self
    }

    pub fn with_ranker(mut self, ranker: Box<dyn RankingStrategy>) -> Self {
        self.ranker = ranker;
        self
    }

    #[instrument(skip(self, request), fields(user_id = %request.user_id))]
    pub async fn generate_matches(&self, request: &GenerateMatchesRequest) -> DomainResult<GenerateMatchesResponse> {
        request.validate()?;
        let weight = request.diversity_weight.unwrap_or(self.diversity_weight);

        let pool = self.retriever.retrieve(request.user_id, &self.filters).await?;
        let source_profile = self
            .profiles
            .get_by_user(request.user_id)
            .await?
            .filter(|p| p.is_complete())
            .ok_or_else(|| {
                DomainError::PreconditionFailed(format!("member {} has no completed profile", request.user_id))
            })?;

        let eligible = pool.candidate_ids;
        if eligible.is_empty() {
            tracing::debug!("no eligible candidates");
            return Ok(GenerateMatchesResponse::default());
        }

        let scores = self.similarity.score(&pool.source_vector, &eligible).await?;
        let (members, mut profiles) = futures::try_join!(
            self.members.get_many(&eligible),
            self.profiles.get_many_by_users(&eligible),
        )?;
        let mut members: HashMap<_, _> = members.into_iter().map(|m| (m.id, m)).collect();

        let mut scored = Vec::with_capacity(eligible.len());
        for id in &eligible {
            let similarity = *scores
                .get(id)
                .ok_or_else(|| DomainError::InvalidVectorFormat(format!("no similarity score for candidate {id}")))?;
            let member = members.remove(id).ok_or_else(|| DomainError::not_found("Member", id))?;
            if similarity >= request.min_similarity_score {
                scored.push(ScoredCandidate {
                    member,
                    profile: profiles.remove(id),
                    similarity,
                });
            }
        }

        let mut ranked = self.ranker.rank(&pool.source, Some(&source_profile), scored, weight)?;
        ranked.truncate(request.limit);

        let matches: Vec<MatchSuggestion> = ranked
            .into_iter()
            .map(|r| MatchSuggestion {
                candidate_id: r.member.id,
                similarity_score: r.similarity_score,
                diversity_score: r.diversity_score,
                final_score: r.final_score,
                reasons: generate_reasons(&source_profile, r.profile.as_ref()),
            })
            .collect();

        tracing::info!(suggestions = matches.len(), weight, "generated matches");
        Ok(GenerateMatchesResponse { matches })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryVectorStore;
    use crate::adapters::sqlite::{
        create_migrated_test_pool, SqliteMatchRepository, SqliteMemberRepository, SqliteProfileRepository,
    };
    use crate::domain::models::{ConnectionType, Member, Profile};
    use uuid::Uuid;

    struct Fixture {
        service: MatchingService,
        matches: Arc<SqliteMatchRepository>,
        members: Arc<SqliteMemberRepository>,
        profiles: Arc<SqliteProfileRepository>,
        vectors: Arc<InMemoryVectorStore>,
        tenant: Uuid,
    }

    async fn fixture() -> Fixture {
        let pool = create_migrated_test_pool().await.unwrap();
        let members = Arc::new(SqliteMemberRepository::new(pool.clone()));
        let profiles = Arc::new(SqliteProfileRepository::new(pool.clone()));
        let vectors = Arc::new(InMemoryVectorStore::new());
        let matches = Arc::new(SqliteMatchRepository::new(pool));
        let service = MatchingService::new(
            members.clone(),
            profiles.clone(),
            vectors.clone(),
            matches.clone(),
            &MatchingConfig::default(),
        );
        Fixture {
            service,
            matches,
            members,
            profiles,
            vectors,
            tenant: Uuid::new_v4(),
        }
    }

    fn fixture_service(f: &Fixture) -> MatchingService {
        MatchingService::new(
            f.members.clone(),
            f.profiles.clone(),
            f.vectors.clone(),
            f.matches.clone(),
            &MatchingConfig::default(),
        )
    }

    impl Fixture {
        async fn member(&self, vector: Option<&[f32]>, with_profile: bool) -> Member {
            let m = Member::new(self.tenant, Uuid::new_v4(), "example.com", "M", format!("{}@example.com", Uuid::new_v4()));
            self.members.create(&m).await.unwrap();
            if with_profile {
                let p = Profile::new(m.id, "soil science", "urban gardens", ConnectionType::Collaboration);
                self.profiles.create(&p).await.unwrap();
            }
            if let Some(v) = vector {
                self.vectors.upsert(m.id, v).await.unwrap();
            }
            m
        }
    }

    #[tokio::test]
    async fn test_source_without_embedding() {
        let f = fixture().await;
        let source = f.member(None, true).await;
        let err = f
            .service
            .generate_matches(&GenerateMatchesRequest::new(source.id))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NoEmbedding(id) if id == source.id));
    }

    #[tokio::test]
    async fn test_source_without_profile() {
        let f = fixture().await;
        let source = f.member(Some(&[1.0, 0.0]), false).await;
        f.member(Some(&[1.0, 0.0]), true).await;
        let err = f
            .service
            .generate_matches(&GenerateMatchesRequest::new(source.id))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::PreconditionFailed(_)));
    }

    #[tokio::test]
    async fn test_min_similarity_and_limit() {
        let f = fixture().await;
        let source = f.member(Some(&[1.0, 0.0]), true).await;
        let close = f.member(Some(&[0.9, 0.1]), true).await;
        f.member(Some(&[0.0, 1.0]), true).await;
        f.member(Some(&[0.8, 0.3]), true).await;

        let response = f
            .service
            .generate_matches(&GenerateMatchesRequest::new(source.id).with_min_similarity(0.5).with_limit(1))
            .await
            .unwrap();

        assert_eq!(response.matches.len(), 1);
        assert_eq!(response.matches[0].candidate_id, close.id);
        assert!(!response.matches[0].reasons.is_empty());
    }

    struct ForgetfulSimilarity;

    #[async_trait::async_trait]
    impl SimilarityStrategy for ForgetfulSimilarity {
        async fn score(&self, _source: &[f32], _candidate_ids: &[Uuid]) -> DomainResult<HashMap<Uuid, f32>> {
            Ok(HashMap::new())
        }
    }

    #[tokio::test]
    async fn test_unscored_candidate_fails_the_request() {
        let f = fixture().await;
        let source = f.member(Some(&[1.0, 0.0]), true).await;
        f.member(Some(&[0.9, 0.1]), true).await;

        let service = fixture_service(&f).with_similarity(Box::new(ForgetfulSimilarity));
        let err = service
            .generate_matches(&GenerateMatchesRequest::new(source.id))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidVectorFormat(_)));
    }

    #[tokio::test]
    async fn test_invalid_request_is_rejected_before_lookup() {
        let f = fixture().await;
        let err = f
            .service
            .generate_matches(&GenerateMatchesRequest::new(Uuid::new_v4()).with_limit(0))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::ValidationFailed(_)));
    }
}
