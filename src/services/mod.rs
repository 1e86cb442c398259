pub mod candidate_retriever;
pub mod embedding_worker;
pub mod filters;
pub mod intro_orchestrator;
pub mod matching_service;
pub mod profile_service;
pub mod ranking;
pub mod reasons;
pub mod similarity;

pub use candidate_retriever::{CandidatePool, CandidateRetriever, DEFAULT_CANDIDATE_CAP};
pub use embedding_worker::{
    retry_schedule, DrainReport, EmbeddingWorker, EmbeddingWorkerPool, JobOutcome, JobReport,
    WorkerPoolHandle,
};
pub use filters::{
    ActiveMemberFilter, BlocklistFilter, CandidateFilter, FilterChain, PriorPairFilter, TenantIsolationFilter,
};
pub use intro_orchestrator::IntroOrchestrator;
pub use matching_service::MatchingService;
pub use profile_service::ProfileService;
pub use ranking::{
    diversity_score, final_score, DiversityRanker, RankedCandidate, RankingStrategy,
    ScoredCandidate, DEFAULT_DIVERSITY_WEIGHT,
};
pub use reasons::{generate_reasons, tokenize, FALLBACK_REASON};
pub use similarity::{clamp_score, CosineSimilarity, SimilarityStrategy};
