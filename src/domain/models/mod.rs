pub mod config;
pub mod contracts;
pub mod embedding;
pub mod matching;
pub mod member;
pub mod profile;

pub use config::{
    Config, DatabaseConfig, EmbeddingConfig, JobsConfig, LoggingConfig, MatchingConfig,
};
pub use contracts::{
    AcceptOutcome, AcceptStatus, GenerateMatchesRequest, GenerateMatchesResponse, MatchCandidate,
    MatchSuggestion, PassOutcome, PassStatus, validate_unit_interval, DEFAULT_MATCH_LIMIT,
    MAX_MATCH_LIMIT,
};
pub use embedding::{
    bytes_to_vector, cosine_similarity, vector_to_bytes, Embedding, EmbeddingJob,
    EmbeddingJobPayload, EmbeddingStatus, JobOptions, JobStatus,
};
pub use matching::{
    Intro, IntroSideStatus, IntroStatus, Match, MatchScores, MatchStatus, PairKey,
};
pub use member::{ContactCard, Member, MemberStatus};
pub use profile::{ConnectionType, Profile, ProfileUpdate};
