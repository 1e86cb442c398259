//! Kindred - embedding-based introductions between members
//!
//! Members describe a niche interest, a current project and the kind of
//! connection they want. Each profile is embedded in the background; match
//! generation retrieves same-tenant candidates by cosine similarity, filters
//! out prior pairs, blocks and cross-tenant members, then reranks for
//! diversity. Accepting a suggestion from both sides produces an intro.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Models, errors and the ports adapters implement
//! - **Adapter Layer** (`adapters`): SQLite storage, embedding providers, notifiers
//! - **Service Layer** (`services`): Matching pipeline, intro state machine, workers
//! - **Infrastructure Layer** (`infrastructure`): Configuration and logging
//! - **CLI Layer** (`cli`): Command-line interface

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

pub use domain::models::{
    AcceptOutcome, Config, ConnectionType, GenerateMatchesRequest, GenerateMatchesResponse, Match,
    MatchCandidate, MatchStatus, MatchSuggestion, Member, PassOutcome, Profile,
};
pub use domain::{DomainError, DomainResult};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    EmbeddingWorker, EmbeddingWorkerPool, IntroOrchestrator, MatchingService, ProfileService,
};
