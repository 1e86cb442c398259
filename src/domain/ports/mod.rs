//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines async trait interfaces that adapters must implement:
//! - EmbeddingProvider: text to vector
//! - VectorStore: one embedding per member plus similarity scoring
//! - MemberRepository / ProfileRepository: member and profile persistence
//! - MatchRepository: match and intro persistence with atomic primitives
//! - JobQueue: durable embedding jobs
//! - IntroNotifier: delivery of mutual introductions

pub mod embedding;
pub mod job_queue;
pub mod match_repository;
pub mod member_repository;
pub mod notifier;
pub mod profile_repository;
pub mod vector_store;

pub use embedding::EmbeddingProvider;
pub use job_queue::JobQueue;
pub use match_repository::MatchRepository;
pub use member_repository::MemberRepository;
pub use notifier::{IntroContext, IntroNotifier};
pub use profile_repository::ProfileRepository;
pub use vector_store::VectorStore;
