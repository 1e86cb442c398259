//! In-process adapters.

pub mod vector_store;

pub use vector_store::InMemoryVectorStore;
