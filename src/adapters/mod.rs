//! Infrastructure adapters for external systems.

pub mod embeddings;
pub mod memory;
pub mod notifications;
pub mod sqlite;
