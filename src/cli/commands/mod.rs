//! CLI command implementations.

pub mod init;
pub mod matching;
pub mod member;
pub mod profile;
pub mod worker;
