//! Infrastructure layer module
//!
//! Process-level concerns shared by the CLI and any other host:
//! - Configuration management
//! - Logging infrastructure

pub mod config;
pub mod logging;
