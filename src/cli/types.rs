//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::commands::{
    init::InitArgs, matching::MatchArgs, member::MemberArgs, profile::ProfileArgs, worker::WorkerArgs,
};

#[derive(Parser)]
#[command(name = "kindred")]
#[command(about = "Kindred - embedding-based introductions between members", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Load configuration from this file instead of kindred.yaml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write kindred.yaml and create the database
    Init(InitArgs),

    /// Member seeding commands
    Member(MemberArgs),

    /// Profile management commands
    Profile(ProfileArgs),

    /// Embedding worker commands
    Worker(WorkerArgs),

    /// Match suggestion and intro commands
    Match(MatchArgs),
}
