//! Embedding worker commands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use crate::cli::context::AppContext;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;

#[derive(Args, Debug)]
pub struct WorkerArgs {
    #[command(subcommand)]
    pub command: WorkerCommands,
}

#[derive(Subcommand, Debug)]
pub enum WorkerCommands {
    /// Run embedding workers
    Run {
        /// Process everything queued, then exit
        #[arg(long)]
        drain: bool,
        /// Override the configured worker count
        #[arg(short, long)]
        workers: Option<usize>,
    },
}

#[derive(Debug, serde::Serialize)]
pub struct DrainOutput {
    pub completed: usize,
    pub failed: usize,
}

impl CommandOutput for DrainOutput {
    fn to_human(&self) -> String {
        format!("Drained embedding queue: {} completed, {} failed", self.completed, self.failed)
    }
}

pub async fn execute(args: WorkerArgs, mut config: Config, json_mode: bool) -> Result<()> {
    match args.command {
        WorkerCommands::Run { drain, workers } => {
            if let Some(workers) = workers {
                config.jobs.workers = workers;
            }
            let ctx = AppContext::open(config).await?;
            let pool = ctx.worker_pool()?;

            if drain {
                let report = pool.drain().await.context("Failed to drain embedding queue")?;
                output(
                    &DrainOutput {
                        completed: report.completed,
                        failed: report.failed,
                    },
                    json_mode,
                );
                return Ok(());
            }

            tracing::info!(workers = ctx.config.jobs.workers, "starting embedding workers");
            let handle = pool.spawn().await.context("Failed to start embedding workers")?;
            if !json_mode {
                println!("Embedding workers running. Press Ctrl+C to stop.");
            }

            tokio::signal::ctrl_c().await.context("Failed to listen for Ctrl+C")?;
            tracing::info!("shutdown requested, waiting for in-flight jobs");
            handle.shutdown().await;
        }
    }

    Ok(())
}
