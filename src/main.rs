//! Kindred CLI entry point.

use anyhow::Context;
use clap::Parser;

use kindred::cli::{commands, handle_error, Cli, Commands};
use kindred::infrastructure::config::ConfigLoader;
use kindred::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
    .context("Failed to load configuration");
    let config = match config {
        Ok(config) => config,
        Err(err) => handle_error(err, cli.json),
    };

    let _logger = match LoggerImpl::init(&LogConfig::from(&config.logging)) {
        Ok(logger) => logger,
        Err(err) => handle_error(err, cli.json),
    };

    let result = match cli.command {
        Commands::Init(args) => commands::init::execute(args, &config, cli.json).await,
        Commands::Member(args) => commands::member::execute(args, config, cli.json).await,
        Commands::Profile(args) => commands::profile::execute(args, config, cli.json).await,
        Commands::Worker(args) => commands::worker::execute(args, config, cli.json).await,
        Commands::Match(args) => commands::matching::execute(args, config, cli.json).await,
    };

    if let Err(err) = result {
        handle_error(err, cli.json);
    }
}
