//! Implementation of the `kindred init` command.

use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};

use crate::adapters::sqlite::initialize_database;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;
use crate::infrastructure::config::PROJECT_CONFIG_FILE;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing kindred.yaml
    #[arg(long, short)]
    pub force: bool,
}

#[derive(Debug, serde::Serialize)]
pub struct InitOutput {
    pub success: bool,
    pub message: String,
    pub config_path: PathBuf,
    pub config_written: bool,
    pub database_path: String,
}

impl CommandOutput for InitOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![self.message.clone()];
        if self.config_written {
            lines.push(format!("Wrote {}", self.config_path.display()));
        }
        lines.push(format!("Database ready at {}", self.database_path));
        lines.join("\n")
    }
}

pub async fn execute(args: InitArgs, config: &Config, json_mode: bool) -> Result<()> {
    let config_path = Path::new(PROJECT_CONFIG_FILE).to_path_buf();

    let config_written = if config_path.exists() && !args.force {
        false
    } else {
        let yaml = serde_yaml::to_string(config).context("Failed to serialize configuration")?;
        tokio::fs::write(&config_path, yaml)
            .await
            .with_context(|| format!("Failed to write {}", config_path.display()))?;
        true
    };

    initialize_database(&config.database)
        .await
        .context("Failed to initialize database")?;

    let message = if config_written {
        "Project initialized successfully."
    } else {
        "Configuration already present, database migrated. Use --force to rewrite kindred.yaml."
    };

    output(
        &InitOutput {
            success: true,
            message: message.to_string(),
            config_path,
            config_written,
            database_path: config.database.path.clone(),
        },
        json_mode,
    );
    Ok(())
}
