//! Profile commands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use uuid::Uuid;

use crate::cli::context::AppContext;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Config, ConnectionType, EmbeddingJob, EmbeddingStatus, Profile, ProfileUpdate};

#[derive(Args, Debug)]
pub struct ProfileArgs {
    #[command(subcommand)]
    pub command: ProfileCommands,
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// Create or update a member's profile
    Set {
        /// Member ID
        user: Uuid,
        /// Niche interest
        #[arg(short, long)]
        interest: Option<String>,
        /// Current project
        #[arg(short, long)]
        project: Option<String>,
        /// Rabbit hole (pass an empty string to clear)
        #[arg(short, long)]
        rabbit_hole: Option<String>,
        /// Connection type (mentorship, collaboration, friendship, networking)
        #[arg(short, long)]
        connection: Option<String>,
    },
    /// Show a profile and its embedding status
    Status {
        /// Member ID
        user: Uuid,
    },
}

#[derive(Debug, serde::Serialize)]
pub struct ProfileOutput {
    pub profile: Profile,
    pub embedding_status: Option<EmbeddingStatus>,
    pub attempts: Option<u32>,
    pub last_error: Option<String>,
}

impl ProfileOutput {
    fn new(profile: Profile, job: Option<EmbeddingJob>) -> Self {
        Self {
            profile,
            embedding_status: job.as_ref().map(|j| j.status.into()),
            attempts: job.as_ref().map(|j| j.attempts),
            last_error: job.and_then(|j| j.last_error),
        }
    }
}

impl CommandOutput for ProfileOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![
            format!("Profile for {}", self.profile.user_id),
            format!("Niche interest: {}", self.profile.niche_interest),
            format!("Project: {}", self.profile.project),
        ];
        if let Some(rabbit_hole) = &self.profile.rabbit_hole {
            lines.push(format!("Rabbit hole: {rabbit_hole}"));
        }
        lines.push(format!("Looking for: {}", self.profile.connection_type));

        match self.embedding_status {
            Some(status) => {
                lines.push(format!("Embedding: {status} (attempts: {})", self.attempts.unwrap_or(0)));
            }
            None => lines.push("Embedding: not requested".to_string()),
        }
        if let Some(err) = &self.last_error {
            lines.push(format!("Last error: {err}"));
        }
        lines.join("\n")
    }
}

fn parse_connection(value: &str) -> Result<ConnectionType> {
    ConnectionType::from_str(value).ok_or_else(|| anyhow::anyhow!("Invalid connection type: {value}"))
}

pub async fn execute(args: ProfileArgs, config: Config, json_mode: bool) -> Result<()> {
    let ctx = AppContext::open(config).await?;
    let service = ctx.profile_service();

    match args.command {
        ProfileCommands::Set { user, interest, project, rabbit_hole, connection } => {
            let connection = connection.as_deref().map(parse_connection).transpose()?;

            let profile = if service.get_profile(user).await?.is_some() {
                let update = ProfileUpdate {
                    niche_interest: interest,
                    project,
                    rabbit_hole: rabbit_hole.map(|r| Some(r).filter(|r| !r.trim().is_empty())),
                    connection_type: connection,
                };
                service.update_profile(user, update).await.context("Failed to update profile")?
            } else {
                let interest = interest.ok_or_else(|| anyhow::anyhow!("--interest is required for a new profile"))?;
                let project = project.ok_or_else(|| anyhow::anyhow!("--project is required for a new profile"))?;
                service
                    .create_profile(user, interest, project, rabbit_hole, connection.unwrap_or(ConnectionType::Collaboration))
                    .await
                    .context("Failed to create profile")?
            };

            let job = service.latest_job(user).await?;
            output(&ProfileOutput::new(profile, job), json_mode);
        }
        ProfileCommands::Status { user } => {
            let profile = service
                .get_profile(user)
                .await?
                .ok_or_else(|| anyhow::anyhow!("No profile for member {user}"))?;
            let job = service.latest_job(user).await?;
            output(&ProfileOutput::new(profile, job), json_mode);
        }
    }

    Ok(())
}
