//! Match suggestion and intro commands.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Subcommand};
use uuid::Uuid;

use crate::cli::context::AppContext;
use crate::cli::output::{list_table, output, render_list, truncate, CommandOutput};
use crate::domain::errors::DomainError;
use crate::domain::models::{
    AcceptOutcome, AcceptStatus, Config, GenerateMatchesRequest, GenerateMatchesResponse, Match,
    MatchCandidate, PassOutcome,
};

#[derive(Args, Debug)]
pub struct MatchArgs {
    #[command(subcommand)]
    pub command: MatchCommands,
}

#[derive(Subcommand, Debug)]
pub enum MatchCommands {
    /// Suggest introductions for a member
    Generate {
        /// Member ID
        user: Uuid,
        /// Number of suggestions
        #[arg(short, long)]
        limit: Option<usize>,
        /// Drop candidates below this similarity
        #[arg(short, long, default_value_t = 0.0)]
        min_similarity: f32,
        /// Weight of diversity against similarity, 0..=1
        #[arg(short, long)]
        diversity_weight: Option<f32>,
    },
    /// Accept a suggested member
    Accept {
        /// Member accepting
        user: Uuid,
        /// Suggested member
        candidate: Uuid,
    },
    /// Pass on a suggested member
    Pass {
        /// Member passing
        user: Uuid,
        /// Suggested member
        candidate: Uuid,
    },
    /// List matches waiting on a member's answer
    Pending {
        /// Member ID
        user: Uuid,
    },
    /// Expire matches whose answer window closed
    Expire,
}

#[derive(Debug, serde::Serialize)]
pub struct SuggestionsOutput {
    #[serde(flatten)]
    pub response: GenerateMatchesResponse,
}

impl CommandOutput for SuggestionsOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["candidate", "final", "similarity", "diversity", "reasons"]);
        for s in &self.response.matches {
            table.add_row(vec![
                s.candidate_id.to_string(),
                format!("{:.3}", s.final_score),
                format!("{:.3}", s.similarity_score),
                format!("{:.1}", s.diversity_score),
                truncate(&s.reasons.join("; "), 60),
            ]);
        }
        render_list(("suggestion", "suggestions"), &table, self.response.matches.len())
    }
}

impl CommandOutput for AcceptOutcome {
    fn to_human(&self) -> String {
        match (self.status, self.intro_id) {
            (AcceptStatus::Mutual, Some(intro_id)) => {
                format!("It's mutual! Match {} introduced (intro {intro_id}).", self.match_id)
            }
            (AcceptStatus::Mutual, None) => format!("It's mutual! Match {}.", self.match_id),
            (AcceptStatus::Accepted, _) => {
                format!("Accepted. Match {} is waiting on the other member.", self.match_id)
            }
        }
    }
}

impl CommandOutput for PassOutcome {
    fn to_human(&self) -> String {
        format!("Passed. Match {} closed.", self.match_id)
    }
}

#[derive(Debug, serde::Serialize)]
pub struct PendingOutput {
    pub user_id: Uuid,
    pub matches: Vec<Match>,
}

impl CommandOutput for PendingOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["match", "from", "score", "expires", "interest"]);
        for m in &self.matches {
            table.add_row(vec![
                m.id.to_string(),
                m.initiator_id.to_string(),
                format!("{:.3}", m.scores.final_score),
                m.expires_at
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "-".to_string()),
                truncate(m.shared_interest(), 40),
            ]);
        }
        render_list(("pending match", "pending matches"), &table, self.matches.len())
    }
}

#[derive(Debug, serde::Serialize)]
pub struct ExpireOutput {
    pub expired: u64,
}

impl CommandOutput for ExpireOutput {
    fn to_human(&self) -> String {
        format!("Expired {} stale match(es).", self.expired)
    }
}

pub async fn execute(args: MatchArgs, config: Config, json_mode: bool) -> Result<()> {
    let ctx = AppContext::open(config).await?;

    match args.command {
        MatchCommands::Generate { user, limit, min_similarity, diversity_weight } => {
            let mut request = GenerateMatchesRequest::new(user)
                .with_limit(limit.unwrap_or(ctx.config.matching.default_limit))
                .with_min_similarity(min_similarity);
            if let Some(weight) = diversity_weight {
                request = request.with_diversity_weight(weight);
            }

            let response = ctx
                .matching_service()
                .generate_matches(&request)
                .await
                .context("Failed to generate matches")?;
            output(&SuggestionsOutput { response }, json_mode);
        }
        MatchCommands::Accept { user, candidate } => {
            let candidate = candidate_with_scores(&ctx, user, candidate).await?;
            let outcome = ctx
                .orchestrator()
                .accept(user, &candidate)
                .await
                .context("Failed to accept match")?;
            output(&outcome, json_mode);
        }
        MatchCommands::Pass { user, candidate } => {
            let candidate = candidate_with_scores(&ctx, user, candidate).await?;
            let outcome = ctx
                .orchestrator()
                .pass(user, &candidate)
                .await
                .context("Failed to pass on match")?;
            output(&outcome, json_mode);
        }
        MatchCommands::Pending { user } => {
            let matches = ctx.orchestrator().pending_for(user).await?;
            output(&PendingOutput { user_id: user, matches }, json_mode);
        }
        MatchCommands::Expire => {
            let expired = ctx.orchestrator().expire_stale(Utc::now()).await?;
            output(&ExpireOutput { expired }, json_mode);
        }
    }

    Ok(())
}

/// Recompute the candidate's scores so the stored match carries them.
/// Falls back to a score-less candidate when it is no longer suggested or
/// the user has nothing to score against yet.
async fn candidate_with_scores(ctx: &AppContext, user: Uuid, candidate_id: Uuid) -> Result<MatchCandidate> {
    let request = GenerateMatchesRequest::new(user).with_limit(crate::domain::models::MAX_MATCH_LIMIT);
    let response = match ctx.matching_service().generate_matches(&request).await {
        Ok(response) => response,
        Err(DomainError::NoEmbedding(_) | DomainError::PreconditionFailed(_)) => {
            return Ok(MatchCandidate::bare(candidate_id));
        }
        Err(e) => return Err(e).context("Failed to score candidate"),
    };

    Ok(response
        .matches
        .into_iter()
        .find(|s| s.candidate_id == candidate_id)
        .map_or_else(|| MatchCandidate::bare(candidate_id), |s| s.to_candidate()))
}
