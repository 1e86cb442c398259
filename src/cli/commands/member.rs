//! Member seeding commands. Provisioning proper happens elsewhere; these
//! exist to drive matching locally.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use uuid::Uuid;

use crate::cli::context::AppContext;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Config, Member, MemberStatus};
use crate::domain::ports::MemberRepository;

#[derive(Args, Debug)]
pub struct MemberArgs {
    #[command(subcommand)]
    pub command: MemberCommands,
}

#[derive(Subcommand, Debug)]
pub enum MemberCommands {
    /// Add a member
    Add {
        /// Display name
        name: String,
        /// Email address
        #[arg(short, long)]
        email: String,
        /// Tenant (customer account) ID
        #[arg(short, long)]
        tenant: Uuid,
        /// Organization ID within the tenant (generated when omitted)
        #[arg(short, long)]
        org: Option<Uuid>,
        /// Organization domain, e.g. example.com
        #[arg(short, long)]
        domain: String,
        /// Status (active, inactive, suspended)
        #[arg(short, long, default_value = "active")]
        status: String,
    },
    /// Show a member
    Show {
        /// Member ID
        id: Uuid,
    },
    /// Block another member from being suggested
    Block {
        /// Member doing the blocking
        blocker: Uuid,
        /// Member being blocked
        blocked: Uuid,
    },
}

#[derive(Debug, serde::Serialize)]
pub struct MemberOutput {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub organization_id: Uuid,
    pub organization_domain: String,
    pub display_name: String,
    pub email: String,
    pub status: String,
}

impl From<&Member> for MemberOutput {
    fn from(member: &Member) -> Self {
        Self {
            id: member.id,
            tenant_id: member.tenant_id,
            organization_id: member.organization_id,
            organization_domain: member.organization_domain.clone(),
            display_name: member.display_name.clone(),
            email: member.email.clone(),
            status: member.status.as_str().to_string(),
        }
    }
}

impl CommandOutput for MemberOutput {
    fn to_human(&self) -> String {
        [
            format!("Member: {}", self.display_name),
            format!("ID: {}", self.id),
            format!("Email: {}", self.email),
            format!("Tenant: {}", self.tenant_id),
            format!("Organization: {} ({})", self.organization_domain, self.organization_id),
            format!("Status: {}", self.status),
        ]
        .join("\n")
    }
}

#[derive(Debug, serde::Serialize)]
pub struct BlockOutput {
    pub blocker_id: Uuid,
    pub blocked_id: Uuid,
}

impl CommandOutput for BlockOutput {
    fn to_human(&self) -> String {
        format!("{} will no longer be matched with {}", self.blocker_id, self.blocked_id)
    }
}

pub async fn execute(args: MemberArgs, config: Config, json_mode: bool) -> Result<()> {
    let ctx = AppContext::open(config).await?;

    match args.command {
        MemberCommands::Add { name, email, tenant, org, domain, status } => {
            let status = MemberStatus::from_str(&status)
                .ok_or_else(|| anyhow::anyhow!("Invalid status: {status}"))?;
            let member = Member::new(tenant, org.unwrap_or_else(Uuid::new_v4), domain, name, email).with_status(status);
            ctx.members.create(&member).await.context("Failed to add member")?;
            output(&MemberOutput::from(&member), json_mode);
        }
        MemberCommands::Show { id } => {
            let member = ctx
                .members
                .get(id)
                .await?
                .ok_or_else(|| anyhow::anyhow!("Member not found: {id}"))?;
            output(&MemberOutput::from(&member), json_mode);
        }
        MemberCommands::Block { blocker, blocked } => {
            ctx.members.block(blocker, blocked).await.context("Failed to record block")?;
            output(&BlockOutput { blocker_id: blocker, blocked_id: blocked }, json_mode);
        }
    }

    Ok(())
}
