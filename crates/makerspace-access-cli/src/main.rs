//! Makerspace Access CLI — `msa` command.
//!
//! Manages the skill catalog, skill requests, grants and equipment access
//! checks over a ledger stored on disk.
//!
//! Each command loads the whole ledger, applies one change and writes it
//! back. There is no file lock, so concurrent runs against the same data
//! directory can overwrite each other.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};

use makerspace_access::time::micros_to_rfc3339;
use makerspace_access::{
    AccessConfig, EquipmentId, GrantId, GrantStatus, LedgerStore, RequestId, RevocationReason,
    Role, Session, SkillBuilder, SkillId, SkillLedger, SkillLevel, UserId,
};

// ── Time formatting helpers ───────────────────────────────────────────────────

fn micros_to_datetime(micros: u64) -> String {
    let secs = (micros / 1_000_000) as i64;
    chrono::DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| micros_to_rfc3339(micros))
}

// ── CLI structure ─────────────────────────────────────────────────────────────

/// Makerspace Access CLI — manage skills, certifications and equipment access.
#[derive(Parser, Debug)]
#[command(
    name = "msa",
    about = "Makerspace Access CLI",
    version,
    long_about = "msa — Makerspace Access CLI\n\nManage the skill catalog, review skill requests, revoke grants,\nand check which equipment a member may use."
)]
struct Cli {
    /// Ledger directory (default: $MSA_HOME or ~/.makerspace)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Acting member ID
    #[arg(long, global = true, default_value = "default")]
    user: String,

    /// Acting role (member, staff, admin)
    #[arg(long, global = true, default_value = "member")]
    role: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage the skill catalog
    Skill {
        #[command(subcommand)]
        subcommand: SkillCommands,
    },

    /// Submit and review skill requests
    Request {
        #[command(subcommand)]
        subcommand: RequestCommands,
    },

    /// Inspect, revoke and expire grants
    Grant {
        #[command(subcommand)]
        subcommand: GrantCommands,
    },

    /// Check equipment access
    Access {
        #[command(subcommand)]
        subcommand: AccessCommands,
    },
}

#[derive(Subcommand, Debug)]
enum SkillCommands {
    /// Add a skill to the catalog
    Add {
        /// Display name
        #[arg(long)]
        name: String,

        /// Category (e.g. woodshop, electronics)
        #[arg(long, default_value = "general")]
        category: String,

        /// Required level (basic, intermediate, advanced, expert)
        #[arg(long, default_value = "basic")]
        level: String,

        /// Equipment ID this skill gates (repeatable)
        #[arg(long)]
        equipment: Vec<String>,

        /// Longer description
        #[arg(long)]
        description: Option<String>,
    },

    /// Disable a skill so it no longer gates equipment
    Disable {
        /// Skill ID (e.g. skill_...)
        skill_id: String,
    },

    /// List catalog entries
    List {
        /// Include disabled skills
        #[arg(long)]
        all: bool,
    },
}

#[derive(Subcommand, Debug)]
enum RequestCommands {
    /// Request certification in a skill for the acting member
    Create {
        /// Skill ID to request
        #[arg(long)]
        skill: String,

        /// Notes for the reviewer
        #[arg(long)]
        notes: Option<String>,
    },

    /// Approve a pending request
    Approve {
        /// Request ID (e.g. sreq_...)
        request_id: String,

        /// Approval notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// Reject a pending request
    Reject {
        /// Request ID (e.g. sreq_...)
        request_id: String,

        /// Reason for rejection
        #[arg(long)]
        reason: Option<String>,
    },

    /// List requests
    List {
        /// Show only pending requests
        #[arg(long)]
        pending: bool,

        /// Show only the acting member's requests
        #[arg(long)]
        mine: bool,
    },
}

#[derive(Subcommand, Debug)]
enum GrantCommands {
    /// Revoke a certified grant
    Revoke {
        /// Grant ID (e.g. grant_...)
        grant_id: String,

        /// Reason (safety_violation, administrative_error, member_request, membership_ended, or free text)
        #[arg(long, default_value = "administrative_error")]
        reason: String,
    },

    /// List grants
    List {
        /// Member whose grants to list (default: acting member)
        #[arg(long)]
        member: Option<String>,

        /// List every member's grants
        #[arg(long)]
        all: bool,
    },

    /// Mark grants past their expiry as expired
    Sweep,
}

#[derive(Subcommand, Debug)]
enum AccessCommands {
    /// Check whether a member may use a piece of equipment
    Check {
        /// Equipment ID
        equipment: String,

        /// Member to check (default: acting member)
        #[arg(long)]
        member: Option<String>,

        /// Print the decision as JSON
        #[arg(long)]
        json: bool,
    },

    /// List equipment a member may use
    List {
        /// Member to check (default: acting member)
        #[arg(long)]
        member: Option<String>,
    },
}

// ── Context ───────────────────────────────────────────────────────────────────

/// Everything a command needs: the store, the loaded ledger and the actor.
struct App {
    store: LedgerStore,
    ledger: SkillLedger,
    session: Session,
}

impl App {
    fn load(cli: &Cli) -> Result<Self> {
        let config = match &cli.data_dir {
            Some(dir) => AccessConfig::from_lookup(|key| match key {
                "MSA_HOME" => Some(dir.display().to_string()),
                other => std::env::var(other).ok(),
            }),
            None => AccessConfig::from_env(),
        }
        .context("failed to read configuration")?;

        let store = LedgerStore::open(&config)
            .with_context(|| format!("failed to open ledger at {}", config.data_dir.display()))?;
        let ledger = store
            .load_ledger(&config)
            .with_context(|| format!("failed to load ledger from {}", store.base_dir().display()))?;
        let session = Session::new(UserId::new(cli.user.as_str()), Role::parse(&cli.role));
        let capabilities: Vec<&str> = session
            .capabilities
            .iter()
            .map(|c| c.uri.as_str())
            .collect();
        log::debug!(
            "session {} resolved to role {} with [{}]",
            session.user_id,
            session.role,
            capabilities.join(", ")
        );

        if cli.verbose {
            eprintln!(
                "ledger: {} (acting as {} / {})",
                store.base_dir().display(),
                session.user_id,
                session.role
            );
        }

        Ok(Self {
            store,
            ledger,
            session,
        })
    }

    fn save(&self) -> Result<()> {
        let dir = self.store.base_dir();
        self.store
            .save_ledger(&self.ledger)
            .with_context(|| format!("failed to save ledger to {}", dir.display()))
    }

    fn member_or_self(&self, member: Option<&str>) -> UserId {
        member
            .map(UserId::new)
            .unwrap_or_else(|| self.session.user_id.clone())
    }
}

// ── Main ──────────────────────────────────────────────────────────────────────

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let verbose = cli.verbose;

    let result = App::load(&cli).and_then(|mut ctx| match cli.command {
        Commands::Skill { subcommand } => match subcommand {
            SkillCommands::Add {
                name,
                category,
                level,
                equipment,
                description,
            } => cmd_skill_add(
                &mut ctx,
                &name,
                &category,
                &level,
                &equipment,
                description.as_deref(),
            ),
            SkillCommands::Disable { skill_id } => cmd_skill_disable(&mut ctx, &skill_id),
            SkillCommands::List { all } => cmd_skill_list(&ctx, all, verbose),
        },
        Commands::Request { subcommand } => match subcommand {
            RequestCommands::Create { skill, notes } => cmd_request_create(&mut ctx, &skill, notes),
            RequestCommands::Approve { request_id, notes } => {
                cmd_request_approve(&mut ctx, &request_id, notes)
            }
            RequestCommands::Reject { request_id, reason } => {
                cmd_request_reject(&mut ctx, &request_id, reason)
            }
            RequestCommands::List { pending, mine } => {
                cmd_request_list(&ctx, pending, mine, verbose)
            }
        },
        Commands::Grant { subcommand } => match subcommand {
            GrantCommands::Revoke { grant_id, reason } => {
                cmd_grant_revoke(&mut ctx, &grant_id, &reason)
            }
            GrantCommands::List { member, all } => {
                cmd_grant_list(&ctx, member.as_deref(), all, verbose)
            }
            GrantCommands::Sweep => cmd_grant_sweep(&mut ctx),
        },
        Commands::Access { subcommand } => match subcommand {
            AccessCommands::Check {
                equipment,
                member,
                json,
            } => cmd_access_check(&ctx, &equipment, member.as_deref(), json),
            AccessCommands::List { member } => cmd_access_list(&ctx, member.as_deref()),
        },
    });

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

// ── Skill commands ────────────────────────────────────────────────────────────

fn cmd_skill_add(
    ctx: &mut App,
    name: &str,
    category: &str,
    level: &str,
    equipment: &[String],
    description: Option<&str>,
) -> Result<()> {
    let level: SkillLevel = level.parse().context("invalid --level")?;

    let mut builder = SkillBuilder::new(name).category(category).level(level);
    for raw in equipment {
        let id = EquipmentId::parse(raw).context("invalid --equipment")?;
        builder = builder.equipment(id.0);
    }
    if let Some(d) = description {
        builder = builder.description(d);
    }
    let skill = builder.build().context("invalid skill")?;

    let id = ctx
        .ledger
        .add_skill(&ctx.session, skill)
        .context("failed to add skill")?;
    ctx.save()?;

    println!("Skill added");
    println!("  Skill ID:  {id}");
    println!("  Name:      {name}");
    println!("  Level:     {level}");
    if equipment.is_empty() {
        println!("  Equipment: (none)");
    } else {
        println!("  Equipment: {}", equipment.join(", "));
    }
    Ok(())
}

fn cmd_skill_disable(ctx: &mut App, skill_id: &str) -> Result<()> {
    let id = SkillId(skill_id.to_string());
    ctx.ledger
        .disable_skill(&ctx.session, &id)
        .context("failed to disable skill")?;
    ctx.save()?;

    println!("Skill disabled: {id}");
    Ok(())
}

fn cmd_skill_list(ctx: &App, all: bool, verbose: bool) -> Result<()> {
    let skills: Vec<_> = ctx
        .ledger
        .catalog()
        .into_iter()
        .filter(|s| all || s.is_active())
        .collect();

    println!("Skills ({}):", skills.len());
    if skills.is_empty() {
        println!("  (none)");
        return Ok(());
    }

    println!("  {:<30} {:<28} {:<13} EQUIPMENT", "SKILL ID", "NAME", "LEVEL");
    println!("  {}", "-".repeat(90));
    for skill in skills {
        let equipment: Vec<&str> = skill.equipment_ids.iter().map(|e| e.0.as_str()).collect();
        let disabled = if skill.is_active() { "" } else { " [DISABLED]" };
        println!(
            "  {:<30} {:<28} {:<13} {}{}",
            skill.id,
            skill.name,
            skill.required_level,
            equipment.join(", "),
            disabled
        );
        if verbose {
            println!("    Category: {}", skill.category);
            println!("    Created:  {}", micros_to_datetime(skill.created_at));
            if let Some(d) = &skill.description {
                println!("    About:    {d}");
            }
        }
    }
    Ok(())
}

// ── Request commands ──────────────────────────────────────────────────────────

fn cmd_request_create(ctx: &mut App, skill_id: &str, notes: Option<String>) -> Result<()> {
    let skill = SkillId(skill_id.to_string());
    let id = ctx
        .ledger
        .request_skill(&ctx.session, &skill, notes)
        .context("skill request refused")?;
    ctx.save()?;

    println!("Skill request submitted");
    println!("  Request ID: {id}");
    println!("  Member:     {}", ctx.session.user_id);
    println!("  Skill:      {skill}");
    Ok(())
}

fn cmd_request_approve(ctx: &mut App, request_id: &str, notes: Option<String>) -> Result<()> {
    let id = RequestId(request_id.to_string());
    let grant_id = ctx
        .ledger
        .approve_skill_request(&ctx.session, &id, notes)
        .context("approval refused")?;
    ctx.save()?;

    let grant = ctx
        .ledger
        .grant(&grant_id)
        .ok_or_else(|| anyhow!("grant {grant_id} missing after approval"))?;

    println!("Request approved: {id}");
    println!("  Grant ID:  {grant_id}");
    println!("  Member:    {}", grant.user_id);
    println!("  Level:     {}", grant.level);
    match grant.expires_at {
        Some(expiry) => println!("  Expires:   {}", micros_to_datetime(expiry)),
        None => println!("  Expires:   never"),
    }
    Ok(())
}

fn cmd_request_reject(ctx: &mut App, request_id: &str, reason: Option<String>) -> Result<()> {
    let id = RequestId(request_id.to_string());
    ctx.ledger
        .reject_skill_request(&ctx.session, &id, reason)
        .context("rejection refused")?;
    ctx.save()?;

    println!("Request rejected: {id}");
    Ok(())
}

fn cmd_request_list(ctx: &App, pending: bool, mine: bool, verbose: bool) -> Result<()> {
    let candidates = if mine {
        ctx.ledger.requests_for(&ctx.session.user_id)
    } else {
        ctx.ledger.all_requests()
    };
    let requests: Vec<_> = candidates
        .into_iter()
        .filter(|r| !pending || r.is_pending())
        .collect();

    println!("Requests ({}):", requests.len());
    if requests.is_empty() {
        println!("  (none)");
        return Ok(());
    }

    println!("  {:<30} {:<16} {:<30} STATUS", "REQUEST ID", "MEMBER", "SKILL");
    println!("  {}", "-".repeat(90));
    for request in requests {
        println!(
            "  {:<30} {:<16} {:<30} {}",
            request.id, request.user_id, request.skill_id, request.status
        );
        if verbose {
            println!("    Requested: {}", micros_to_datetime(request.requested_at));
            if let Some(n) = &request.notes {
                println!("    Notes:     {n}");
            }
            if let (Some(by), Some(at)) = (&request.resolved_by, request.resolved_at) {
                println!("    Resolved:  {} by {by}", micros_to_datetime(at));
            }
        }
    }
    Ok(())
}

// ── Grant commands ────────────────────────────────────────────────────────────

fn cmd_grant_revoke(ctx: &mut App, grant_id: &str, reason: &str) -> Result<()> {
    let id = GrantId(grant_id.to_string());
    let revocation = ctx
        .ledger
        .revoke_skill(&ctx.session, &id, RevocationReason::parse(reason))
        .context("revocation refused")?;
    ctx.save()?;

    println!("Grant revoked: {id}");
    println!("  Reason:  {}", revocation.reason.as_str());
    println!("  At:      {}", micros_to_datetime(revocation.revoked_at));
    Ok(())
}

fn cmd_grant_list(ctx: &App, member: Option<&str>, all: bool, verbose: bool) -> Result<()> {
    let grants = if all {
        ctx.ledger.all_grants()
    } else {
        ctx.ledger.grants_for(&ctx.member_or_self(member))
    };
    let now = ctx.ledger.now();

    println!("Grants ({}):", grants.len());
    if grants.is_empty() {
        println!("  (none)");
        return Ok(());
    }

    println!("  {:<30} {:<16} {:<30} STATUS", "GRANT ID", "MEMBER", "SKILL");
    println!("  {}", "-".repeat(90));
    for grant in grants {
        let lapsed = if grant.status == GrantStatus::Certified && grant.is_expired_at(now) {
            " [LAPSED]"
        } else {
            ""
        };
        println!(
            "  {:<30} {:<16} {:<30} {}{}",
            grant.id, grant.user_id, grant.skill_id, grant.status, lapsed
        );
        if verbose {
            println!(
                "    Certified: {} by {}",
                micros_to_datetime(grant.certified_at),
                grant.certified_by
            );
            match grant.expires_at {
                Some(expiry) => println!("    Expires:   {}", micros_to_datetime(expiry)),
                None => println!("    Expires:   never"),
            }
            if let Some(rev) = ctx.ledger.revocation(&grant.id) {
                println!(
                    "    Revoked:   {} ({})",
                    micros_to_datetime(rev.revoked_at),
                    rev.reason.as_str()
                );
            }
        }
    }
    Ok(())
}

fn cmd_grant_sweep(ctx: &mut App) -> Result<()> {
    let swept = ctx
        .ledger
        .sweep_expired(&ctx.session)
        .context("sweep refused")?;
    ctx.save()?;

    println!("Expired {} grant(s)", swept.len());
    for id in swept {
        println!("  {id}");
    }
    Ok(())
}

// ── Access commands ───────────────────────────────────────────────────────────

fn cmd_access_check(ctx: &App, equipment: &str, member: Option<&str>, json: bool) -> Result<()> {
    let equipment = EquipmentId::parse(equipment).context("invalid equipment id")?;
    let user = ctx.member_or_self(member);
    let decision = ctx
        .ledger
        .can_access(&ctx.session, &user, &equipment)
        .context("access check refused")?;

    if json {
        let out = serde_json::to_string_pretty(&decision).context("failed to encode decision")?;
        println!("{out}");
        return Ok(());
    }

    if decision.can_access {
        println!("ALLOWED: {user} may use {equipment}");
        if !decision.is_restricted() {
            println!("  (no skill required)");
        }
    } else {
        println!("DENIED: {user} may not use {equipment}");
        println!("  Missing skills:");
        for name in &decision.missing_skills {
            println!("    - {name}");
        }
    }
    Ok(())
}

fn cmd_access_list(ctx: &App, member: Option<&str>) -> Result<()> {
    let user = ctx.member_or_self(member);
    let equipment = ctx
        .ledger
        .accessible_equipment(&ctx.session, &user)
        .context("access check refused")?;

    println!("Equipment available to {user} ({}):", equipment.len());
    if equipment.is_empty() {
        println!("  (none)");
    }
    for id in equipment {
        println!("  {id}");
    }
    Ok(())
}
