//! CLI administration tool for ephemeral-shortener.
//!
//! Runs the expiry sweep and inspects the link store without going through
//! the HTTP API. Intended to be run from cron or a systemd timer.
//!
//! # Usage
//!
//! ```bash
//! # Show what the sweep would remove
//! cargo run --bin admin -- expired
//!
//! # Run the sweep without prompting (for schedulers)
//! cargo run --bin admin -- sweep --yes
//!
//! # List links created with an owner token
//! cargo run --bin admin -- links <OWNER_TOKEN>
//!
//! # List every link
//! cargo run --bin admin -- links --all
//!
//! # View statistics
//! cargo run --bin admin -- stats
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` (required): PostgreSQL connection string
//! - `STORE_TIMEOUT_MS` (optional): per-call store timeout, default 2000
//! - `SWEEP_EXHAUSTED` (optional): also sweep hit-exhausted links, default `true`

use ephemeral_shortener::application::services::LifecycleService;
use ephemeral_shortener::domain::entities::LinkRecord;
use ephemeral_shortener::config::{store_timeout_from_env, sweep_policy_from_env};
use ephemeral_shortener::domain::lifecycle::{LifecyclePolicy, SweepPolicy, format_timestamp};
use ephemeral_shortener::domain::repositories::LinkRepository;
use ephemeral_shortener::infrastructure::persistence::PgLinkRepository;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use sqlx::PgPool;
use std::sync::Arc;

/// CLI tool for managing ephemeral-shortener.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level commands.
#[derive(Subcommand)]
enum Commands {
    /// Delete expired links
    Sweep {
        /// Only list what would be removed
        #[arg(long)]
        dry_run: bool,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,

        /// Keep hit-exhausted links, remove only time-expired ones
        #[arg(long)]
        expired_only: bool,
    },

    /// List links the sweep would remove
    Expired,

    /// List links created with an owner token, or every link
    Links {
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        owner_token: Option<String>,

        /// List links of all owners
        #[arg(long)]
        all: bool,
    },

    /// Show statistics
    Stats,

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    let pool = PgPool::connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    let repo = Arc::new(PgLinkRepository::new(
        Arc::new(pool.clone()),
        store_timeout_from_env(),
    ));
    let sweep_policy = sweep_policy_from_env();

    match cli.command {
        Commands::Sweep {
            dry_run,
            yes,
            expired_only,
        } => {
            let policy = if expired_only {
                SweepPolicy::ExpiredOnly
            } else {
                sweep_policy
            };
            run_sweep(LifecycleService::new(repo, LifecyclePolicy::new(policy)), dry_run, yes).await?
        }
        Commands::Expired => {
            let service = LifecycleService::new(repo, LifecyclePolicy::new(sweep_policy));
            list_expired(&service).await?
        }
        Commands::Links { owner_token, all } => list_links(repo, owner_token.filter(|_| !all)).await?,
        Commands::Stats => handle_stats(&pool).await?,
        Commands::Db { action } => handle_db_action(action, &pool).await?,
    }

    Ok(())
}

/// Runs the sweep, previewing and confirming first unless `--yes`.
///
/// The preview and the delete use separate timestamps, so a link expiring in
/// between is removed without having been listed.
async fn run_sweep(
    service: LifecycleService<PgLinkRepository>,
    dry_run: bool,
    skip_confirm: bool,
) -> Result<()> {
    println!("{}", "🧹 Sweep expired links".bright_blue().bold());
    println!("  Policy: {:?}", service.policy().sweep);
    println!();

    if dry_run || !skip_confirm {
        let candidates = service
            .list_expired(Utc::now())
            .await
            .map_err(|e| anyhow::anyhow!("Failed to list expired links: {}", e))?;

        if candidates.is_empty() {
            println!("{}", "  Nothing to sweep".green());
            return Ok(());
        }

        print_links(&candidates);

        if dry_run {
            println!("{}", "  Dry run, nothing deleted".yellow());
            return Ok(());
        }

        let confirmed = Confirm::new()
            .with_prompt(format!("Delete {} links?", candidates.len()))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let removed = service
        .sweep_expired(Utc::now())
        .await
        .map_err(|e| anyhow::anyhow!("Sweep failed: {}", e))?;

    println!();
    println!(
        "{} {}",
        "✅ Removed".green().bold(),
        removed.len().to_string().bright_white().bold()
    );
    for id in &removed {
        println!("  {}", id.bright_black());
    }
    println!();

    Ok(())
}

async fn list_expired(service: &LifecycleService<PgLinkRepository>) -> Result<()> {
    println!("{}", "⏰ Expired links".bright_blue().bold());
    println!();

    let records = service
        .list_expired(Utc::now())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list expired links: {}", e))?;

    if records.is_empty() {
        println!("{}", "  No expired links".green());
        return Ok(());
    }

    print_links(&records);
    Ok(())
}

/// Lists one owner's links, or every link when `owner_token` is `None`.
async fn list_links(repo: Arc<PgLinkRepository>, owner_token: Option<String>) -> Result<()> {
    let records = match owner_token.as_deref() {
        Some(owner) => {
            println!("{}", "🔗 Owner links".bright_blue().bold());
            repo.list_by_owner(owner).await
        }
        None => {
            println!("{}", "🔗 All links".bright_blue().bold());
            repo.list_all().await
        }
    }
    .map_err(|e| anyhow::anyhow!("Failed to list links: {}", e))?;
    println!();

    if records.is_empty() {
        println!("{}", "  No links".yellow());
        return Ok(());
    }

    println!("  Total: {}", records.len());

    print_links(&records);
    Ok(())
}

/// Prints links as a table.
///
/// ```text
///   ID     Destination                    Expires               Hits
///   ───────────────────────────────────────────────────────────────────────
///   Ab     https://example.com            2024-01-15T10:30:00Z  3/3
/// ```
fn print_links(records: &[LinkRecord]) {
    println!(
        "  {:<8} {:<40} {:<22} {:<10}",
        "ID".bright_white().bold(),
        "Destination".bright_white().bold(),
        "Expires".bright_white().bold(),
        "Hits".bright_white().bold()
    );
    println!("  {}", "─".repeat(82).bright_black());

    for record in records {
        let expires = record
            .self_destruct_at
            .map(format_timestamp)
            .unwrap_or_else(|| "never".to_string());
        let hits = if record.max_hits > 0 {
            format!("{}/{}", record.hit_count, record.max_hits)
        } else {
            record.hit_count.to_string()
        };
        let destination: String = record.destination.chars().take(40).collect();

        println!(
            "  {:<8} {:<40} {:<22} {}",
            record.id.cyan(),
            destination,
            expires.bright_black(),
            hits
        );
    }

    println!();
    println!(
        "  Total: {}",
        records.len().to_string().bright_white().bold()
    );
    println!();
}

/// Displays link counts by lifecycle state.
async fn handle_stats(pool: &PgPool) -> Result<()> {
    println!("{}", "📊 Statistics".bright_blue().bold());
    println!();

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM links")
        .fetch_one(pool)
        .await?;

    let expired: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM links WHERE self_destruct_at IS NOT NULL AND self_destruct_at <= NOW()",
    )
    .fetch_one(pool)
    .await?;

    let exhausted: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM links WHERE max_hits > 0 AND hit_count >= max_hits")
            .fetch_one(pool)
            .await?;

    let protected: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM links WHERE password_hash IS NOT NULL")
            .fetch_one(pool)
            .await?;

    println!("  Links:       {}", total.to_string().bright_green().bold());
    println!("  Expired:     {}", expired.to_string().yellow().bold());
    println!("  Exhausted:   {}", exhausted.to_string().yellow().bold());
    println!("  Protected:   {}", protected.to_string().bright_white());
    println!();

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;

            println!("  PostgreSQL: {}", version.bright_white());
            println!();
        }
    }

    Ok(())
}
