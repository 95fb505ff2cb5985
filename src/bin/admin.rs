//! Operator CLI for question-board.
//!
//! ```bash
//! cargo run --bin admin -- user create --name alice
//! cargo run --bin admin -- token create --user 1 --name "Alice laptop"
//! cargo run --bin admin -- token list
//! cargo run --bin admin -- token revoke "Alice laptop"
//! cargo run --bin admin -- cache flush --question 5
//! cargo run --bin admin -- db info
//! ```
//!
//! Reads the same environment as the server (see [`question_board::config`]).

use question_board::application::services::{AuthService, QuestionCache};
use question_board::config::{self, CacheBackend, Config};
use question_board::domain::entities::{ApiToken, TokenRef};
use question_board::infrastructure::persistence::{PgQuestionRepository, PgTokenRepository};
use question_board::server;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::{Confirm, Input};
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about = "Administer question-board users, tokens and cache", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Manage the API tokens users act through
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },

    /// Drop cached question views
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Database diagnostics
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a user
    Create {
        #[arg(short, long)]
        name: Option<String>,
    },
}

#[derive(Subcommand)]
enum TokenAction {
    /// Issue a token acting as a user
    Create {
        /// Id of the user the token acts as
        #[arg(short, long)]
        user: i64,

        /// Label, e.g. "Alice laptop"
        #[arg(short, long)]
        name: Option<String>,

        /// Use this raw value instead of generating one
        #[arg(short, long)]
        token: Option<String>,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// List tokens with their owners
    List,

    /// Revoke a token by id or name
    Revoke { token: String },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Drop the cached listing, and optionally one question's cached detail
    Flush {
        #[arg(short, long)]
        question: Option<i64>,
    },
}

#[derive(Subcommand)]
enum DbAction {
    /// Check the connection
    Check,

    /// Show server version and row counts
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = config::load_from_env().context("Invalid configuration")?;
    let pool = server::connect_database(&config).await?;

    match cli.command {
        Commands::User { action } => user_command(action, &pool).await,
        Commands::Token { action } => {
            let auth = AuthService::new(
                Arc::new(PgTokenRepository::new(Arc::new(pool.clone()))),
                config.token_signing_secret.clone(),
            );
            token_command(action, &auth, &config).await
        }
        Commands::Cache { action } => cache_command(action, &pool, &config).await,
        Commands::Db { action } => db_command(action, &pool).await,
    }
}

async fn user_command(action: UserAction, pool: &PgPool) -> Result<()> {
    let UserAction::Create { name } = action;

    let name = match name {
        Some(n) => n,
        None => Input::new().with_prompt("Name").interact_text()?,
    };

    let id: i64 = sqlx::query_scalar("INSERT INTO users (name) VALUES ($1) RETURNING id")
        .bind(&name)
        .fetch_one(pool)
        .await
        .context("Failed to create user")?;

    println!(
        "{} {} (id {})",
        "✅ Created user".green().bold(),
        name.cyan(),
        id.to_string().bold()
    );
    println!("   Next: admin token create --user {id}");

    Ok(())
}

async fn token_command(action: TokenAction, auth: &AuthService, config: &Config) -> Result<()> {
    match action {
        TokenAction::Create {
            user,
            name,
            token,
            yes,
        } => {
            let name = match name {
                Some(n) => n,
                None => Input::new()
                    .with_prompt("Token name")
                    .with_initial_text(format!("user-{user}"))
                    .interact_text()?,
            };

            if !yes
                && !Confirm::new()
                    .with_prompt(format!("Issue token '{name}' acting as user {user}?"))
                    .default(true)
                    .interact()?
            {
                println!("{}", "Cancelled".red());
                return Ok(());
            }

            let issued = auth
                .issue_token(user, &name, token)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to issue token: {e}"))?;

            println!(
                "{} '{}' for {} (user {})",
                "🔑 Issued token".green().bold(),
                issued.token.name.cyan(),
                issued.token.owner.name.cyan(),
                issued.token.owner.id
            );
            println!();
            println!("   {}", issued.raw.bright_yellow().bold());
            println!();
            println!(
                "{}",
                "⚠️  Shown once. Only its hash is stored.".red().bold()
            );
            println!(
                "   curl -H \"Authorization: Bearer {}\" -d '{{\"title\":\"...\",\"body\":\"...\",\"tags\":[\"rust\"]}}' \\\n        -H \"Content-Type: application/json\" http://{}/questions",
                issued.raw, config.listen_addr
            );
        }
        TokenAction::List => {
            let tokens = auth
                .list_tokens()
                .await
                .map_err(|e| anyhow::anyhow!("Failed to list tokens: {e}"))?;

            if tokens.is_empty() {
                println!("{}", "No tokens issued yet".yellow());
                return Ok(());
            }

            println!(
                "{:<5} {:<24} {:<18} {:<17} {}",
                "ID".bold(),
                "Name".bold(),
                "Acts as".bold(),
                "Last used".bold(),
                "Status".bold()
            );
            for token in &tokens {
                print_token_row(token);
            }
            println!("{} token(s)", tokens.len());
        }
        TokenAction::Revoke { token } => {
            let token = auth
                .find_token(&TokenRef::parse(&token))
                .await
                .map_err(|e| anyhow::anyhow!("{e}"))?;

            if token.is_revoked() {
                println!("{}", "Token is already revoked".yellow());
                return Ok(());
            }

            let confirmed = Confirm::new()
                .with_prompt(format!(
                    "Revoke '{}' (id {}) acting as {}?",
                    token.name, token.id, token.owner.name
                ))
                .default(false)
                .interact()?;
            if !confirmed {
                println!("{}", "Cancelled".red());
                return Ok(());
            }

            auth.revoke_token(token.id)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to revoke token: {e}"))?;
            println!("{}", "🔒 Token revoked".green().bold());
        }
    }

    Ok(())
}

fn print_token_row(token: &ApiToken) {
    let status = if token.is_revoked() {
        "revoked".red()
    } else {
        "active".green()
    };
    let last_used = token
        .last_used_at
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "never".to_string());

    println!(
        "{:<5} {:<24} {:<18} {:<17} {}",
        token.id,
        token.name.cyan(),
        format!("{} ({})", token.owner.name, token.owner.id),
        last_used.bright_black(),
        status
    );
}

/// Drops cached views through the same keys the server reads.
async fn cache_command(action: CacheAction, pool: &PgPool, config: &Config) -> Result<()> {
    let CacheAction::Flush { question } = action;

    if config.cache.backend != CacheBackend::Redis {
        println!(
            "{}",
            format!(
                "Cache backend is '{}': entries live inside each server process, nothing shared to flush",
                config.cache.backend
            )
            .yellow()
        );
        return Ok(());
    }

    let question_cache = QuestionCache::new(
        server::build_cache(config).await,
        Arc::new(PgQuestionRepository::new(Arc::new(pool.clone()))),
        config.cache.ttl,
        config.questions_per_page,
    );

    question_cache
        .invalidate_list()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to flush listing: {e}"))?;
    println!("{} listing", "✓".green());

    if let Some(id) = question {
        question_cache
            .invalidate_detail(id)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to flush question {id}: {e}"))?;
        println!("{} question {id}", "✓".green());
    }

    Ok(())
}

async fn db_command(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            sqlx::query("SELECT 1").execute(pool).await?;
            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;
            println!("PostgreSQL: {}", version.bright_white());

            for (label, sql) in [
                ("Users", "SELECT COUNT(*) FROM users"),
                ("Questions", "SELECT COUNT(*) FROM questions"),
                ("Answers", "SELECT COUNT(*) FROM answers"),
                ("Tags", "SELECT COUNT(*) FROM tags"),
                (
                    "Active tokens",
                    "SELECT COUNT(*) FROM api_tokens WHERE revoked_at IS NULL",
                ),
            ] {
                let count: i64 = sqlx::query_scalar(sql).fetch_one(pool).await?;
                println!("{:<14} {}", format!("{label}:"), count.to_string().green().bold());
            }
        }
    }

    Ok(())
}
