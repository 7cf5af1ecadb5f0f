//! CLI administration tool for catalog-api.
//!
//! Manages accounts and issues tokens directly against the database, without
//! going through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Create an administrator account
//! cargo run --bin admin -- user create-admin
//!
//! # Grant the admin role to an existing account
//! cargo run --bin admin -- user promote alice
//!
//! # Issue an access/refresh token pair for an account
//! cargo run --bin admin -- token issue alice
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` (required): PostgreSQL connection string
//! - `JWT_SECRET` (required for `token issue`): signing key shared with the server
//! - `ACCESS_TOKEN_TTL_MINUTES`, `REFRESH_TOKEN_TTL_MINUTES` (optional)

use catalog_api::application::services::TokenService;
use catalog_api::application::services::password::hash_password;
use catalog_api::config::MIN_JWT_SECRET_LEN;
use catalog_api::domain::entities::{ADMIN_ROLE, DEFAULT_ROLE, NewUser};
use catalog_api::domain::repositories::UserRepository;
use catalog_api::infrastructure::persistence::PgUserRepository;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::{Confirm, Input, Password};
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Issue bearer tokens
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create an account holding the admin role
    CreateAdmin {
        #[arg(short, long)]
        username: Option<String>,

        #[arg(short, long)]
        email: Option<String>,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Grant the admin role to an existing account
    Promote { username: String },
}

#[derive(Subcommand)]
enum TokenAction {
    /// Issue an access/refresh pair for an account
    Issue { username: String },
}

#[derive(Subcommand)]
enum DbAction {
    /// Check database connection and schema
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = PgPool::connect(&database_url)
        .await
        .context("Failed to connect to database")?;
    let users = PgUserRepository::new(Arc::new(pool.clone()));

    match cli.command {
        Commands::User { action } => handle_user_action(action, &users).await?,
        Commands::Token { action } => handle_token_action(action, &users).await?,
        Commands::Db { action } => handle_db_action(action, &pool).await?,
    }

    Ok(())
}

async fn handle_user_action(action: UserAction, users: &PgUserRepository) -> Result<()> {
    match action {
        UserAction::CreateAdmin {
            username,
            email,
            yes,
        } => create_admin(users, username, email, yes).await,
        UserAction::Promote { username } => promote(users, &username).await,
    }
}

/// Prompts for missing details, hashes the password with Argon2id and stores
/// an account holding both the `admin` and `default` roles.
async fn create_admin(
    users: &PgUserRepository,
    username: Option<String>,
    email: Option<String>,
    skip_confirm: bool,
) -> Result<()> {
    println!("{}", "👤 Create Administrator".bright_blue().bold());
    println!();

    let username = match username {
        Some(u) => u,
        None => Input::new().with_prompt("Username").interact_text()?,
    };

    if users.exists_by_username(&username).await? {
        anyhow::bail!("Username '{username}' is already taken");
    }

    let password = Password::new()
        .with_prompt("Password")
        .with_confirmation("Repeat password", "Passwords do not match")
        .interact()?;
    if password.chars().count() < 8 {
        anyhow::bail!("Password must be at least 8 characters");
    }

    println!();
    println!("  Username: {}", username.cyan());
    if let Some(ref email) = email {
        println!("  Email:    {}", email.cyan());
    }
    println!("  Roles:    {}", format!("{ADMIN_ROLE}, {DEFAULT_ROLE}").cyan());
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Create this account?")
            .default(true)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let user = users
        .create(NewUser {
            username,
            first_name: None,
            last_name: None,
            email,
            mobile_number: None,
            password_hash: hash_password(password).await?,
            roles: vec![ADMIN_ROLE.to_string(), DEFAULT_ROLE.to_string()],
        })
        .await?;

    println!(
        "{} (id {})",
        "✅ Administrator created".green().bold(),
        user.id.to_string().bright_white()
    );
    Ok(())
}

async fn promote(users: &PgUserRepository, username: &str) -> Result<()> {
    let user = users
        .find_by_username(username)
        .await?
        .with_context(|| format!("User '{username}' not found"))?;

    if user.has_role(ADMIN_ROLE) {
        println!("{}", "⚠️  User already holds the admin role".yellow());
        return Ok(());
    }

    let confirmed = Confirm::new()
        .with_prompt(format!("Grant admin role to '{username}'?"))
        .default(false)
        .interact()?;

    if !confirmed {
        println!("{}", "❌ Cancelled".red());
        return Ok(());
    }

    users.add_role(user.id, ADMIN_ROLE).await?;
    println!("{}", "✅ Admin role granted".green().bold());
    Ok(())
}

async fn handle_token_action(action: TokenAction, users: &PgUserRepository) -> Result<()> {
    match action {
        TokenAction::Issue { username } => issue_token(users, &username).await,
    }
}

/// Signs a token pair with the server's `JWT_SECRET`.
async fn issue_token(users: &PgUserRepository, username: &str) -> Result<()> {
    let secret = std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
    if secret.len() < MIN_JWT_SECRET_LEN {
        anyhow::bail!("JWT_SECRET must be at least {MIN_JWT_SECRET_LEN} bytes");
    }

    let minutes = |name: &str, default: i64| -> Result<i64> {
        std::env::var(name)
            .ok()
            .map(|v| v.parse::<i64>())
            .transpose()
            .with_context(|| format!("{name} must be a number"))
            .map(|v| v.unwrap_or(default))
    };
    let tokens = TokenService::new(
        &secret,
        chrono::Duration::minutes(minutes("ACCESS_TOKEN_TTL_MINUTES", 60)?),
        chrono::Duration::minutes(minutes("REFRESH_TOKEN_TTL_MINUTES", 1440)?),
    );

    let user = users
        .find_by_username(username)
        .await?
        .with_context(|| format!("User '{username}' not found"))?;
    let detail = tokens.issue(&user)?;

    println!("{}", "🔑 Token pair issued".bright_blue().bold());
    println!();
    println!("  Roles:   {}", user.roles.join(", ").cyan());
    println!(
        "  Access:  {} (expires {})",
        detail.access_token.bright_yellow(),
        detail.access_token_expire_time.format("%Y-%m-%d %H:%M UTC")
    );
    println!(
        "  Refresh: {} (expires {})",
        detail.refresh_token.bright_yellow(),
        detail.refresh_token_expire_time.format("%Y-%m-%d %H:%M UTC")
    );
    println!();
    println!("{}", "Example:".bright_white());
    println!(
        "  curl -H \"Authorization: Bearer {}\" http://localhost:3000/api/v1/colors/1",
        detail.access_token.bright_yellow()
    );
    Ok(())
}

const TABLES: &[&str] = &[
    "users",
    "colors",
    "property_categories",
    "properties",
    "car_types",
    "car_models",
];

async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;
            println!("{}", "✅ Database connection OK".green().bold());
            println!("  PostgreSQL: {}", version.bright_white());
            println!();

            for table in TABLES {
                let present: bool = sqlx::query_scalar("SELECT to_regclass($1) IS NOT NULL")
                    .bind(*table)
                    .fetch_one(pool)
                    .await?;
                let mark = if present { "ok".green() } else { "missing".red() };
                println!("  {:<22} {}", table, mark);
            }
        }
    }

    Ok(())
}
