//! Nutribase CLI - user administration and card preference tools.
//!
//! # Usage
//!
//! ```bash
//! # List users waiting for approval
//! nb-cli --as admin@example.com users list
//!
//! # Approve a user
//! nb-cli --as admin@example.com users approve new@example.com
//!
//! # Recompute everyone's points (owner only)
//! nb-cli --as owner@example.com points update
//!
//! # Swap the protein card for fat
//! nb-cli --as me@example.com prefs replace protein fat
//!
//! # Interactive card editor with undo
//! nb-cli --as me@example.com prefs edit
//! ```
//!
//! # Commands
//!
//! - `users` - List, approve, revoke and delete users
//! - `points update` - Recompute every user's points
//! - `db update` - Run the backend database update
//! - `prefs` - Show and edit card nutrient preferences
//!
//! The acting user comes from `--as` or `NUTRIBASE_USER_EMAIL`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use nutribase_client::UserQuery;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::Context;

#[derive(Parser)]
#[command(name = "nb-cli")]
#[command(author, version, about = "Nutribase operator tools")]
struct Cli {
    /// Email of the acting user (overrides `NUTRIBASE_USER_EMAIL`)
    #[arg(long = "as", global = true, value_name = "EMAIL")]
    acting_as: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage directory users
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },
    /// Contribution points maintenance
    Points {
        #[command(subcommand)]
        action: UpdateAction,
    },
    /// Backend database maintenance
    Db {
        #[command(subcommand)]
        action: UpdateAction,
    },
    /// Card nutrient preferences of the acting user
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },
}

#[derive(Subcommand)]
enum UsersAction {
    /// List users
    List {
        /// Which users to list (`all`, `approved`, `pending`)
        #[arg(short, long, default_value = "pending")]
        query: UserQuery,
    },
    /// Approve a user
    Approve { email: String },
    /// Revoke a user's approval
    Revoke { email: String },
    /// Delete a user (owner only)
    Delete { email: String },
}

#[derive(Subcommand)]
enum UpdateAction {
    /// Run the update
    Update,
}

#[derive(Subcommand)]
enum PrefsAction {
    /// Show the card nutrients
    Show,
    /// List replacements for a displayed nutrient
    Candidates { target: String },
    /// Replace a displayed nutrient
    Replace {
        /// Nutrient to replace
        target: String,
        /// Replacement nutrient name
        name: String,
        /// Replacement label; looked up in the catalog when omitted
        label: Option<String>,
    },
    /// Restore the default card nutrients
    Reset,
    /// Edit interactively, with undo
    Edit,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

/// Text logs by default, JSON when `NUTRIBASE_LOG_JSON` is set.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "nutribase_cli=info,nutribase_client=info".into());

    let json = std::env::var("NUTRIBASE_LOG_JSON")
        .is_ok_and(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"));
    let json_layer = json.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!json).then(|| tracing_subscriber::fmt::layer().with_target(false));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::load(cli.acting_as)?;
    match cli.command {
        Commands::Users { action } => match action {
            UsersAction::List { query } => commands::users::list(&ctx, query).await?,
            UsersAction::Approve { email } => commands::users::approve(&ctx, &email).await?,
            UsersAction::Revoke { email } => commands::users::revoke(&ctx, &email).await?,
            UsersAction::Delete { email } => commands::users::delete(&ctx, &email).await?,
        },
        Commands::Points {
            action: UpdateAction::Update,
        } => commands::maintenance::update_points(&ctx).await?,
        Commands::Db {
            action: UpdateAction::Update,
        } => commands::maintenance::update_db(&ctx).await?,
        Commands::Prefs { action } => match action {
            PrefsAction::Show => commands::prefs::show(&ctx).await?,
            PrefsAction::Candidates { target } => {
                commands::prefs::candidates(&ctx, &target).await?;
            }
            PrefsAction::Replace {
                target,
                name,
                label,
            } => commands::prefs::replace(&ctx, &target, &name, label.as_deref()).await?,
            PrefsAction::Reset => commands::prefs::reset(&ctx).await?,
            PrefsAction::Edit => commands::prefs::edit(&ctx).await?,
        },
    }
    Ok(())
}
