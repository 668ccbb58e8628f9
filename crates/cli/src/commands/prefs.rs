//! Card nutrient preference commands.
//!
//! One-shot commands open a session, apply a single change and wait for it
//! to be stored. `edit` keeps the session open and reads commands from
//! stdin, so replacements can be undone.

use nutribase_client::{Session, SyncStatus};
use nutribase_core::NutrientSelection;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{CommandError, Context};

const EDIT_HELP: &str = "commands: show | select <nutrient> | candidates | replace <name> [label] | cancel | reset | undo | status | quit";

/// Show the acting user's card nutrients.
pub async fn show(ctx: &Context) -> Result<(), CommandError> {
    let session = ctx.session().await?;
    log_cards(&session);
    session.close().await;
    Ok(())
}

/// List nutrients that could replace `target`.
pub async fn candidates(ctx: &Context, target: &str) -> Result<(), CommandError> {
    let mut session = ctx.session().await?;
    let candidates = session.select(target)?;
    log_candidates(target, &candidates);
    session.close().await;
    Ok(())
}

/// Replace `target` with `name`, using `label` or the catalog's label.
pub async fn replace(
    ctx: &Context,
    target: &str,
    name: &str,
    label: Option<&str>,
) -> Result<(), CommandError> {
    let mut session = ctx.session().await?;
    session.select(target)?;
    match label {
        Some(label) => session.replace(NutrientSelection::new(name, label))?,
        None => session.replace_with(name)?,
    };
    log_cards(&session);
    finish(session).await
}

/// Restore the default card nutrients.
pub async fn reset(ctx: &Context) -> Result<(), CommandError> {
    let mut session = ctx.session().await?;
    session.reset()?;
    log_cards(&session);
    finish(session).await
}

/// Interactive editor over stdin.
pub async fn edit(ctx: &Context) -> Result<(), CommandError> {
    let mut session = ctx.session().await?;
    tracing::info!("Editing cards for {}", session.user().email);
    log_cards(&session);
    tracing::info!("{EDIT_HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match parse_edit_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                tracing::warn!("{message}");
                continue;
            }
        };
        if command == EditCommand::Quit {
            break;
        }
        apply(&mut session, command).await;
    }

    finish(session).await
}

/// A line of input to the interactive editor.
#[derive(Debug, Clone, PartialEq, Eq)]
enum EditCommand {
    Show,
    Select(String),
    Candidates,
    Replace { name: String, label: Option<String> },
    Cancel,
    Reset,
    Undo,
    Status,
    Help,
    Quit,
}

/// Parse one input line; blank lines yield `None`.
fn parse_edit_command(line: &str) -> Result<Option<EditCommand>, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let rest: Vec<&str> = words.collect();

    let command = match (verb.to_ascii_lowercase().as_str(), rest.as_slice()) {
        ("show" | "ls", []) => EditCommand::Show,
        ("select" | "sel", [name]) => EditCommand::Select((*name).to_owned()),
        ("candidates" | "cand", []) => EditCommand::Candidates,
        ("replace" | "rep", [name]) => EditCommand::Replace {
            name: (*name).to_owned(),
            label: None,
        },
        ("replace" | "rep", [name, label @ ..]) => EditCommand::Replace {
            name: (*name).to_owned(),
            label: Some(label.join(" ")),
        },
        ("cancel", []) => EditCommand::Cancel,
        ("reset", []) => EditCommand::Reset,
        ("undo", []) => EditCommand::Undo,
        ("status", []) => EditCommand::Status,
        ("help" | "?", []) => EditCommand::Help,
        ("quit" | "exit" | "q", []) => EditCommand::Quit,
        _ => return Err(format!("Cannot parse '{}'; {EDIT_HELP}", line.trim())),
    };
    Ok(Some(command))
}

async fn apply(session: &mut Session, command: EditCommand) {
    let result = match command {
        EditCommand::Show => {
            log_cards(session);
            Ok(())
        }
        EditCommand::Select(name) => session.select(&name).map(|candidates| {
            log_candidates(&name, &candidates);
        }),
        EditCommand::Candidates => session.candidates().map(|candidates| {
            let target = session.editor().target().unwrap_or_default().to_owned();
            log_candidates(&target, &candidates);
        }),
        EditCommand::Replace { name, label } => {
            let result = match label {
                Some(label) => session.replace(NutrientSelection::new(name, label)),
                None => session.replace_with(&name),
            };
            result.map(|_| log_cards(session))
        }
        EditCommand::Cancel => {
            session.cancel();
            Ok(())
        }
        EditCommand::Reset => session.reset().map(|_| log_cards(session)),
        EditCommand::Undo => session.undo().map(|_| log_cards(session)),
        EditCommand::Status => {
            log_status(&session.sync_status());
            if session.sync_status().is_failed()
                && let Err(e) = session.reconcile().await
            {
                tracing::error!("Reload failed: {e}");
            }
            Ok(())
        }
        EditCommand::Help => {
            tracing::info!("{EDIT_HELP}");
            Ok(())
        }
        EditCommand::Quit => Ok(()),
    };
    if let Err(e) = result {
        tracing::warn!("{e}");
    }
}

/// Wait for outstanding saves and report whether they landed.
async fn finish(session: Session) -> Result<(), CommandError> {
    match session.close().await {
        SyncStatus::Failed { message, .. } => Err(CommandError::SaveFailed(message)),
        status => {
            log_status(&status);
            Ok(())
        }
    }
}

fn log_cards(session: &Session) {
    let Some(preferences) = session.preferences() else {
        tracing::info!("Loading user data...");
        return;
    };
    for (i, nutrient) in preferences.card_nutrients.iter().enumerate() {
        tracing::info!("{:>2}. {nutrient}", i + 1);
    }
    let mut actions = Vec::new();
    if session.can_undo() {
        actions.push("undo");
    }
    if session.can_reset() {
        actions.push("reset");
    }
    if !actions.is_empty() {
        tracing::info!("available: {}", actions.join(", "));
    }
}

fn log_candidates(target: &str, candidates: &[NutrientSelection]) {
    tracing::info!("Replace {target} with:");
    for candidate in candidates {
        tracing::info!("  {candidate}");
    }
}

fn log_status(status: &SyncStatus) {
    match status {
        SyncStatus::Idle => tracing::info!("No changes saved"),
        SyncStatus::Pending { version } => tracing::info!("Saving change #{version}..."),
        SyncStatus::Synced { version, at } => {
            tracing::info!("Change #{version} saved at {}", at.format("%H:%M:%S"));
        }
        SyncStatus::Failed { version, message } => {
            tracing::error!("Change #{version} was not saved: {message}; reloading stored cards");
        }
    }
}
