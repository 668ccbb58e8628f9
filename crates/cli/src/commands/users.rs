//! User listing and approval commands.

use nutribase_client::{AdminPanel, ApprovalAction, UserQuery, UserRow};

use super::{CommandError, Context, parse_email};

/// List users matching `query`.
pub async fn list(ctx: &Context, query: UserQuery) -> Result<(), CommandError> {
    let panel = ctx.admin_panel(query).await?;
    log_rows(&panel);
    Ok(())
}

pub async fn approve(ctx: &Context, email: &str) -> Result<(), CommandError> {
    set_approval(ctx, email, ApprovalAction::Approve).await
}

pub async fn revoke(ctx: &Context, email: &str) -> Result<(), CommandError> {
    set_approval(ctx, email, ApprovalAction::Revoke).await
}

/// Delete a user. Owner only.
pub async fn delete(ctx: &Context, email: &str) -> Result<(), CommandError> {
    let email = parse_email(email)?;
    let mut panel = ctx.admin_panel(UserQuery::All).await?;
    panel.delete_user(&email).await?;
    tracing::info!("Deleted {email}");
    log_rows(&panel);
    Ok(())
}

async fn set_approval(
    ctx: &Context,
    email: &str,
    action: ApprovalAction,
) -> Result<(), CommandError> {
    let email = parse_email(email)?;
    let mut panel = ctx.admin_panel(UserQuery::NotApproved).await?;
    panel.set_approval(&email, action).await?;
    tracing::info!("{}: {email}", action.label());
    log_rows(&panel);
    Ok(())
}

fn log_rows(panel: &AdminPanel) {
    tracing::info!("{}", panel.title());
    for row in panel.rows().unwrap_or_default() {
        tracing::info!("{}", format_row(row));
    }
}

fn format_row(row: &UserRow) -> String {
    let status = if row.user.approved { "approved" } else { "pending" };
    let action = if row.action_enabled {
        row.action.label().to_owned()
    } else {
        format!("({})", row.action.label())
    };
    let delete = if row.deletable { " Delete" } else { "" };
    format!(
        "{:<32} {:<5} {:<8} {action}{delete}",
        row.user.email.as_str(),
        row.role,
        status
    )
}
