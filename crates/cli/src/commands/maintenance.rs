//! Owner-only bulk operations.

use nutribase_client::UserQuery;

use super::{CommandError, Context};

/// Recompute every user's contribution points.
pub async fn update_points(ctx: &Context) -> Result<(), CommandError> {
    let panel = ctx.admin_panel(UserQuery::NotApproved).await?;
    tracing::info!("Updating points for all users...");
    let payload = panel.update_points().await?;
    tracing::info!("Points updated: {payload}");
    Ok(())
}

/// Run the backend database update. Requires `NUTRIBASE_ENABLE_UPDATE_DB`.
pub async fn update_db(ctx: &Context) -> Result<(), CommandError> {
    let panel = ctx.admin_panel(UserQuery::NotApproved).await?;
    if !ctx.config.enable_update_db {
        tracing::warn!("Database update is disabled; set NUTRIBASE_ENABLE_UPDATE_DB=true");
    }
    tracing::info!("Updating database...");
    let payload = panel.update_database().await?;
    tracing::info!("Database updated: {payload}");
    Ok(())
}
