//! Command implementations.

pub mod agents;
pub mod auth;
pub mod environments;
pub mod tasks;

use crate::output::{self, OutputFormat};
use anyhow::Result;
use console_api::MaasClient;
use console_auth::{RefreshScheduler, SessionManager};
use std::sync::Arc;

/// Shared context passed to every command.
pub struct AppContext {
    pub session: Arc<SessionManager>,
    pub client: MaasClient,
    pub scheduler: RefreshScheduler,
    pub format: OutputFormat,
}

/// Check platform health.
pub async fn health(ctx: &AppContext) -> Result<()> {
    match ctx.client.health().await {
        Ok(health) => match ctx.format {
            OutputFormat::Text => {
                println!("{} ({} {})", health.status, health.service, health.version);
            }
            OutputFormat::Json => output::print_json(&serde_json::json!({
                "status": health.status,
                "service": health.service,
                "version": health.version,
                "timestamp": health.timestamp,
            })),
        },
        Err(e) => output::print_error(&format!("Health check failed: {e}"), &ctx.format),
    }
    Ok(())
}
