//! Sync command - Reconcile the local cache with the server
//!
//! Provides the `notesync sync` CLI command which either:
//! 1. Fetches the server list and replaces the cache with it (default), or
//! 2. Uploads the whole cache as the new server list (`--push`)

use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use notesync_core::config::Config;

use crate::context::AppContext;
use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Args)]
pub struct SyncCommand {
    /// Replace the server list with the local cache instead of pulling
    #[arg(long)]
    pub push: bool,
}

impl SyncCommand {
    pub async fn execute(&self, config: Config, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format.is_json());
        let ctx = AppContext::build(config).await?;
        let started = Instant::now();

        let count = if self.push {
            formatter.info("Pushing local notes to server...");
            ctx.coordinator
                .push_cache_to_backend()
                .await
                .context("Failed to push local notes")?
                .len()
        } else {
            formatter.info("Fetching notes from server...");
            ctx.coordinator
                .sync_with_backend()
                .await
                .context("Failed to synchronize with server")?;
            ctx.coordinator.notes_stream().current().len()
        };

        let duration_ms = started.elapsed().as_millis() as u64;
        let revision = ctx.coordinator.revision();
        info!(count, %revision, duration_ms, push = self.push, "Sync finished");

        if format.is_json() {
            formatter.print_json(&serde_json::json!({
                "direction": if self.push { "push" } else { "pull" },
                "notes": count,
                "revision": revision.value(),
                "duration_ms": duration_ms,
            }));
        } else {
            let duration_display = if duration_ms >= 1000 {
                format!("{:.1}s", duration_ms as f64 / 1000.0)
            } else {
                format!("{}ms", duration_ms)
            };
            formatter.success(&format!(
                "Synchronized {} note{} at revision {} in {}",
                count,
                if count == 1 { "" } else { "s" },
                revision,
                duration_display
            ));
        }
        Ok(())
    }
}
