//! Watch command - Follow the note list as it changes
//!
//! Starts a background sync, then prints every published snapshot of the
//! cache until interrupted with Ctrl-C.

use anyhow::Result;
use chrono::Utc;
use clap::Args;
use tracing::{debug, info};

use notesync_core::config::Config;

use crate::context::AppContext;
use crate::output::{get_formatter, note_json, note_line, OutputFormat};

#[derive(Debug, Args)]
pub struct WatchCommand {
    /// Do not fetch from the server before watching
    #[arg(long)]
    pub offline: bool,
}

impl WatchCommand {
    pub async fn execute(&self, config: Config, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format.is_json());
        let ctx = AppContext::build(config).await?;

        let mut notes = ctx.coordinator.notes_stream();
        let sync = (!self.offline).then(|| ctx.coordinator.spawn_initial_sync());

        info!(offline = self.offline, "Watching note cache");
        formatter.info("Watching notes (Ctrl-C to stop)");

        let interrupted = tokio::signal::ctrl_c();
        tokio::pin!(interrupted);

        loop {
            tokio::select! {
                _ = &mut interrupted => {
                    debug!("Interrupted");
                    break;
                }
                snapshot = notes.next() => {
                    let Some(snapshot) = snapshot else { break };
                    if format.is_json() {
                        let items: Vec<_> = snapshot.iter().map(note_json).collect();
                        formatter.print_json(&serde_json::json!({
                            "revision": ctx.coordinator.revision().value(),
                            "notes": items,
                        }));
                    } else {
                        println!("--- {} note(s), revision {}", snapshot.len(), ctx.coordinator.revision());
                        let now = Utc::now();
                        for note in snapshot.iter() {
                            println!("{}", note_line(note, now));
                        }
                    }
                }
            }
        }

        if let Some(handle) = sync {
            handle.abort();
        }
        Ok(())
    }
}
