//! Note commands - Read and edit notes
//!
//! Reads are served from the local cache unless `--refresh` is given.
//! Edits are saved to the cache first and then pushed; a failed push leaves
//! the local copy in place and is reported as a warning.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use clap::{Args, Subcommand};
use tracing::info;

use notesync_core::config::Config;
use notesync_core::domain::{Importance, Note, NoteColor, NoteId, SyncError};

use crate::context::AppContext;
use crate::output::{get_formatter, note_details, note_json, note_line, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum NoteCommand {
    /// List notes, newest first
    List {
        /// Fetch from the server instead of answering from the cache
        #[arg(long)]
        refresh: bool,
    },
    /// Show a single note
    Show {
        /// Note identifier
        id: String,
        /// Fetch from the server instead of answering from the cache
        #[arg(long)]
        refresh: bool,
    },
    /// Create a note
    Add(AddArgs),
    /// Change fields of an existing note
    Edit(EditArgs),
    /// Delete a note
    Rm {
        /// Note identifier
        id: String,
    },
}

#[derive(Debug, Args)]
pub struct AddArgs {
    /// Note title
    #[arg(long)]
    pub title: String,
    /// Note body
    #[arg(long, default_value = "")]
    pub body: String,
    #[command(flatten)]
    pub attributes: AttributeArgs,
}

#[derive(Debug, Args)]
pub struct EditArgs {
    /// Note identifier
    pub id: String,
    /// New title
    #[arg(long)]
    pub title: Option<String>,
    /// New body
    #[arg(long)]
    pub body: Option<String>,
    #[command(flatten)]
    pub attributes: AttributeArgs,
    /// Remove the self-destruct deadline
    #[arg(long, conflicts_with = "self_destruct")]
    pub no_self_destruct: bool,
}

/// Attributes shared by `add` and `edit`
#[derive(Debug, Args)]
pub struct AttributeArgs {
    /// low, normal or high
    #[arg(long)]
    pub importance: Option<Importance>,
    /// Color as #RRGGBB
    #[arg(long)]
    pub color: Option<NoteColor>,
    /// Deadline as RFC 3339 or relative (30m, 2h, 7d)
    #[arg(long, value_parser = parse_deadline)]
    pub self_destruct: Option<DateTime<Utc>>,
}

impl AttributeArgs {
    fn apply(&self, note: &mut Note) {
        if let Some(importance) = self.importance {
            note.set_importance(importance);
        }
        if let Some(color) = self.color {
            note.set_color(color);
        }
        if let Some(deadline) = self.self_destruct {
            note.set_self_destruct_at(Some(deadline));
        }
    }
}

impl NoteCommand {
    pub async fn execute(&self, config: Config, format: OutputFormat) -> Result<()> {
        let ctx = AppContext::build(config).await?;
        match self {
            NoteCommand::List { refresh } => list(&ctx, *refresh, format).await,
            NoteCommand::Show { id, refresh } => show(&ctx, &parse_id(id)?, *refresh, format).await,
            NoteCommand::Add(args) => add(&ctx, args, format).await,
            NoteCommand::Edit(args) => edit(&ctx, args, format).await,
            NoteCommand::Rm { id } => remove(&ctx, &parse_id(id)?, format).await,
        }
    }
}

async fn list(ctx: &AppContext, refresh: bool, format: OutputFormat) -> Result<()> {
    let formatter = get_formatter(format.is_json());
    let notes = ctx.coordinator.get_all_notes(refresh).await;

    if format.is_json() {
        let items: Vec<_> = notes.iter().map(note_json).collect();
        formatter.print_json(&serde_json::json!({
            "revision": ctx.coordinator.revision().value(),
            "notes": items,
        }));
        return Ok(());
    }

    if notes.is_empty() {
        formatter.info("No notes");
        return Ok(());
    }
    let now = Utc::now();
    for note in &notes {
        println!("{}", note_line(note, now));
    }
    Ok(())
}

async fn show(ctx: &AppContext, id: &NoteId, refresh: bool, format: OutputFormat) -> Result<()> {
    let formatter = get_formatter(format.is_json());

    let Some(note) = ctx.coordinator.get_note(id, refresh).await else {
        formatter.error(&format!("Note {} not found", id));
        return Ok(());
    };

    if format.is_json() {
        formatter.print_json(&note_json(&note));
    } else {
        for line in note_details(&note) {
            formatter.info(&line);
        }
    }
    Ok(())
}

async fn add(ctx: &AppContext, args: &AddArgs, format: OutputFormat) -> Result<()> {
    let mut note = Note::new(args.title.clone(), args.body.clone(), ctx.client_id());
    args.attributes.apply(&mut note);

    info!(note_id = %note.id(), "Adding note");
    save(ctx, note, format).await
}

async fn edit(ctx: &AppContext, args: &EditArgs, format: OutputFormat) -> Result<()> {
    let formatter = get_formatter(format.is_json());
    let id = parse_id(&args.id)?;

    let Some(mut note) = ctx.coordinator.get_note(&id, false).await else {
        formatter.error(&format!("Note {} not found", id));
        return Ok(());
    };

    if let Some(title) = &args.title {
        note.set_title(title.clone());
    }
    if let Some(body) = &args.body {
        note.set_body(body.clone());
    }
    args.attributes.apply(&mut note);
    if args.no_self_destruct {
        note.set_self_destruct_at(None);
    }
    note.touch(ctx.client_id());

    info!(note_id = %id, "Editing note");
    save(ctx, note, format).await
}

async fn save(ctx: &AppContext, note: Note, format: OutputFormat) -> Result<()> {
    let formatter = get_formatter(format.is_json());

    match ctx.coordinator.save_note(&note).await {
        Ok(saved) => {
            if format.is_json() {
                formatter.print_json(&serde_json::json!({
                    "success": true,
                    "synced": true,
                    "revision": ctx.coordinator.revision().value(),
                    "note": note_json(&saved),
                }));
            } else {
                formatter.success(&format!("Saved note {}", saved.id()));
            }
            Ok(())
        }
        Err(e) if !matches!(e, SyncError::Storage(_)) => {
            if format.is_json() {
                formatter.print_json(&serde_json::json!({
                    "success": true,
                    "synced": false,
                    "error": e.to_string(),
                    "note": note_json(&note),
                }));
            } else {
                formatter.success(&format!("Saved note {} locally", note.id()));
                formatter.warn(&format!("Not pushed to server: {}", e));
            }
            Ok(())
        }
        Err(e) => Err(e).context("Failed to save note to the local cache"),
    }
}

async fn remove(ctx: &AppContext, id: &NoteId, format: OutputFormat) -> Result<()> {
    let formatter = get_formatter(format.is_json());

    ctx.coordinator
        .delete_note(id)
        .await
        .with_context(|| format!("Failed to delete note {}", id))?;

    if format.is_json() {
        formatter.print_json(&serde_json::json!({
            "success": true,
            "id": id.as_str(),
            "revision": ctx.coordinator.revision().value(),
        }));
    } else {
        formatter.success(&format!("Deleted note {}", id));
    }
    Ok(())
}

fn parse_id(raw: &str) -> Result<NoteId> {
    raw.parse::<NoteId>()
        .with_context(|| format!("Invalid note id '{}'", raw))
}

/// Parses an absolute RFC 3339 timestamp or a relative offset from now
fn parse_deadline(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc));
    }

    let raw = raw.trim();
    let unit = raw.chars().last().ok_or("empty deadline")?;
    let amount: i64 = raw[..raw.len() - unit.len_utf8()]
        .parse()
        .map_err(|_| format!("expected RFC 3339 or <number>[m|h|d], got '{}'", raw))?;
    let offset = match unit {
        'm' => Duration::try_minutes(amount),
        'h' => Duration::try_hours(amount),
        'd' => Duration::try_days(amount),
        _ => return Err(format!("unknown unit '{}' (use m, h or d)", unit)),
    };
    offset
        .and_then(|offset| Utc::now().checked_add_signed(offset))
        .ok_or_else(|| format!("deadline '{}' is out of range", raw))
}
