//! Wire types of the notes API
//!
//! ## Mapping
//!
//! | Note field          | Wire field        | Notes                                   |
//! |---------------------|-------------------|-----------------------------------------|
//! | `title` + `body`    | `text`            | joined with `\n`, split at the first one |
//! | `importance`        | `importance`      | `low` / `basic` / `important`           |
//! | `color`             | `color`           | `#RRGGBB`, omitted when white           |
//! | `self_destruct_at`  | `deadline`        | epoch milliseconds                      |
//! | `created_at`        | `created_at`      | epoch milliseconds                      |
//! | `last_modified_at`  | `changed_at`      | epoch milliseconds                      |
//! | `last_modified_by`  | `last_updated_by` |                                         |
//!
//! `done` is always sent as `false` and ignored on receipt.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use notesync_core::domain::{Importance, Note, NoteColor, NoteId, SyncError};

/// A note as exchanged with the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteDto {
    pub id: String,
    pub text: String,
    pub importance: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<i64>,
    #[serde(default)]
    pub done: bool,
    pub created_at: i64,
    #[serde(default)]
    pub changed_at: Option<i64>,
    #[serde(default)]
    pub last_updated_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl From<&Note> for NoteDto {
    fn from(note: &Note) -> Self {
        let text = format!("{}\n{}", note.title(), note.body());
        let color = (!note.color().is_default()).then(|| note.color().to_string());

        Self {
            id: note.id().to_string(),
            text,
            importance: note.importance().wire_token().to_string(),
            deadline: note.self_destruct_at().map(|d| d.timestamp_millis()),
            done: false,
            created_at: note.created_at().timestamp_millis(),
            changed_at: Some(note.last_modified_at().timestamp_millis()),
            last_updated_by: note.last_modified_by().to_string(),
            color,
        }
    }
}

fn from_millis(field: &str, ms: i64) -> Result<DateTime<Utc>, SyncError> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| SyncError::Unknown(format!("{field} out of range: {ms}")))
}

impl TryFrom<NoteDto> for Note {
    type Error = SyncError;

    fn try_from(dto: NoteDto) -> Result<Self, Self::Error> {
        let id: NoteId = dto
            .id
            .parse()
            .map_err(|e| SyncError::Unknown(format!("bad note id from server: {e}")))?;

        let (title, body) = match dto.text.split_once('\n') {
            Some((title, body)) => (title.to_string(), body.to_string()),
            None => (dto.text, String::new()),
        };

        let color = match dto.color.as_deref() {
            None => NoteColor::DEFAULT,
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!(note_id = %id, color = raw, "Ignoring unparseable color");
                NoteColor::DEFAULT
            }),
        };

        let created_at = from_millis("created_at", dto.created_at)?;
        let last_modified_at = match dto.changed_at {
            Some(ms) => from_millis("changed_at", ms)?,
            None => created_at,
        };
        let self_destruct_at = dto
            .deadline
            .map(|ms| from_millis("deadline", ms))
            .transpose()?;

        Ok(Note::with_id(
            id,
            title,
            body,
            color,
            Importance::from_wire(&dto.importance),
            self_destruct_at,
            created_at,
            last_modified_at,
            dto.last_updated_by,
        ))
    }
}

/// Convert a received list, failing on the first undecodable element
pub(crate) fn notes_from_dtos(dtos: Vec<NoteDto>) -> Result<Vec<Note>, SyncError> {
    dtos.into_iter().map(Note::try_from).collect()
}

// ============================================================================
// Envelopes
// ============================================================================

/// Body of `POST /list` and `PUT /list/{id}`
#[derive(Debug, Serialize)]
pub struct ElementRequest {
    pub element: NoteDto,
}

/// Body of `PATCH /list`
#[derive(Debug, Serialize)]
pub struct ListRequest {
    pub list: Vec<NoteDto>,
}

/// Response carrying a single note
#[derive(Debug, Deserialize)]
pub struct ElementResponse {
    #[serde(default)]
    pub status: Option<String>,
    pub element: NoteDto,
    pub revision: i64,
}

/// Response carrying the whole list
#[derive(Debug, Deserialize)]
pub struct ListResponse {
    #[serde(default)]
    pub status: Option<String>,
    pub list: Vec<NoteDto>,
    pub revision: i64,
}
