//! Note domain entity
//!
//! A [`Note`] is the unit of synchronization. Notes are identified by a
//! client-generated [`NoteId`] which is the only join key between the local
//! cache and the server.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use super::{
    errors::DomainError,
    newtypes::{NoteColor, NoteId},
};

/// Current time truncated to whole milliseconds.
///
/// Both the wire format and the SQLite cache store timestamps in
/// milliseconds, so every timestamp a note carries uses that precision.
pub fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Priority of a note
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Importance {
    Low,
    #[default]
    Normal,
    High,
}

impl Importance {
    /// Token used by the HTTP API
    pub fn wire_token(self) -> &'static str {
        match self {
            Importance::Low => "low",
            Importance::Normal => "basic",
            Importance::High => "important",
        }
    }

    /// Parse a token received from the server.
    ///
    /// Unknown tokens map to [`Importance::Normal`] so that a newer server
    /// never makes a whole list undecodable.
    pub fn from_wire(token: &str) -> Self {
        token.parse().unwrap_or_default()
    }

    /// Stable lowercase name used by the local stores
    pub fn as_str(self) -> &'static str {
        match self {
            Importance::Low => "low",
            Importance::Normal => "normal",
            Importance::High => "high",
        }
    }
}

impl std::fmt::Display for Importance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Importance {
    type Err = DomainError;

    /// Accepts both local names and wire tokens, case-insensitively
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Importance::Low),
            "normal" | "basic" => Ok(Importance::Normal),
            "high" | "important" => Ok(Importance::High),
            other => Err(DomainError::InvalidImportance(other.to_string())),
        }
    }
}

/// A single note
///
/// All mutators refresh `last_modified_at`. Call [`Note::touch`] to also
/// record which client made the change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    id: NoteId,
    title: String,
    body: String,
    #[serde(default)]
    color: NoteColor,
    #[serde(default)]
    importance: Importance,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    self_destruct_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    last_modified_at: DateTime<Utc>,
    last_modified_by: String,
}

impl Note {
    /// Create a brand new note with a random id
    pub fn new(
        title: impl Into<String>,
        body: impl Into<String>,
        modified_by: impl Into<String>,
    ) -> Self {
        Self::new_with_id(NoteId::new(), title, body, modified_by)
    }

    /// Create a brand new note with a caller-chosen id
    pub fn new_with_id(
        id: NoteId,
        title: impl Into<String>,
        body: impl Into<String>,
        modified_by: impl Into<String>,
    ) -> Self {
        let now = now_millis();
        Self {
            id,
            title: single_line(title.into()),
            body: body.into(),
            color: NoteColor::DEFAULT,
            importance: Importance::Normal,
            self_destruct_at: None,
            created_at: now,
            last_modified_at: now,
            last_modified_by: modified_by.into(),
        }
    }

    /// Reconstruct a note from persisted or received fields
    #[allow(clippy::too_many_arguments)]
    pub fn with_id(
        id: NoteId,
        title: String,
        body: String,
        color: NoteColor,
        importance: Importance,
        self_destruct_at: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
        last_modified_at: DateTime<Utc>,
        last_modified_by: String,
    ) -> Self {
        Self {
            id,
            title,
            body,
            color,
            importance,
            self_destruct_at,
            created_at,
            last_modified_at,
            last_modified_by,
        }
    }

    // --- accessors ---

    pub fn id(&self) -> &NoteId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn color(&self) -> NoteColor {
        self.color
    }

    pub fn importance(&self) -> Importance {
        self.importance
    }

    pub fn self_destruct_at(&self) -> Option<DateTime<Utc>> {
        self.self_destruct_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_modified_at(&self) -> DateTime<Utc> {
        self.last_modified_at
    }

    pub fn last_modified_by(&self) -> &str {
        &self.last_modified_by
    }

    /// Returns true once the self-destruct deadline has passed
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.self_destruct_at.is_some_and(|deadline| deadline <= now)
    }

    // --- mutators ---

    /// Line breaks are folded into spaces; the wire text ends the title at
    /// the first newline.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = single_line(title.into());
        self.last_modified_at = now_millis();
    }

    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = body.into();
        self.last_modified_at = now_millis();
    }

    pub fn set_color(&mut self, color: NoteColor) {
        self.color = color;
        self.last_modified_at = now_millis();
    }

    pub fn set_importance(&mut self, importance: Importance) {
        self.importance = importance;
        self.last_modified_at = now_millis();
    }

    pub fn set_self_destruct_at(&mut self, deadline: Option<DateTime<Utc>>) {
        self.self_destruct_at = deadline.map(|d| d.trunc_subsecs(3));
        self.last_modified_at = now_millis();
    }

    /// Record a modification by `client`
    pub fn touch(&mut self, client: impl Into<String>) {
        self.last_modified_by = client.into();
        self.last_modified_at = now_millis();
    }
}

fn single_line(title: String) -> String {
    if !title.contains(['\n', '\r']) {
        return title;
    }
    title
        .replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
}
