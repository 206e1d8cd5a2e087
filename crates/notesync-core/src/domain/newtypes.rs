//! Domain newtypes with validation
//!
//! This module provides strongly-typed wrappers for note identifiers,
//! server revisions and colors. Each newtype ensures data validity at
//! construction time.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;

// ============================================================================
// NoteId
// ============================================================================

/// Identifier of a note, generated client-side and never changed afterwards.
///
/// Freshly created notes get a random UUIDv4 string, but any non-empty
/// string received from the server is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    /// Create a new random NoteId
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the inner string value
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the NoteId and return the inner string
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Default for NoteId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for NoteId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for NoteId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidId("note id cannot be empty".into()));
        }
        if trimmed.contains('/') {
            return Err(DomainError::InvalidId(format!(
                "note id cannot contain '/': {trimmed}"
            )));
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl AsRef<str> for NoteId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// Revision
// ============================================================================

/// Server-owned revision counter of the whole note collection
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Revision(i64);

impl Revision {
    /// Revision assumed before the first successful server exchange
    pub const INITIAL: Revision = Revision(0);

    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl Display for Revision {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Revision {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

// ============================================================================
// NoteColor
// ============================================================================

/// RGB color of a note, serialized as `#RRGGBB`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NoteColor(u32);

impl NoteColor {
    /// White, the color every note starts with
    pub const DEFAULT: NoteColor = NoteColor(0xFF_FF_FF);

    /// Create a color from a `0xRRGGBB` value; any alpha byte is discarded.
    #[must_use]
    pub const fn from_rgb(rgb: u32) -> Self {
        Self(rgb & 0xFF_FF_FF)
    }

    /// Get the `0xRRGGBB` value
    #[must_use]
    pub const fn rgb(self) -> u32 {
        self.0
    }

    /// Returns true if this is the default (white) color
    #[must_use]
    pub const fn is_default(self) -> bool {
        self.0 == Self::DEFAULT.0
    }
}

impl Default for NoteColor {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl Display for NoteColor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06X}", self.0)
    }
}

impl FromStr for NoteColor {
    type Err = DomainError;

    /// Parse `#RRGGBB` or `#AARRGGBB` (case-insensitive)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .trim()
            .strip_prefix('#')
            .ok_or_else(|| DomainError::InvalidColor(s.to_string()))?;

        if hex.len() != 6 && hex.len() != 8 {
            return Err(DomainError::InvalidColor(s.to_string()));
        }

        u32::from_str_radix(hex, 16)
            .map(Self::from_rgb)
            .map_err(|_| DomainError::InvalidColor(s.to_string()))
    }
}

impl TryFrom<String> for NoteColor {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<NoteColor> for String {
    fn from(color: NoteColor) -> Self {
        color.to_string()
    }
}
