//! Note record and field validation.
//!
//! # Invariants
//! - `id` is `None` only on the pre-insert value.
//! - `created_at` is set once; `updated_at >= created_at`.
//! - `deleted_at.is_some()` is the source of truth for trash state.

use crate::model::image::validate_image;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned note identifier.
pub type NoteId = i64;

/// Unix epoch milliseconds.
pub type EpochMs = i64;

/// A single note, active or trashed.
///
/// Serialized with camelCase keys (`createdAt`, `deletedAt`, ...), which is
/// the shape consumers render and export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<NoteId>,
    pub title: String,
    #[serde(default)]
    pub content: String,
    /// Inline `data:image/...;base64,` payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub created_at: EpochMs,
    pub updated_at: EpochMs,
    #[serde(default)]
    pub deleted_at: Option<EpochMs>,
}

impl Note {
    /// Builds the pre-insert value of a fresh, active note.
    ///
    /// No validation happens here; see [`validate_title`] and
    /// [`validate_image`].
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        image: Option<String>,
        now: EpochMs,
    ) -> Self {
        Self {
            id: None,
            title: title.into(),
            content: content.into(),
            image,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Returns whether this note sits in the trash.
    pub fn is_trashed(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Returns whether this note is visible in the active view.
    pub fn is_active(&self) -> bool {
        !self.is_trashed()
    }

    /// Validates every user-supplied field.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        validate_title(&self.title)?;
        if let Some(image) = self.image.as_deref() {
            validate_image(image)?;
        }
        Ok(())
    }
}

/// Field-level validation failure. Never reaches the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteValidationError {
    /// Title is empty or whitespace-only.
    EmptyTitle,
    /// Image is not a base64 `data:image/*` URL.
    InvalidImage(String),
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "note title must not be empty"),
            Self::InvalidImage(reason) => write!(f, "invalid note image: {reason}"),
        }
    }
}

impl Error for NoteValidationError {}

/// Rejects titles that are empty after trimming.
pub fn validate_title(title: &str) -> Result<(), NoteValidationError> {
    if title.trim().is_empty() {
        return Err(NoteValidationError::EmptyTitle);
    }
    Ok(())
}
