//! Store contract shared by every note persistence backend.
//!
//! # Invariants
//! - `create` assigns ids that are unique across the store lifetime, also
//!   after permanent deletion.
//! - `update` merges only the fields present in the patch.
//! - A write is durable once the call returns `Ok`.

use crate::db::DbError;
use crate::model::note::{EpochMs, Note, NoteId};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Store-level error for note persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(NoteId),
    InvalidData(String),
}

impl RepoError {
    /// Returns whether an immediate retry of the same call may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Db(err) => err.is_transient(),
            Self::NotFound(_) | Self::InvalidData(_) => false,
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted note data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Partial update of one note record. `None` leaves a field untouched.
///
/// `image` and `deleted_at` are doubly optional: `Some(None)` clears the
/// stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub image: Option<Option<String>>,
    /// Clamped by stores so that `updated_at >= created_at` keeps holding.
    pub updated_at: Option<EpochMs>,
    pub deleted_at: Option<Option<EpochMs>>,
}

impl NotePatch {
    /// Returns whether the patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.image.is_none()
            && self.updated_at.is_none()
            && self.deleted_at.is_none()
    }

    /// Applies this patch to an in-memory record.
    pub fn apply_to(&self, note: &mut Note) {
        if let Some(title) = &self.title {
            note.title = title.clone();
        }
        if let Some(content) = &self.content {
            note.content = content.clone();
        }
        if let Some(image) = &self.image {
            note.image = image.clone();
        }
        if let Some(updated_at) = self.updated_at {
            note.updated_at = updated_at.max(note.created_at);
        }
        if let Some(deleted_at) = self.deleted_at {
            note.deleted_at = deleted_at;
        }
    }
}

/// Record-level persistence contract for notes.
pub trait NoteStore {
    /// Persists a new record and returns its freshly assigned id.
    ///
    /// Any `id` already set on `note` is ignored.
    fn create(&mut self, note: &Note) -> RepoResult<NoteId>;
    /// Exact lookup by id.
    fn get(&self, id: NoteId) -> RepoResult<Option<Note>>;
    /// Returns every record, active and trashed, in ascending id order.
    fn list(&self) -> RepoResult<Vec<Note>>;
    /// Merges `patch` into an existing record.
    fn update(&mut self, id: NoteId, patch: &NotePatch) -> RepoResult<()>;
    /// Permanently removes one record.
    fn delete(&mut self, id: NoteId) -> RepoResult<()>;
    /// Permanently removes every record with `deleted_at <= threshold` and
    /// returns how many were removed. Active records are never touched.
    fn delete_trashed_before(&mut self, threshold: EpochMs) -> RepoResult<usize>;
}
