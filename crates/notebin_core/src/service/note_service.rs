//! Note lifecycle service.
//!
//! # Responsibility
//! - Validate user input before anything reaches the store.
//! - Stamp `created_at` / `updated_at` / `deleted_at` from an injected clock.
//! - Implement soft delete, restore, hard delete and retention purge.
//! - Serve active/trash views in display order.
//!
//! # Invariants
//! - `query` always runs the retention sweep before reading, so an expired
//!   note is never returned.
//! - A missing id is an `Outcome::NotFound`, never an error.
//! - Transient storage faults are retried exactly once; everything else is
//!   propagated unchanged.
//! - Bulk operations are sequential and best-effort, not atomic.

use crate::model::image::validate_image;
use crate::model::note::{validate_title, EpochMs, Note, NoteId, NoteValidationError};
use crate::repo::note_store::{NotePatch, NoteStore, RepoError, RepoResult};
use crate::service::clock::{Clock, SystemClock};
use crate::service::collation::compare_titles;
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Days a trashed note stays restorable unless configured otherwise.
pub const DEFAULT_RETENTION_DAYS: u32 = 15;

const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Service error for note use-cases.
#[derive(Debug)]
pub enum NoteServiceError {
    /// User input rejected; the store was not called.
    Validation(NoteValidationError),
    /// Persistence-layer failure, after any retry.
    Storage(RepoError),
}

impl Display for NoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Storage(err) => write!(f, "storage failure: {err}"),
        }
    }
}

impl Error for NoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Storage(err) => Some(err),
        }
    }
}

impl From<NoteValidationError> for NoteServiceError {
    fn from(value: NoteValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for NoteServiceError {
    fn from(value: RepoError) -> Self {
        Self::Storage(value)
    }
}

pub type ServiceResult<T> = Result<T, NoteServiceError>;

/// Result of a single-note mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    NotFound,
}

impl Outcome {
    pub fn is_applied(self) -> bool {
        self == Self::Applied
    }
}

/// Aggregate result of a multi-note operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkOutcome {
    /// Ids the operation was applied to.
    pub succeeded: usize,
    /// Ids that were missing or whose write failed, in input order.
    pub failed: Vec<NoteId>,
}

/// Fields a user may change on an existing note.
///
/// `image: Some(None)` removes the image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteEdit {
    pub title: Option<String>,
    pub content: Option<String>,
    pub image: Option<Option<String>>,
}

/// How long trashed notes survive before the purge sweep removes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    days: u32,
}

impl RetentionPolicy {
    pub fn days(days: u32) -> Self {
        Self { days }
    }

    pub fn retention_days(self) -> u32 {
        self.days
    }

    /// Latest `deleted_at` that counts as expired at `now`.
    pub fn threshold(self, now: EpochMs) -> EpochMs {
        now.saturating_sub(self.window_ms())
    }

    /// Instant from which a note trashed at `deleted_at` is purgeable.
    pub fn expires_at(self, deleted_at: EpochMs) -> EpochMs {
        deleted_at.saturating_add(self.window_ms())
    }

    fn window_ms(self) -> i64 {
        i64::from(self.days) * MS_PER_DAY
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::days(DEFAULT_RETENTION_DAYS)
    }
}

/// Which side of the trash boundary a query reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum View {
    #[default]
    Active,
    Trash,
}

impl View {
    pub fn includes(self, note: &Note) -> bool {
        match self {
            Self::Active => note.is_active(),
            Self::Trash => note.is_trashed(),
        }
    }
}

/// Display order of a query result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortBy {
    /// Ascending, locale-aware.
    Title,
    /// Newest first.
    #[default]
    CreatedAt,
}

/// View and ordering of one list request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoteQuery {
    pub view: View,
    pub sort_by: SortBy,
}

/// Lifecycle facade over a note store.
pub struct NoteService<S: NoteStore, C: Clock = SystemClock> {
    store: S,
    clock: C,
    retention: RetentionPolicy,
}

impl<S: NoteStore> NoteService<S, SystemClock> {
    /// Creates a service stamping notes with wall-clock time.
    pub fn new(store: S) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<S: NoteStore, C: Clock> NoteService<S, C> {
    pub fn with_clock(store: S, clock: C) -> Self {
        Self {
            store,
            clock,
            retention: RetentionPolicy::default(),
        }
    }

    /// Replaces the retention window used by `query`.
    pub fn with_retention(mut self, retention: RetentionPolicy) -> Self {
        self.retention = retention;
        self
    }

    pub fn retention(&self) -> RetentionPolicy {
        self.retention
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Creates an active note and returns its id.
    ///
    /// # Errors
    /// - `Validation(EmptyTitle)` when `title` is blank after trimming.
    /// - `Validation(InvalidImage)` when `image` is not a base64 image data URL.
    pub fn add_note(
        &mut self,
        title: impl Into<String>,
        content: impl Into<String>,
        image: Option<String>,
    ) -> ServiceResult<NoteId> {
        let note = Note::new(title, content, image, self.clock.now_ms());
        note.validate()?;

        let id = self.with_retry("note_add", |store| store.create(&note))?;
        info!("event=note_add module=service status=ok note_id={id}");
        Ok(id)
    }

    /// Applies a user edit. Never touches `created_at` or `deleted_at`.
    pub fn edit_note(&mut self, id: NoteId, edit: NoteEdit) -> ServiceResult<Outcome> {
        if let Some(title) = edit.title.as_deref() {
            validate_title(title)?;
        }
        if let Some(Some(image)) = edit.image.as_ref() {
            validate_image(image)?;
        }

        let patch = NotePatch {
            title: edit.title,
            content: edit.content,
            image: edit.image,
            updated_at: Some(self.clock.now_ms()),
            deleted_at: None,
        };
        self.apply_patch("note_edit", id, &patch)
    }

    /// Moves a note to the trash. Re-trashing refreshes `deleted_at`.
    pub fn soft_delete(&mut self, id: NoteId) -> ServiceResult<Outcome> {
        let now = self.clock.now_ms();
        let patch = NotePatch {
            updated_at: Some(now),
            deleted_at: Some(Some(now)),
            ..NotePatch::default()
        };
        self.apply_patch("note_soft_delete", id, &patch)
    }

    /// Brings a note back to the active view.
    ///
    /// Succeeds on notes that are already active; only `updated_at` moves.
    pub fn restore(&mut self, id: NoteId) -> ServiceResult<Outcome> {
        let patch = NotePatch {
            updated_at: Some(self.clock.now_ms()),
            deleted_at: Some(None),
            ..NotePatch::default()
        };
        self.apply_patch("note_restore", id, &patch)
    }

    /// Permanently removes a note, bypassing retention.
    pub fn hard_delete(&mut self, id: NoteId) -> ServiceResult<Outcome> {
        match self.with_retry("note_hard_delete", |store| store.delete(id)) {
            Ok(()) => {
                info!("event=note_hard_delete module=service status=ok note_id={id}");
                Ok(Outcome::Applied)
            }
            Err(RepoError::NotFound(_)) => {
                debug!("event=note_hard_delete module=service status=not_found note_id={id}");
                Ok(Outcome::NotFound)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Trashes every id in order; continues past failures.
    pub fn soft_delete_many(&mut self, ids: &[NoteId]) -> BulkOutcome {
        self.for_each_id("note_soft_delete_many", ids, Self::soft_delete)
    }

    /// Permanently removes every id in order; continues past failures.
    pub fn hard_delete_many(&mut self, ids: &[NoteId]) -> BulkOutcome {
        self.for_each_id("note_hard_delete_many", ids, Self::hard_delete)
    }

    /// Permanently removes notes trashed at or before `now - retention`.
    pub fn purge_expired(&mut self, retention: RetentionPolicy) -> ServiceResult<usize> {
        let threshold = retention.threshold(self.clock.now_ms());
        let purged = self.with_retry("note_purge", |store| store.delete_trashed_before(threshold))?;

        if purged > 0 {
            info!(
                "event=note_purge module=service status=ok purged={purged} retention_days={}",
                retention.retention_days()
            );
        }
        Ok(purged)
    }

    /// Exact lookup, trashed notes included.
    pub fn get_note(&self, id: NoteId) -> ServiceResult<Option<Note>> {
        Ok(self.read_with_retry("note_get", |store| store.get(id))?)
    }

    /// Sweeps expired notes, then returns one view in display order.
    pub fn query(&mut self, query: NoteQuery) -> ServiceResult<Vec<Note>> {
        self.purge_expired(self.retention)?;
        let notes = self.read_with_retry("note_list", |store| store.list())?;
        Ok(select_view(notes, query))
    }

    fn apply_patch(
        &mut self,
        event: &'static str,
        id: NoteId,
        patch: &NotePatch,
    ) -> ServiceResult<Outcome> {
        match self.with_retry(event, |store| store.update(id, patch)) {
            Ok(()) => {
                debug!("event={event} module=service status=ok note_id={id}");
                Ok(Outcome::Applied)
            }
            Err(RepoError::NotFound(_)) => {
                debug!("event={event} module=service status=not_found note_id={id}");
                Ok(Outcome::NotFound)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn for_each_id(
        &mut self,
        event: &'static str,
        ids: &[NoteId],
        mut op: impl FnMut(&mut Self, NoteId) -> ServiceResult<Outcome>,
    ) -> BulkOutcome {
        let mut outcome = BulkOutcome::default();

        for &id in ids {
            match op(self, id) {
                Ok(Outcome::Applied) => outcome.succeeded += 1,
                Ok(Outcome::NotFound) => outcome.failed.push(id),
                Err(err) => {
                    error!("event={event} module=service status=error note_id={id} error={err}");
                    outcome.failed.push(id);
                }
            }
        }

        info!(
            "event={event} module=service status=ok requested={} succeeded={} failed={}",
            ids.len(),
            outcome.succeeded,
            outcome.failed.len()
        );
        outcome
    }

    fn with_retry<T>(
        &mut self,
        event: &'static str,
        mut op: impl FnMut(&mut S) -> RepoResult<T>,
    ) -> RepoResult<T> {
        match op(&mut self.store) {
            Err(err) if err.is_transient() => {
                warn!("event={event} module=service status=retry error={err}");
                op(&mut self.store)
            }
            other => other,
        }
    }

    fn read_with_retry<T>(
        &self,
        event: &'static str,
        op: impl Fn(&S) -> RepoResult<T>,
    ) -> RepoResult<T> {
        match op(&self.store) {
            Err(err) if err.is_transient() => {
                warn!("event={event} module=service status=retry error={err}");
                op(&self.store)
            }
            other => other,
        }
    }
}

/// Filters `notes` down to one view and orders it for display.
///
/// Sorting is stable, so notes with equal keys keep their input order.
pub fn select_view(notes: Vec<Note>, query: NoteQuery) -> Vec<Note> {
    let mut selected: Vec<Note> = notes
        .into_iter()
        .filter(|note| query.view.includes(note))
        .collect();

    match query.sort_by {
        SortBy::Title => selected.sort_by(|a, b| compare_titles(&a.title, &b.title)),
        SortBy::CreatedAt => selected.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::{select_view, NoteQuery, RetentionPolicy, SortBy, View};
    use crate::model::note::Note;

    fn stored(id: i64, title: &str, created_at: i64, deleted_at: Option<i64>) -> Note {
        let mut note = Note::new(title, "", None, created_at);
        note.id = Some(id);
        note.deleted_at = deleted_at;
        note
    }

    fn ids(notes: &[Note]) -> Vec<i64> {
        notes.iter().filter_map(|note| note.id).collect()
    }

    #[test]
    fn threshold_is_days_before_now() {
        let policy = RetentionPolicy::days(2);
        assert_eq!(policy.threshold(3 * 86_400_000), 86_400_000);
        assert_eq!(RetentionPolicy::default().retention_days(), 15);
    }

    #[test]
    fn expiry_is_days_after_deletion() {
        let policy = RetentionPolicy::days(2);
        assert_eq!(policy.expires_at(86_400_000), 3 * 86_400_000);
        assert_eq!(policy.threshold(policy.expires_at(500)), 500);
        assert_eq!(policy.expires_at(i64::MAX), i64::MAX);
    }

    #[test]
    fn views_split_on_deleted_at() {
        let notes = vec![stored(1, "a", 1, None), stored(2, "b", 2, Some(5))];

        let active = select_view(notes.clone(), NoteQuery::default());
        assert_eq!(ids(&active), vec![1]);

        let trash = select_view(
            notes,
            NoteQuery {
                view: View::Trash,
                sort_by: SortBy::Title,
            },
        );
        assert_eq!(ids(&trash), vec![2]);
    }

    #[test]
    fn created_at_sort_is_newest_first_and_stable() {
        let notes = vec![
            stored(1, "x", 10, None),
            stored(2, "y", 30, None),
            stored(3, "z", 10, None),
        ];
        let sorted = select_view(notes, NoteQuery::default());
        assert_eq!(ids(&sorted), vec![2, 1, 3]);
    }

    #[test]
    fn title_sort_is_case_insensitive() {
        let notes = vec![
            stored(1, "Banana", 1, None),
            stored(2, "apple", 2, None),
            stored(3, "cherry", 3, None),
        ];
        let sorted = select_view(
            notes,
            NoteQuery {
                view: View::Active,
                sort_by: SortBy::Title,
            },
        );
        assert_eq!(ids(&sorted), vec![2, 1, 3]);
    }
}
