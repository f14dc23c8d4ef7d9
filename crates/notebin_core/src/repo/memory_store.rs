//! In-memory note store.
//!
//! Same contract as the SQLite store without durability. Used as a test
//! double and for scratch sessions.

use crate::db::DbError;
use crate::model::note::{EpochMs, Note, NoteId};
use crate::repo::note_store::{NotePatch, NoteStore, RepoError, RepoResult};
use rusqlite::ffi;
use std::cell::Cell;
use std::collections::BTreeMap;

/// `BTreeMap`-backed store with monotonic id assignment.
#[derive(Debug, Default)]
pub struct InMemoryNoteStore {
    notes: BTreeMap<NoteId, Note>,
    last_id: NoteId,
    pending_faults: Cell<usize>,
}

impl InMemoryNoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` store calls, reads included, fail with a
    /// transient `SQLITE_BUSY` error before touching any record.
    pub fn inject_transient_faults(&mut self, count: usize) {
        self.pending_faults.set(count);
    }

    /// Number of records currently held, active and trashed.
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    fn take_fault(&self) -> RepoResult<()> {
        let pending = self.pending_faults.get();
        if pending == 0 {
            return Ok(());
        }
        self.pending_faults.set(pending - 1);
        Err(RepoError::Db(DbError::Sqlite(rusqlite::Error::SqliteFailure(
            ffi::Error::new(ffi::SQLITE_BUSY),
            Some("injected fault".to_string()),
        ))))
    }
}

impl NoteStore for InMemoryNoteStore {
    fn create(&mut self, note: &Note) -> RepoResult<NoteId> {
        self.take_fault()?;

        self.last_id += 1;
        let id = self.last_id;
        let mut stored = note.clone();
        stored.id = Some(id);
        stored.updated_at = stored.updated_at.max(stored.created_at);
        self.notes.insert(id, stored);
        Ok(id)
    }

    fn get(&self, id: NoteId) -> RepoResult<Option<Note>> {
        self.take_fault()?;

        Ok(self.notes.get(&id).cloned())
    }

    fn list(&self) -> RepoResult<Vec<Note>> {
        self.take_fault()?;

        Ok(self.notes.values().cloned().collect())
    }

    fn update(&mut self, id: NoteId, patch: &NotePatch) -> RepoResult<()> {
        self.take_fault()?;

        let note = self.notes.get_mut(&id).ok_or(RepoError::NotFound(id))?;
        patch.apply_to(note);
        Ok(())
    }

    fn delete(&mut self, id: NoteId) -> RepoResult<()> {
        self.take_fault()?;

        self.notes
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound(id))
    }

    fn delete_trashed_before(&mut self, threshold: EpochMs) -> RepoResult<usize> {
        self.take_fault()?;

        let before = self.notes.len();
        self.notes
            .retain(|_, note| !note.deleted_at.is_some_and(|at| at <= threshold));
        Ok(before - self.notes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::InMemoryNoteStore;
    use crate::model::note::Note;
    use crate::repo::note_store::{NoteStore, RepoError};

    #[test]
    fn ids_are_not_reused_after_delete() {
        let mut store = InMemoryNoteStore::new();
        let first = store.create(&Note::new("a", "", None, 0)).unwrap();
        store.delete(first).unwrap();
        let second = store.create(&Note::new("b", "", None, 0)).unwrap();
        assert!(second > first);
    }

    #[test]
    fn injected_faults_are_transient_and_consumed() {
        let mut store = InMemoryNoteStore::new();
        store.inject_transient_faults(1);

        let err = store.create(&Note::new("a", "", None, 0)).unwrap_err();
        assert!(err.is_transient());
        assert!(store.is_empty());

        store.create(&Note::new("a", "", None, 0)).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn injected_faults_also_hit_reads() {
        let mut store = InMemoryNoteStore::new();
        let id = store.create(&Note::new("a", "", None, 0)).unwrap();
        store.inject_transient_faults(2);

        assert!(store.get(id).unwrap_err().is_transient());
        assert!(store.list().unwrap_err().is_transient());
        assert!(store.get(id).unwrap().is_some());
    }

    #[test]
    fn missing_ids_report_not_found() {
        let mut store = InMemoryNoteStore::new();
        assert!(matches!(store.delete(9), Err(RepoError::NotFound(9))));
        assert!(store.get(9).unwrap().is_none());
    }
}
