//! SQLite-backed note store.
//!
//! # Responsibility
//! - Persist notes in the `notes` table created by migration 0001.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Ids come from `INTEGER PRIMARY KEY AUTOINCREMENT` and are never reused.
//! - Every statement autocommits; a returned `Ok` means the write is on disk.
//! - Read paths reject corrupt rows instead of masking them.

use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::note::{EpochMs, Note, NoteId};
use crate::repo::note_store::{NotePatch, NoteStore, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::path::Path;

const NOTE_SELECT_SQL: &str = "SELECT
    id,
    title,
    content,
    image,
    created_at,
    updated_at,
    deleted_at
FROM notes";

/// Note store owning one migrated SQLite connection.
///
/// Opened once per process; the connection closes on [`SqliteNoteStore::close`]
/// or drop.
pub struct SqliteNoteStore {
    conn: Connection,
}

impl SqliteNoteStore {
    /// Opens (or creates) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        Ok(Self {
            conn: open_db(path)?,
        })
    }

    /// Opens a throwaway in-memory database.
    pub fn open_in_memory() -> RepoResult<Self> {
        Ok(Self {
            conn: open_db_in_memory()?,
        })
    }

    /// Wraps a connection that already went through `open_db*`.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// Borrows the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Closes the connection, surfacing any error SQLite reports on close.
    pub fn close(self) -> RepoResult<()> {
        self.conn
            .close()
            .map_err(|(_, err)| RepoError::Db(DbError::Sqlite(err)))
    }
}

impl NoteStore for SqliteNoteStore {
    fn create(&mut self, note: &Note) -> RepoResult<NoteId> {
        self.conn.execute(
            "INSERT INTO notes (
                title,
                content,
                image,
                created_at,
                updated_at,
                deleted_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                note.title.as_str(),
                note.content.as_str(),
                note.image.as_deref(),
                note.created_at,
                note.updated_at.max(note.created_at),
                note.deleted_at,
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn get(&self, id: NoteId) -> RepoResult<Option<Note>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} WHERE id = ?1;"))?;
        let raw = stmt.query_row([id], read_raw_row).optional()?;
        raw.map(parse_note).transpose()
    }

    fn list(&self) -> RepoResult<Vec<Note>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut notes = Vec::new();

        while let Some(row) = rows.next()? {
            notes.push(parse_note(read_raw_row(row)?)?);
        }

        Ok(notes)
    }

    fn update(&mut self, id: NoteId, patch: &NotePatch) -> RepoResult<()> {
        if patch.is_empty() {
            return match self.get(id)? {
                Some(_) => Ok(()),
                None => Err(RepoError::NotFound(id)),
            };
        }

        let mut assignments: Vec<&'static str> = Vec::new();
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(title) = &patch.title {
            assignments.push("title = ?");
            bind_values.push(Value::Text(title.clone()));
        }
        if let Some(content) = &patch.content {
            assignments.push("content = ?");
            bind_values.push(Value::Text(content.clone()));
        }
        if let Some(image) = &patch.image {
            assignments.push("image = ?");
            bind_values.push(image.clone().map_or(Value::Null, Value::Text));
        }
        if let Some(updated_at) = patch.updated_at {
            assignments.push("updated_at = MAX(?, created_at)");
            bind_values.push(Value::Integer(updated_at));
        }
        if let Some(deleted_at) = patch.deleted_at {
            assignments.push("deleted_at = ?");
            bind_values.push(deleted_at.map_or(Value::Null, Value::Integer));
        }
        bind_values.push(Value::Integer(id));

        let sql = format!("UPDATE notes SET {} WHERE id = ?;", assignments.join(", "));
        let changed = self.conn.execute(&sql, params_from_iter(bind_values))?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn delete(&mut self, id: NoteId) -> RepoResult<()> {
        let changed = self.conn.execute("DELETE FROM notes WHERE id = ?1;", [id])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn delete_trashed_before(&mut self, threshold: EpochMs) -> RepoResult<usize> {
        let removed = self.conn.execute(
            "DELETE FROM notes
             WHERE deleted_at IS NOT NULL
               AND deleted_at <= ?1;",
            [threshold],
        )?;
        Ok(removed)
    }
}

struct RawNoteRow {
    id: NoteId,
    title: String,
    content: String,
    image: Option<String>,
    created_at: EpochMs,
    updated_at: EpochMs,
    deleted_at: Option<EpochMs>,
}

fn read_raw_row(row: &Row<'_>) -> rusqlite::Result<RawNoteRow> {
    Ok(RawNoteRow {
        id: row.get("id")?,
        title: row.get("title")?,
        content: row.get("content")?,
        image: row.get("image")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        deleted_at: row.get("deleted_at")?,
    })
}

fn parse_note(raw: RawNoteRow) -> RepoResult<Note> {
    if raw.updated_at < raw.created_at {
        return Err(RepoError::InvalidData(format!(
            "note {} has updated_at {} before created_at {}",
            raw.id, raw.updated_at, raw.created_at
        )));
    }

    Ok(Note {
        id: Some(raw.id),
        title: raw.title,
        content: raw.content,
        image: raw.image,
        created_at: raw.created_at,
        updated_at: raw.updated_at,
        deleted_at: raw.deleted_at,
    })
}
