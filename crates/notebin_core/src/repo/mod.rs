//! Note store contracts and persistence implementations.
//!
//! # Responsibility
//! - Define the record-level CRUD contract (`NoteStore`).
//! - Keep SQLite details out of the lifecycle service.
//!
//! # Invariants
//! - Stores never validate user input; that happens at the service boundary.
//! - Stores report a missing id as `RepoError::NotFound`, distinct from
//!   transport errors.

pub mod memory_store;
pub mod note_store;
pub mod sqlite_store;
