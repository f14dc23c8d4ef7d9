//! Note domain model.
//!
//! # Responsibility
//! - Define the canonical note record shared by store, service and export.
//! - Provide field-level validation used at the service boundary.
//!
//! # Invariants
//! - Every persisted note is identified by a `NoteId` that is never reused.
//! - Trash state is represented by `deleted_at`, not by record removal.

pub mod image;
pub mod note;
