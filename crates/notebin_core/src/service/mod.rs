//! Core use-case services.
//!
//! # Responsibility
//! - Layer lifecycle policy (validation, timestamps, trash, retention,
//!   ordering) over a `NoteStore`.
//! - Keep presentation layers decoupled from storage details.

pub mod clock;
pub mod collation;
pub mod note_service;
