//! Core note lifecycle and persistence for notebin.
//! This crate is the single source of truth for note invariants.

pub mod config;
pub mod db;
pub mod export;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{Config, ConfigError};
pub use export::{export_paged, export_plain_text, PageLayout, PagedDocument};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::image::{encode_image, image_mime_for_path, validate_image};
pub use model::note::{EpochMs, Note, NoteId, NoteValidationError};
pub use repo::memory_store::InMemoryNoteStore;
pub use repo::note_store::{NotePatch, NoteStore, RepoError, RepoResult};
pub use repo::sqlite_store::SqliteNoteStore;
pub use service::clock::{Clock, FixedClock, SystemClock};
pub use service::collation::compare_titles;
pub use service::note_service::{
    select_view, BulkOutcome, NoteEdit, NoteQuery, NoteService, NoteServiceError, Outcome,
    RetentionPolicy, ServiceResult, SortBy, View, DEFAULT_RETENTION_DAYS,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
