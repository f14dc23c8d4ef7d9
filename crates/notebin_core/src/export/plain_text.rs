//! Plain-text export of notes.
//!
//! Entries are written in the order given, separated by `---` lines, with
//! timestamps rendered in UTC. Trashed notes are the caller's to filter.

use crate::model::note::{EpochMs, Note};
use chrono::DateTime;

const ENTRY_SEPARATOR: &str = "---";

/// Renders notes as `Title/Date/content` blocks separated by `---` lines.
///
/// Returns an empty string for an empty slice.
pub fn export_plain_text(notes: &[Note]) -> String {
    notes
        .iter()
        .map(|note| {
            format!(
                "Title: {}\nDate: {}\n\n{}\n\n{ENTRY_SEPARATOR}\n",
                note.title,
                format_timestamp(note.created_at),
                note.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Formats epoch milliseconds as `YYYY-MM-DD HH:MM:SS UTC`.
pub fn format_timestamp(at: EpochMs) -> String {
    match DateTime::from_timestamp_millis(at) {
        Some(when) => when.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => format!("@{at}ms"),
    }
}
