//! Read-side export of a query result.
//!
//! # Invariants
//! - Exporters never reorder or filter; they render notes in the order given.
//! - Output depends only on the input notes (UTC dates, no locale lookups).

mod paged;
mod plain_text;

pub use paged::{export_paged, Page, PageLayout, PagedDocument};
pub use plain_text::{export_plain_text, format_timestamp};
