//! Locale-aware title ordering.
//!
//! Titles compare with the Unicode Collation Algorithm under the root
//! locale: punctuation before digits before letters, base letters first
//! (`Ł` right after `L`, `Æ` right after `A`), then accents, then lowercase
//! before uppercase. Raw code point order breaks any remaining tie so the
//! result is a total order.

use icu_collator::{Collator, CollatorOptions};
use std::cmp::Ordering;

thread_local! {
    static ROOT_COLLATOR: Collator =
        Collator::try_new(&Default::default(), CollatorOptions::new())
            .expect("root collation data is compiled in");
}

/// Compares two note titles for ascending display order.
pub fn compare_titles(left: &str, right: &str) -> Ordering {
    ROOT_COLLATOR
        .with(|collator| collator.compare(left, right))
        .then_with(|| left.cmp(right))
}
