//! Paginated document export.
//!
//! The plain-text rendering is word-wrapped to a fixed column width and cut
//! into fixed-height pages, the layout a printer or PDF writer consumes.

use crate::export::plain_text::export_plain_text;
use crate::model::note::Note;

const FORM_FEED: char = '\u{0C}';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLayout {
    /// Maximum characters per line. Clamped to at least 1.
    pub line_width: usize,
    /// Body lines per page, footer excluded. Clamped to at least 1.
    pub lines_per_page: usize,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            line_width: 90,
            lines_per_page: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub number: usize,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PagedDocument {
    pub pages: Vec<Page>,
}

impl PagedDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Renders pages with a `Page n/m` footer, separated by form feeds.
    pub fn render(&self) -> String {
        let total = self.page_count();
        let mut out = String::new();
        for (index, page) in self.pages.iter().enumerate() {
            if index > 0 {
                out.push(FORM_FEED);
            }
            for line in &page.lines {
                out.push_str(line);
                out.push('\n');
            }
            out.push_str(&format!("\nPage {}/{}\n", page.number, total));
        }
        out
    }
}

/// Lays out `notes` as a paged document. An empty slice yields no pages.
pub fn export_paged(notes: &[Note], layout: PageLayout) -> PagedDocument {
    let width = layout.line_width.max(1);
    let height = layout.lines_per_page.max(1);
    let text = export_plain_text(notes);
    if text.is_empty() {
        return PagedDocument::default();
    }

    let lines: Vec<String> = text
        .trim_end_matches('\n')
        .split('\n')
        .flat_map(|line| wrap_line(line, width))
        .collect();

    let pages = lines
        .chunks(height)
        .enumerate()
        .map(|(index, chunk)| Page {
            number: index + 1,
            lines: chunk.to_vec(),
        })
        .collect();

    PagedDocument { pages }
}

/// Greedy word wrap; words longer than `width` are hard-split.
fn wrap_line(line: &str, width: usize) -> Vec<String> {
    if line.trim().is_empty() {
        return vec![String::new()];
    }

    let mut wrapped = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in line.split_whitespace() {
        let mut chars: Vec<char> = word.chars().collect();

        if current_len > 0 && current_len + 1 + chars.len() <= width {
            current.push(' ');
            current.extend(chars.iter());
            current_len += 1 + chars.len();
            continue;
        }
        if current_len > 0 {
            wrapped.push(std::mem::take(&mut current));
            current_len = 0;
        }
        while chars.len() > width {
            let rest = chars.split_off(width);
            wrapped.push(chars.into_iter().collect());
            chars = rest;
        }
        current_len = chars.len();
        current = chars.into_iter().collect();
    }

    if current_len > 0 {
        wrapped.push(current);
    }
    wrapped
}
