//! Reference Formatter
//!
//! Numbering is positional: the entry at position i is always `[i+1]`.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedReference {
    pub number: usize,
    pub label: String,
    pub text: String,
}

impl RenderedReference {
    /// `[n] text` as it reads on the page
    pub fn display(&self) -> String {
        format!("{} {}", self.label, self.text)
    }
}

/// In-text marker for the reference at a 0-based list position.
pub fn citation_label(position: usize) -> String {
    format!("[{}]", position + 1)
}

pub fn format_references(references: &[String]) -> Vec<RenderedReference> {
    references
        .iter()
        .enumerate()
        .map(|(i, text)| RenderedReference {
            number: i + 1,
            label: citation_label(i),
            text: text.split_whitespace().collect::<Vec<_>>().join(" "),
        })
        .collect()
}
