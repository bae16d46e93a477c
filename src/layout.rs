//! Layout Engine - semantic tree to ordered layout blocks
//!
//! Numbering (section numerals, caption numbers, citation labels) is derived
//! here and carried on the blocks. The document itself is never touched.

use serde::Serialize;
use thiserror::Error;

use crate::model::{Figure, FigurePlacement, StructuredDocument};
use crate::references::{format_references, RenderedReference};

pub const ABSTRACT_MARKER: &str = "Abstract\u{2014}";
pub const KEYWORDS_MARKER: &str = "Keywords\u{2014}";
pub const KEYWORD_SEPARATOR: &str = "; ";
pub const REFERENCES_HEADING: &str = "REFERENCES";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("Figure {figure} is anchored after paragraph {paragraph} of section \"{section}\", which has {available} paragraph(s)")]
    UnresolvedAnchor {
        figure: u32,
        section: String,
        paragraph: usize,
        available: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnMode {
    Single,
    Double,
}

impl ColumnMode {
    pub fn columns(&self) -> u32 {
        match self {
            ColumnMode::Single => 1,
            ColumnMode::Double => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockKind {
    Title { text: String },
    Authors { text: String },
    Abstract { text: String },
    Keywords { keywords: Vec<String> },
    Heading {
        #[serde(skip_serializing_if = "Option::is_none")]
        numeral: Option<String>,
        text: String,
    },
    Paragraph { text: String },
    /// `image` is the position of the figure's image in the request
    Figure { number: u32, caption: String, image: usize },
    Reference(RenderedReference),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutBlock {
    pub mode: ColumnMode,
    #[serde(flatten)]
    pub kind: BlockKind,
}

impl LayoutBlock {
    fn single(kind: BlockKind) -> Self {
        Self { mode: ColumnMode::Single, kind }
    }

    fn double(kind: BlockKind) -> Self {
        Self { mode: ColumnMode::Double, kind }
    }

    /// Plain text of the block as it reads on the page
    pub fn text(&self) -> String {
        match &self.kind {
            BlockKind::Title { text }
            | BlockKind::Authors { text }
            | BlockKind::Paragraph { text } => text.clone(),
            BlockKind::Abstract { text } => format!("{}{}", ABSTRACT_MARKER, text),
            BlockKind::Keywords { keywords } => {
                format!("{}{}", KEYWORDS_MARKER, keywords.join(KEYWORD_SEPARATOR))
            }
            BlockKind::Heading { numeral, text } => heading_label(numeral.as_deref(), text),
            BlockKind::Figure { number, caption, .. } => {
                format!("{} {}", figure_label(*number), caption)
            }
            BlockKind::Reference(reference) => reference.display(),
        }
    }
}

pub fn heading_label(numeral: Option<&str>, text: &str) -> String {
    match numeral {
        Some(n) => format!("{}. {}", n, text),
        None => text.to_string(),
    }
}

/// `Fig. N.`
pub fn figure_label(number: u32) -> String {
    format!("Fig. {}.", number)
}

/// Uppercase Roman numeral for a 1-based position.
pub fn to_roman(mut n: usize) -> String {
    const TABLE: [(usize, &str); 13] = [
        (1000, "M"), (900, "CM"), (500, "D"), (400, "CD"),
        (100, "C"), (90, "XC"), (50, "L"), (40, "XL"),
        (10, "X"), (9, "IX"), (5, "V"), (4, "IV"), (1, "I"),
    ];

    let mut out = String::new();
    for &(value, symbol) in TABLE.iter() {
        while n >= value {
            out.push_str(symbol);
            n -= value;
        }
    }
    out
}

/// Split section content on blank lines; whitespace inside a paragraph collapses.
pub fn split_paragraphs(content: &str) -> Vec<String> {
    let mut paragraphs = vec![];
    let mut current: Vec<&str> = vec![];

    for line in content.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(normalize(&current));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(normalize(&current));
    }
    paragraphs
}

fn normalize(lines: &[&str]) -> String {
    lines.iter()
        .flat_map(|l| l.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    AfterParagraph { section: usize, paragraph: usize },
    SectionEnd(usize),
    DocumentEnd,
}

struct SectionPlan<'a> {
    paragraphs: Vec<String>,
    after_paragraph: Vec<Vec<&'a Figure>>,
    at_end: Vec<&'a Figure>,
}

fn resolve_slot(
    doc: &StructuredDocument,
    plans: &[SectionPlan<'_>],
    figure: &Figure,
) -> Result<Slot, LayoutError> {
    let Some(name) = figure.section() else {
        return Ok(Slot::DocumentEnd);
    };

    let Some(section) = doc.sections().iter().position(|s| s.matches_heading(name)) else {
        log::warn!(
            "figure {} names unknown section \"{}\", placing after the final section",
            figure.index(), name
        );
        return Ok(Slot::DocumentEnd);
    };

    match (figure.placement(), figure.paragraph()) {
        (FigurePlacement::Inline, Some(paragraph)) => {
            let available = plans[section].paragraphs.len();
            if paragraph == 0 || paragraph > available {
                return Err(LayoutError::UnresolvedAnchor {
                    figure: figure.index(),
                    section: doc.sections()[section].heading().to_string(),
                    paragraph,
                    available,
                });
            }
            Ok(Slot::AfterParagraph { section, paragraph: paragraph - 1 })
        }
        _ => Ok(Slot::SectionEnd(section)),
    }
}

fn figure_block(figure: &Figure) -> LayoutBlock {
    LayoutBlock::double(BlockKind::Figure {
        number: figure.index(),
        caption: figure.caption().to_string(),
        image: figure.index() as usize - 1,
    })
}

/// Walk a validated document and produce the ordered layout blocks.
pub fn layout(doc: &StructuredDocument) -> Result<Vec<LayoutBlock>, LayoutError> {
    let mut blocks = vec![];

    // Front matter, single column
    blocks.push(LayoutBlock::single(BlockKind::Title { text: doc.title().to_string() }));
    if !doc.authors().is_empty() {
        blocks.push(LayoutBlock::single(BlockKind::Authors { text: doc.authors().to_string() }));
    }
    blocks.push(LayoutBlock::single(BlockKind::Abstract {
        text: doc.abstract_text().split_whitespace().collect::<Vec<_>>().join(" "),
    }));
    if !doc.keywords().is_empty() {
        blocks.push(LayoutBlock::single(BlockKind::Keywords { keywords: doc.keywords().to_vec() }));
    }

    let mut plans: Vec<SectionPlan<'_>> = doc.sections().iter()
        .map(|s| {
            let paragraphs = split_paragraphs(s.content());
            SectionPlan {
                after_paragraph: vec![vec![]; paragraphs.len()],
                paragraphs,
                at_end: vec![],
            }
        })
        .collect();

    let mut trailing = vec![];
    for figure in doc.figures() {
        let slot = resolve_slot(doc, &plans, figure)?;
        log::debug!("figure {} resolved to {:?}", figure.index(), slot);
        match slot {
            Slot::AfterParagraph { section, paragraph } => {
                plans[section].after_paragraph[paragraph].push(figure)
            }
            Slot::SectionEnd(section) => plans[section].at_end.push(figure),
            Slot::DocumentEnd => trailing.push(figure),
        }
    }

    // Body, two columns
    for (i, (section, plan)) in doc.sections().iter().zip(&plans).enumerate() {
        blocks.push(LayoutBlock::double(BlockKind::Heading {
            numeral: Some(to_roman(i + 1)),
            text: section.heading().to_uppercase(),
        }));
        for (paragraph, figures) in plan.paragraphs.iter().zip(&plan.after_paragraph) {
            blocks.push(LayoutBlock::double(BlockKind::Paragraph { text: paragraph.clone() }));
            blocks.extend(figures.iter().map(|f| figure_block(f)));
        }
        blocks.extend(plan.at_end.iter().map(|f| figure_block(f)));
    }
    blocks.extend(trailing.iter().map(|f| figure_block(f)));

    if !doc.references().is_empty() {
        blocks.push(LayoutBlock::single(BlockKind::Heading {
            numeral: None,
            text: REFERENCES_HEADING.to_string(),
        }));
        blocks.extend(
            format_references(doc.references())
                .into_iter()
                .map(|r| LayoutBlock::single(BlockKind::Reference(r))),
        );
    }

    log::debug!(
        "laid out {} sections, {} figures, {} references into {} blocks",
        doc.sections().len(), doc.figures().len(), doc.references().len(), blocks.len()
    );
    Ok(blocks)
}
