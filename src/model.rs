//! Paper Model - Raw Input and Validated Document
//!
//! Raw types mirror the wire format and tolerate missing fields so the
//! validator can report every problem at once. `StructuredDocument` can only
//! be built by the validator and is read-only afterwards.

use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::validation::{ValidationError, ValidationViolation};

/// Unvalidated paper as received from the structuring collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawDocument {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub authors: Option<String>,
    #[serde(default, rename = "abstract")]
    pub abstract_text: Option<String>,
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
    #[serde(default)]
    pub sections: Option<Vec<RawSection>>,
    #[serde(default)]
    pub figures: Option<Vec<RawFigure>>,
    #[serde(default)]
    pub references: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSection {
    #[serde(default)]
    pub heading: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawFigure {
    #[serde(default)]
    pub index: Option<i64>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub placement: Option<String>,
    /// Heading of the section the figure was supplied alongside
    #[serde(default)]
    pub section: Option<String>,
    /// 1-based paragraph anchor inside `section`
    #[serde(default)]
    pub paragraph: Option<i64>,
}

/// Export request: the paper plus one base64 image per declared figure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportRequest {
    pub paper: RawDocument,
    #[serde(default)]
    pub images: Vec<String>,
}

impl ExportRequest {
    /// Parse a request body. Syntax and type errors are validation failures.
    pub fn from_json(json: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(json).map_err(|e| {
            ValidationError::single(
                ValidationViolation::new("json_syntax", "$", format!("Malformed request: {}", e))
                    .remediation("Submit a JSON object with a `paper` field"),
            )
        })
    }

    /// Decode every image payload, reporting all undecodable entries.
    pub fn decode_images(&self) -> Result<Vec<Vec<u8>>, ValidationError> {
        let (images, violations) = self.decode_positional();
        if violations.is_empty() {
            Ok(images)
        } else {
            Err(ValidationError::new(violations))
        }
    }

    /// Undecodable payloads become empty placeholders so image `i` still
    /// belongs to figure `i + 1`.
    pub(crate) fn decode_positional(&self) -> (Vec<Vec<u8>>, Vec<ValidationViolation>) {
        let engine = base64::engine::general_purpose::STANDARD;
        let mut images = Vec::with_capacity(self.images.len());
        let mut violations = vec![];

        for (i, encoded) in self.images.iter().enumerate() {
            match engine.decode(encoded.trim()) {
                Ok(bytes) => images.push(bytes),
                Err(e) => {
                    violations.push(
                        ValidationViolation::new(
                            "image_encoding",
                            format!("images[{}]", i),
                            format!("Image payload is not valid base64: {}", e),
                        )
                        .remediation("Encode image bytes with standard base64"),
                    );
                    images.push(Vec::new());
                }
            }
        }

        (images, violations)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FigurePlacement {
    Inline,
    EndOfSection,
}

impl FigurePlacement {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "inline" => Some(Self::Inline),
            "end-of-section" | "end_of_section" => Some(Self::EndOfSection),
            _ => None,
        }
    }
}

impl Default for FigurePlacement {
    fn default() -> Self {
        Self::EndOfSection
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    heading: String,
    content: String,
}

impl Section {
    pub(crate) fn new(heading: String, content: String) -> Self {
        Self { heading, content }
    }

    pub fn heading(&self) -> &str {
        &self.heading
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Case-insensitive heading match used for figure association.
    pub fn matches_heading(&self, name: &str) -> bool {
        self.heading.trim().eq_ignore_ascii_case(name.trim())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Figure {
    index: u32,
    caption: String,
    placement: FigurePlacement,
    #[serde(skip_serializing_if = "Option::is_none")]
    section: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    paragraph: Option<usize>,
}

impl Figure {
    pub(crate) fn new(
        index: u32,
        caption: String,
        placement: FigurePlacement,
        section: Option<String>,
        paragraph: Option<usize>,
    ) -> Self {
        Self { index, caption, placement, section, paragraph }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn caption(&self) -> &str {
        &self.caption
    }

    pub fn placement(&self) -> FigurePlacement {
        self.placement
    }

    pub fn section(&self) -> Option<&str> {
        self.section.as_deref()
    }

    pub fn paragraph(&self) -> Option<usize> {
        self.paragraph
    }
}

/// A validated paper. Read-only: derived numbering lives in layout blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructuredDocument {
    title: String,
    authors: String,
    #[serde(rename = "abstract")]
    abstract_text: String,
    keywords: Vec<String>,
    sections: Vec<Section>,
    figures: Vec<Figure>,
    references: Vec<String>,
}

impl StructuredDocument {
    pub(crate) fn new(
        title: String,
        authors: String,
        abstract_text: String,
        keywords: Vec<String>,
        sections: Vec<Section>,
        figures: Vec<Figure>,
        references: Vec<String>,
    ) -> Self {
        Self { title, authors, abstract_text, keywords, sections, figures, references }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn authors(&self) -> &str {
        &self.authors
    }

    pub fn abstract_text(&self) -> &str {
        &self.abstract_text
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn figures(&self) -> &[Figure] {
        &self.figures
    }

    pub fn references(&self) -> &[String] {
        &self.references
    }
}
