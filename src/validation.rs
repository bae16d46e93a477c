//! Validation System - Rules Produce Violations
//!
//! Every rule runs on every request. The validator either returns a
//! `StructuredDocument` or a `ValidationError` listing all violations.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::EngineConfig;
use crate::model::{
    Figure, FigurePlacement, RawDocument, Section, StructuredDocument,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationViolation {
    pub rule: String,
    pub field: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remediation: Vec<String>,
}

impl ValidationViolation {
    pub fn new(rule: &str, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            rule: rule.to_string(),
            field: field.into(),
            message: message.into(),
            expected: None,
            actual: None,
            remediation: vec![],
        }
    }

    pub fn expected(mut self, expected: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    pub fn actual(mut self, actual: impl Into<String>) -> Self {
        self.actual = Some(actual.into());
        self
    }

    pub fn remediation(mut self, hint: impl Into<String>) -> Self {
        self.remediation.push(hint.into());
        self
    }
}

/// Input rejected: carries every violation found, never just the first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("Validation failed: {}", summarize(.violations))]
pub struct ValidationError {
    violations: Vec<ValidationViolation>,
}

impl ValidationError {
    pub fn new(violations: Vec<ValidationViolation>) -> Self {
        Self { violations }
    }

    pub fn single(violation: ValidationViolation) -> Self {
        Self { violations: vec![violation] }
    }

    pub fn violations(&self) -> &[ValidationViolation] {
        &self.violations
    }

    pub fn into_violations(self) -> Vec<ValidationViolation> {
        self.violations
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }
}

fn summarize(violations: &[ValidationViolation]) -> String {
    violations.iter()
        .map(|v| format!("{}: {}", v.field, v.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Validation rule trait - produces violations
pub trait ValidationRule {
    fn name(&self) -> &'static str;
    fn validate(
        &self,
        document: &RawDocument,
        images: &[Vec<u8>],
        config: &EngineConfig,
    ) -> Vec<ValidationViolation>;
}

fn is_blank(value: Option<&String>) -> bool {
    value.map_or(true, |s| s.trim().is_empty())
}

// --- Concrete Rules ---

pub struct RequiredFieldsRule;

impl ValidationRule for RequiredFieldsRule {
    fn name(&self) -> &'static str { "required_fields" }

    fn validate(&self, document: &RawDocument, _: &[Vec<u8>], _: &EngineConfig) -> Vec<ValidationViolation> {
        let mut violations = vec![];

        match document.title.as_ref() {
            None => violations.push(
                ValidationViolation::new(self.name(), "title", "Title is missing")
                    .remediation("Provide a paper title"),
            ),
            Some(t) if t.trim().is_empty() => violations.push(
                ValidationViolation::new(self.name(), "title", "Title is empty")
                    .remediation("Provide a paper title"),
            ),
            Some(t) if t.trim().contains(['\n', '\r']) => violations.push(
                ValidationViolation::new(self.name(), "title", "Title must be a single line")
                    .actual(format!("{} lines", t.trim().lines().count())),
            ),
            Some(_) => {}
        }

        if is_blank(document.abstract_text.as_ref()) {
            violations.push(
                ValidationViolation::new(self.name(), "abstract", "Abstract is missing or empty")
                    .remediation("Provide a non-empty abstract"),
            );
        }

        if document.keywords.is_none() {
            violations.push(
                ValidationViolation::new(self.name(), "keywords", "Keywords are missing")
                    .remediation("Send an empty list when the paper has no keywords"),
            );
        }

        if document.sections.is_none() {
            violations.push(ValidationViolation::new(self.name(), "sections", "Sections are missing"));
        }

        violations
    }
}

pub struct SectionsRule;

impl ValidationRule for SectionsRule {
    fn name(&self) -> &'static str { "sections" }

    fn validate(&self, document: &RawDocument, _: &[Vec<u8>], _: &EngineConfig) -> Vec<ValidationViolation> {
        // Absence is reported by RequiredFieldsRule
        let Some(sections) = document.sections.as_ref() else {
            return vec![];
        };

        if sections.is_empty() {
            return vec![
                ValidationViolation::new(self.name(), "sections", "At least one section is required")
                    .expected("1 or more sections")
                    .actual("0 sections"),
            ];
        }

        let mut violations = vec![];
        for (i, section) in sections.iter().enumerate() {
            if is_blank(section.heading.as_ref()) {
                violations.push(ValidationViolation::new(
                    self.name(),
                    format!("sections[{}].heading", i),
                    "Section heading is missing or empty",
                ));
            }
            if section.content.is_none() {
                violations.push(ValidationViolation::new(
                    self.name(),
                    format!("sections[{}].content", i),
                    "Section content is missing",
                ));
            }
        }
        violations
    }
}

pub struct FiguresRule;

impl ValidationRule for FiguresRule {
    fn name(&self) -> &'static str { "figures" }

    fn validate(&self, document: &RawDocument, _: &[Vec<u8>], _: &EngineConfig) -> Vec<ValidationViolation> {
        let mut violations = vec![];
        let figures = document.figures.as_deref().unwrap_or_default();

        for (i, figure) in figures.iter().enumerate() {
            let expected = i as i64 + 1;
            match figure.index {
                None => violations.push(ValidationViolation::new(
                    self.name(),
                    format!("figures[{}].index", i),
                    "Figure index is missing",
                )),
                Some(index) if index != expected => violations.push(
                    ValidationViolation::new(
                        self.name(),
                        format!("figures[{}].index", i),
                        "Figure indices must be 1-based and follow array order",
                    )
                    .expected(expected.to_string())
                    .actual(index.to_string()),
                ),
                Some(_) => {}
            }

            match figure.caption.as_deref() {
                None => violations.push(ValidationViolation::new(
                    self.name(),
                    format!("figures[{}].caption", i),
                    "Figure caption is missing",
                )),
                Some(c) if c.trim().is_empty() => violations.push(ValidationViolation::new(
                    self.name(),
                    format!("figures[{}].caption", i),
                    "Figure caption is empty",
                )),
                Some(_) => {}
            }

            match figure.placement.as_deref() {
                None => violations.push(
                    ValidationViolation::new(
                        self.name(),
                        format!("figures[{}].placement", i),
                        "Figure placement is missing",
                    )
                    .expected("inline | end-of-section"),
                ),
                Some(placement) if FigurePlacement::parse(placement).is_none() => violations.push(
                    ValidationViolation::new(
                        self.name(),
                        format!("figures[{}].placement", i),
                        "Unknown figure placement",
                    )
                    .expected("inline | end-of-section")
                    .actual(placement)
                    .remediation("Name the section in `section` instead of `placement`"),
                ),
                Some(_) => {}
            }

            if let Some(paragraph) = figure.paragraph {
                if paragraph < 1 {
                    violations.push(
                        ValidationViolation::new(
                            self.name(),
                            format!("figures[{}].paragraph", i),
                            "Paragraph anchor is 1-based",
                        )
                        .actual(paragraph.to_string()),
                    );
                }
            }
        }
        violations
    }
}

pub struct ReferencesRule;

impl ValidationRule for ReferencesRule {
    fn name(&self) -> &'static str { "references" }

    fn validate(&self, document: &RawDocument, _: &[Vec<u8>], _: &EngineConfig) -> Vec<ValidationViolation> {
        document.references.as_deref().unwrap_or_default()
            .iter()
            .enumerate()
            .filter(|(_, r)| r.trim().is_empty())
            .map(|(i, _)| ValidationViolation::new(
                self.name(),
                format!("references[{}]", i),
                "Reference entry is empty",
            ))
            .collect()
    }
}

pub struct ResourceLimitsRule;

impl ValidationRule for ResourceLimitsRule {
    fn name(&self) -> &'static str { "resource_limits" }

    fn validate(&self, document: &RawDocument, images: &[Vec<u8>], config: &EngineConfig) -> Vec<ValidationViolation> {
        let mut violations = vec![];
        let figure_count = document.figures.as_ref().map_or(0, Vec::len);

        if figure_count > config.max_figures {
            violations.push(
                ValidationViolation::new(self.name(), "figures", "Too many figures")
                    .expected(format!("{} figures max", config.max_figures))
                    .actual(format!("{} figures", figure_count)),
            );
        }

        if images.len() > config.max_figures {
            violations.push(
                ValidationViolation::new(self.name(), "images", "Too many images")
                    .expected(format!("{} images max", config.max_figures))
                    .actual(format!("{} images", images.len()))
                    .remediation("Remove images or raise maxFigures"),
            );
        }

        if images.len() != figure_count {
            violations.push(
                ValidationViolation::new(self.name(), "images", "Each figure needs exactly one image")
                    .expected(format!("{} images", figure_count))
                    .actual(format!("{} images", images.len())),
            );
        }

        for (i, image) in images.iter().enumerate() {
            if image.is_empty() {
                violations.push(ValidationViolation::new(
                    self.name(),
                    format!("images[{}]", i),
                    "Image is empty",
                ));
            } else if image.len() > config.max_image_bytes {
                violations.push(
                    ValidationViolation::new(self.name(), format!("images[{}]", i), "Image too large")
                        .expected(format!("{} bytes max", config.max_image_bytes))
                        .actual(format!("{} bytes", image.len()))
                        .remediation("Downscale or recompress the image"),
                );
            }
        }

        violations
    }
}

/// Validator runs all rules and builds the validated document
pub struct Validator {
    rules: Vec<Box<dyn ValidationRule + Send + Sync>>,
}

impl Validator {
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(RequiredFieldsRule),
                Box::new(SectionsRule),
                Box::new(FiguresRule),
                Box::new(ReferencesRule),
                Box::new(ResourceLimitsRule),
            ],
        }
    }

    pub fn validate(
        &self,
        document: &RawDocument,
        images: &[Vec<u8>],
        config: &EngineConfig,
    ) -> Result<StructuredDocument, ValidationError> {
        let mut all_violations = vec![];

        for rule in &self.rules {
            all_violations.extend(rule.validate(document, images, config));
        }

        if !all_violations.is_empty() {
            log::debug!("validation rejected document with {} violation(s)", all_violations.len());
            return Err(ValidationError::new(all_violations));
        }

        Ok(build_document(document))
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

// Only called once every rule has passed.
fn build_document(raw: &RawDocument) -> StructuredDocument {
    let sections = raw.sections.as_deref().unwrap_or_default()
        .iter()
        .map(|s| Section::new(
            s.heading.as_deref().unwrap_or_default().trim().to_string(),
            s.content.clone().unwrap_or_default(),
        ))
        .collect();

    let figures = raw.figures.as_deref().unwrap_or_default()
        .iter()
        .enumerate()
        .map(|(i, f)| Figure::new(
            i as u32 + 1,
            f.caption.as_deref().unwrap_or_default().trim().to_string(),
            f.placement.as_deref().and_then(FigurePlacement::parse).unwrap_or_default(),
            f.section.as_ref().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
            f.paragraph.map(|p| p as usize),
        ))
        .collect();

    StructuredDocument::new(
        raw.title.as_deref().unwrap_or_default().trim().to_string(),
        raw.authors.as_deref().unwrap_or_default().trim().to_string(),
        raw.abstract_text.as_deref().unwrap_or_default().trim().to_string(),
        raw.keywords.clone().unwrap_or_default()
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect(),
        sections,
        figures,
        raw.references.as_deref().unwrap_or_default()
            .iter()
            .map(|r| r.trim().to_string())
            .collect(),
    )
}
