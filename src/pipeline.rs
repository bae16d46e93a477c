//! Generation Pipeline - Single Entry Point
//!
//! validate -> layout -> serialize. Every stage error aborts the run and is
//! surfaced as a `GenerationError` with an explicit code; no bytes are
//! returned unless every stage succeeded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::docx::{self, SerializationError};
use crate::export::{suggested_filename, DOCX_MEDIA_TYPE};
use crate::hashing::{compute_job_hash, sha256_hex};
use crate::layout::{self, LayoutBlock, LayoutError};
use crate::model::{ExportRequest, RawDocument, StructuredDocument};
use crate::styles::{StyleCatalog, IEEE_CONFERENCE};
use crate::validation::{ValidationError, Validator};
use crate::ENGINE_VERSION;

#[cfg(feature = "test-hooks")]
use std::sync::atomic::{AtomicU32, Ordering};

#[cfg(feature = "test-hooks")]
static VALIDATION_CALL_COUNT: AtomicU32 = AtomicU32::new(0);

#[cfg(feature = "test-hooks")]
pub fn get_validation_call_count() -> u32 {
    VALIDATION_CALL_COUNT.load(Ordering::SeqCst)
}

#[cfg(feature = "test-hooks")]
pub fn reset_validation_call_count() {
    VALIDATION_CALL_COUNT.store(0, Ordering::SeqCst);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    LayoutError,
    SerializationError,
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Layout failed: {0}")]
    Layout(#[from] LayoutError),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] SerializationError),
}

impl GenerationError {
    pub fn code(&self) -> ErrorCode {
        match self {
            GenerationError::Validation(_) => ErrorCode::ValidationError,
            GenerationError::Layout(_) => ErrorCode::LayoutError,
            GenerationError::Serialization(_) => ErrorCode::SerializationError,
        }
    }
}

/// Manifest of one generation run. `bytes` is the package itself.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedDocument {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub filename: String,
    pub media_type: String,
    pub engine_version: String,
    pub job_hash: String,
    pub package_hash: String,
    pub size_bytes: usize,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

/// The generation pipeline. Stateless per call; safe to share across threads.
pub struct GenerationPipeline {
    config: EngineConfig,
    catalog: &'static StyleCatalog,
    validator: Validator,
}

impl GenerationPipeline {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            catalog: &IEEE_CONFERENCE,
            validator: Validator::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &'static StyleCatalog {
        self.catalog
    }

    /// This is the ONLY validation entry point.
    pub fn validate(
        &self,
        document: &RawDocument,
        images: &[Vec<u8>],
    ) -> Result<StructuredDocument, ValidationError> {
        #[cfg(feature = "test-hooks")]
        VALIDATION_CALL_COUNT.fetch_add(1, Ordering::SeqCst);

        self.validator.validate(document, images, &self.config)
    }

    /// Decode and validate a whole export request. Undecodable images are
    /// reported alongside every problem in the paper itself.
    pub fn validate_request(
        &self,
        request: &ExportRequest,
    ) -> Result<(StructuredDocument, Vec<Vec<u8>>), ValidationError> {
        let (images, mut violations) = request.decode_positional();

        match self.validate(&request.paper, &images) {
            Ok(document) if violations.is_empty() => Ok((document, images)),
            Ok(_) => Err(ValidationError::new(violations)),
            Err(e) => {
                // Placeholder slots are already reported as undecodable
                let undecoded: Vec<String> = violations.iter().map(|v| v.field.clone()).collect();
                violations.extend(
                    e.into_violations()
                        .into_iter()
                        .filter(|v| !undecoded.contains(&v.field)),
                );
                Err(ValidationError::new(violations))
            }
        }
    }

    /// Validate and lay out without serializing.
    pub fn layout(
        &self,
        document: &RawDocument,
        images: &[Vec<u8>],
    ) -> Result<Vec<LayoutBlock>, GenerationError> {
        let validated = self.validate(document, images)?;
        Ok(layout::layout(&validated)?)
    }

    pub fn layout_request(&self, request: &ExportRequest) -> Result<Vec<LayoutBlock>, GenerationError> {
        let (validated, _) = self.validate_request(request)?;
        Ok(layout::layout(&validated)?)
    }

    /// Generate the package. Always validates first; no bypass.
    pub fn generate(
        &self,
        document: &RawDocument,
        images: &[Vec<u8>],
    ) -> Result<GeneratedDocument, GenerationError> {
        let validated = self.validate(document, images)?;
        self.assemble(&validated, images)
    }

    pub fn generate_request(&self, request: &ExportRequest) -> Result<GeneratedDocument, GenerationError> {
        let (validated, images) = self.validate_request(request)?;
        self.assemble(&validated, &images)
    }

    /// Generate from an export request body (`{"paper": ..., "images": [base64]}`).
    pub fn generate_json(&self, json: &str) -> Result<GeneratedDocument, GenerationError> {
        let request = ExportRequest::from_json(json)?;
        self.generate_request(&request)
    }

    fn assemble(
        &self,
        validated: &StructuredDocument,
        images: &[Vec<u8>],
    ) -> Result<GeneratedDocument, GenerationError> {
        let blocks = layout::layout(validated)?;
        let bytes = docx::serialize(&blocks, self.catalog, images)?;

        let job_hash = compute_job_hash(validated, images, ENGINE_VERSION)
            .map_err(SerializationError::from)?;
        let generated = GeneratedDocument {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            filename: suggested_filename(validated.title(), self.config.max_title_length),
            media_type: DOCX_MEDIA_TYPE.to_string(),
            engine_version: ENGINE_VERSION.to_string(),
            job_hash,
            package_hash: sha256_hex(&bytes),
            size_bytes: bytes.len(),
            bytes,
        };

        log::info!(
            "generated {} ({} bytes, package {})",
            generated.filename, generated.size_bytes, generated.package_hash
        );
        Ok(generated)
    }
}

impl Default for GenerationPipeline {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

/// Export request JSON in, package bytes out, with default limits.
pub fn generate(json: &str) -> Result<Vec<u8>, GenerationError> {
    GenerationPipeline::default()
        .generate_json(json)
        .map(|generated| generated.bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationViolation;

    #[test]
    fn test_error_codes() {
        let validation = GenerationError::from(ValidationError::single(
            ValidationViolation::new("r", "title", "Title is empty"),
        ));
        assert_eq!(validation.code(), ErrorCode::ValidationError);

        let layout = GenerationError::from(LayoutError::UnresolvedAnchor {
            figure: 1,
            section: "Intro".into(),
            paragraph: 2,
            available: 1,
        });
        assert_eq!(layout.code(), ErrorCode::LayoutError);
        assert!(layout.to_string().contains("Figure 1"));

        let serialization = GenerationError::from(SerializationError::MissingTitle);
        assert_eq!(serialization.code(), ErrorCode::SerializationError);
    }

    #[test]
    fn test_error_code_wire_names() {
        assert_eq!(
            serde_json::to_string(&ErrorCode::SerializationError).unwrap(),
            r#""SERIALIZATION_ERROR""#
        );
    }

    #[test]
    fn test_bad_image_reported_with_paper_violations() {
        let request = ExportRequest::from_json(
            r#"{"paper": {"title": "", "sections": []}, "images": ["!!!not-base64"]}"#,
        )
        .unwrap();
        let err = GenerationPipeline::default().validate_request(&request).unwrap_err();

        for field in ["images[0]", "title", "abstract", "keywords", "sections"] {
            assert!(err.has_field(field), "no violation for {}", field);
        }
        // The placeholder slot is not reported a second time as an empty image
        let image_slot: Vec<_> = err.violations().iter().filter(|v| v.field == "images[0]").collect();
        assert_eq!(image_slot.len(), 1);
        assert_eq!(image_slot[0].rule, "image_encoding");
    }

    #[test]
    fn test_pipeline_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<GenerationPipeline>();
    }
}
