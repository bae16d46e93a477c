//! PaperForge Core - IEEE Document Assembly & Layout Engine
//!
//! # Guarantees
//! 1. Nothing Is Generated From Unvalidated Input
//! 2. Every Violation Is Reported, Not Just The First
//! 3. The Document Is Read-Only After Validation
//! 4. Deterministic Output
//! 5. All Or Nothing: No Partial Packages

pub mod config;
pub mod docx;
pub mod export;
pub mod hashing;
pub mod layout;
pub mod model;
pub mod pipeline;
pub mod references;
pub mod styles;
pub mod validation;

pub use config::{ConfigError, EngineConfig};
pub use docx::{serialize, SerializationError};
pub use hashing::{compute_job_hash, sha256_hex};
pub use layout::{layout, BlockKind, ColumnMode, LayoutBlock, LayoutError};
pub use model::{ExportRequest, Figure, FigurePlacement, RawDocument, Section, StructuredDocument};
pub use pipeline::{generate, ErrorCode, GeneratedDocument, GenerationError, GenerationPipeline};
pub use references::{format_references, RenderedReference};
pub use styles::{StyleCatalog, StyleId, IEEE_CONFERENCE};
pub use validation::{ValidationError, ValidationRule, ValidationViolation, Validator};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
