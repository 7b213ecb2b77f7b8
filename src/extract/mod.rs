//! Extraction Capability boundary.
//!
//! Two black-box capabilities from the pipeline's viewpoint: text from file
//! bytes (OCR) and structured fields from text (LLM). Both are trait-based
//! so stage executors stay fully testable with mock implementations.

pub mod llm;
pub mod parser;
pub mod prompt;
pub mod recognize;
pub mod types;

pub use llm::*;
pub use parser::*;
pub use recognize::*;
pub use types::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Unsupported file kind: {0}")]
    UnsupportedKind(String),

    #[error("Text recognition failed: {0}")]
    Recognition(String),

    #[error("Cannot connect to capability endpoint: {0}")]
    Connection(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Capability returned HTTP {status}: {body}")]
    ApiStatus { status: u16, body: String },

    #[error("Response parsing failed: {0}")]
    ResponseParsing(String),
}

/// Text-from-bytes capability. One call per attached file.
pub trait TextRecognizer {
    fn recognize(&self, bytes: &[u8], kind: FileKind) -> Result<String, ExtractError>;
}

/// Fields-from-text capability. Malformed model output is absorbed into the
/// all-null fallback by the implementation, not surfaced as an error;
/// transport and provider failures still are.
pub trait FieldExtractor {
    fn extract_fields(&self, text: &str) -> Result<FieldExtraction, ExtractError>;
}
