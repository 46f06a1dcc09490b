//! Error types for the recon-core library.

use thiserror::Error;

use crate::parser::Layout;

/// Main error type for the recon library.
#[derive(Error, Debug)]
pub enum ReconError {
    /// A document could not be opened or read.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// A document was read but its lines did not match the layout.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while turning PDF bytes into page text.
///
/// These are fatal for the single document only.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and the empty password did not open it.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,
}

/// Diagnostics raised from parse statistics at the caller's discretion.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Not a single line matched the layout's rules.
    #[error("no line of {lines_scanned} matched the {layout} layout; the document format may have changed")]
    FormatMismatch { layout: Layout, lines_scanned: usize },
}

/// Invalid configuration values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A field holds a value outside its accepted range.
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: String, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for the recon library.
pub type Result<T> = std::result::Result<T, ReconError>;
