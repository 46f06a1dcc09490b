//! PDF text extraction.

mod extractor;

pub use extractor::PdfTextExtractor;

use serde::{Deserialize, Serialize};

use crate::error::ExtractionError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// One page of extracted plain text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTextBlock {
    /// Page index within the source document (0-indexed).
    pub page_index: usize,
    /// Page text in reading order.
    pub text: String,
}

impl RawTextBlock {
    pub fn new(page_index: usize, text: impl Into<String>) -> Self {
        Self {
            page_index,
            text: text.into(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Whether a document carries a usable text layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextLayer {
    /// At least one page has text.
    Present,
    /// Every page is blank (scanned or empty document).
    Missing,
}

impl TextLayer {
    pub fn of(blocks: &[RawTextBlock]) -> Self {
        if blocks.iter().all(RawTextBlock::is_blank) {
            TextLayer::Missing
        } else {
            TextLayer::Present
        }
    }
}

/// Turns document bytes into per-page text blocks.
pub trait TextExtractor {
    /// Extract one block per page, in page order.
    ///
    /// Pages without a text layer produce blank blocks rather than errors.
    fn extract(&self, data: &[u8]) -> Result<Vec<RawTextBlock>>;
}
