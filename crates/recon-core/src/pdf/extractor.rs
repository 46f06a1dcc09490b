//! PDF text extraction using lopdf and pdf-extract.

use lopdf::Document;
use tracing::{debug, trace, warn};

use super::{RawTextBlock, Result, TextExtractor, TextLayer};
use crate::error::ExtractionError;
use crate::models::config::PdfConfig;

/// Text-layer extractor backed by pdf-extract, with lopdf as fallback.
#[derive(Debug, Clone, Default)]
pub struct PdfTextExtractor {
    /// Maximum pages to read (0 = unlimited).
    max_pages: usize,
}

impl PdfTextExtractor {
    /// Create a new extractor reading every page.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an extractor from configuration.
    pub fn from_config(config: &PdfConfig) -> Self {
        Self::new().with_max_pages(config.max_pages)
    }

    /// Cap the number of pages read.
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Open the document, decrypting with the empty password when needed.
    ///
    /// Returns the document and the bytes pdf-extract should read.
    fn open(&self, data: &[u8]) -> Result<(Document, Vec<u8>)> {
        let mut doc = Document::load_mem(data).map_err(|e| ExtractionError::Parse(e.to_string()))?;

        let raw = if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(ExtractionError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            let mut decrypted = Vec::new();
            doc.save_to(&mut decrypted)
                .map_err(|e| ExtractionError::Parse(format!("Failed to save decrypted PDF: {}", e)))?;
            decrypted
        } else {
            data.to_vec()
        };

        if doc.get_pages().is_empty() {
            return Err(ExtractionError::NoPages);
        }

        Ok((doc, raw))
    }

    /// Per-page text via lopdf's content stream decoder.
    fn extract_with_lopdf(&self, doc: &Document, page_numbers: &[u32]) -> Result<Vec<String>> {
        let mut failures = 0;
        let texts: Vec<String> = page_numbers
            .iter()
            .map(|&number| match doc.extract_text(&[number]) {
                Ok(text) => text,
                Err(e) => {
                    warn!("Could not read text of page {}: {}", number, e);
                    failures += 1;
                    String::new()
                }
            })
            .collect();

        if failures == page_numbers.len() {
            return Err(ExtractionError::TextExtraction(format!(
                "no page of {} could be decoded",
                page_numbers.len()
            )));
        }
        Ok(texts)
    }
}

impl TextExtractor for PdfTextExtractor {
    fn extract(&self, data: &[u8]) -> Result<Vec<RawTextBlock>> {
        let (doc, raw) = self.open(data)?;

        let mut page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
        if self.max_pages > 0 && page_numbers.len() > self.max_pages {
            warn!(
                "Document has {} pages, reading only the first {}",
                page_numbers.len(),
                self.max_pages
            );
            page_numbers.truncate(self.max_pages);
        }

        let texts = match pdf_extract::extract_text_from_mem_by_pages(&raw) {
            Ok(mut pages) => {
                pages.truncate(page_numbers.len());
                pages.resize(page_numbers.len(), String::new());
                pages
            }
            Err(e) => {
                debug!("pdf-extract failed ({}), falling back to lopdf", e);
                self.extract_with_lopdf(&doc, &page_numbers)?
            }
        };

        let blocks: Vec<RawTextBlock> = texts
            .into_iter()
            .enumerate()
            .map(|(index, text)| {
                trace!("Page {}: {} chars", index + 1, text.len());
                RawTextBlock::new(index, text)
            })
            .collect();

        debug!(
            "Extracted {} pages, text layer {:?}",
            blocks.len(),
            TextLayer::of(&blocks)
        );

        Ok(blocks)
    }
}
