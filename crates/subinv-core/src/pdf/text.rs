//! Page text extraction using pdf-extract, with lopdf handling decryption.

use std::path::Path;

use lopdf::Document;
use tracing::debug;

use super::{Result, TextSource};
use crate::error::PdfError;

/// [`TextSource`] reading the PDF text layer one page at a time.
///
/// Text is laid out by glyph position, so lines drawn inside a single
/// `BT`/`ET` block come back as separate lines.
#[derive(Debug, Clone, Default)]
pub struct PdfTextExtractor;

impl PdfTextExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Returns PDF bytes that pdf-extract can read, decrypting if needed.
    fn prepare(data: Vec<u8>) -> Result<Vec<u8>> {
        let mut doc = Document::load_mem(&data).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Handle PDFs with empty password encryption
        if !doc.is_encrypted() {
            return Ok(data);
        }
        if doc.decrypt("").is_err() {
            return Err(PdfError::Encrypted);
        }
        debug!("Decrypted PDF with empty password");

        let mut decrypted = Vec::new();
        doc.save_to(&mut decrypted)
            .map_err(|e| PdfError::Parse(format!("Failed to save decrypted PDF: {}", e)))?;
        Ok(decrypted)
    }

    fn page_text_from_mem(data: Vec<u8>, page_index: u32) -> Result<String> {
        let data = Self::prepare(data)?;
        let mut pages = pdf_extract::extract_text_from_mem_by_pages(&data)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))?;

        if pages.is_empty() {
            return Err(PdfError::NoPages);
        }
        let index = page_index as usize;
        if index >= pages.len() {
            return Err(PdfError::InvalidPage(page_index + 1));
        }
        Ok(pages.swap_remove(index))
    }
}

impl TextSource for PdfTextExtractor {
    fn page_text(&self, path: &Path, page_index: u32) -> Result<String> {
        let data = std::fs::read(path)
            .map_err(|e| PdfError::Parse(format!("{}: {}", path.display(), e)))?;
        Self::page_text_from_mem(data, page_index)
    }
}
