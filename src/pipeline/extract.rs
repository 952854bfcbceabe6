//! Text extraction: tagged input bytes → analyzable plain text.
//!
//! Two implementations live behind the [`TextExtractor`] trait:
//!
//! * [`PdfTextExtractor`] — opens the byte stream with lopdf and
//!   concatenates each page's extracted text **in document order with no
//!   separator**. A corrupt stream or a page with no text layer fails with
//!   an explicit extraction error rather than producing silent garbage.
//!
//! * [`ImageExtractor`] — decodes the upload and re-encodes it to a
//!   canonical PNG bitmap, then returns a fixed placeholder string. **No
//!   OCR is performed** — this is a documented stub, kept so the accepted
//!   media types and the decode/re-encode behaviour stay observable. The
//!   trait seam is where a real OCR implementation would slot in.
//!
//! Both are CPU-bound and synchronous; the orchestrator runs them under
//! `spawn_blocking` so document parsing never stalls the async runtime.

use crate::error::AnalysisError;
use crate::report::ReportInput;
use image::ImageFormat;
use lopdf::Document;
use std::io::Cursor;
use tracing::debug;

/// Placeholder returned for every image upload until OCR exists.
pub const IMAGE_PLACEHOLDER_TEXT: &str = "Extracted text from image";

/// Capability: turn uploaded bytes into analyzable plain text.
pub trait TextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String, AnalysisError>;
}

/// Dispatch the tagged input to its extractor.
pub fn extract_text(input: &ReportInput) -> Result<String, AnalysisError> {
    match input {
        ReportInput::Pdf(bytes) => PdfTextExtractor.extract(bytes),
        ReportInput::Image(bytes) => ImageExtractor.extract(bytes),
    }
}

/// PDF text extraction via lopdf.
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String, AnalysisError> {
        let doc = Document::load_mem(bytes).map_err(|e| AnalysisError::CorruptDocument {
            detail: e.to_string(),
        })?;

        // get_pages() is keyed by 1-indexed page number; BTreeMap iteration
        // gives document order.
        let mut text = String::new();
        for (page_num, _object_id) in doc.get_pages() {
            let page_text =
                doc.extract_text(&[page_num])
                    .map_err(|e| AnalysisError::CorruptDocument {
                        detail: format!("page {page_num}: {e}"),
                    })?;
            if page_text.trim().is_empty() {
                return Err(AnalysisError::EmptyPage { page: page_num });
            }
            text.push_str(&page_text);
        }

        debug!(chars = text.chars().count(), "Extracted PDF text");
        Ok(text)
    }
}

/// Image branch: decode, re-encode to canonical PNG, return the placeholder.
pub struct ImageExtractor;

impl TextExtractor for ImageExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String, AnalysisError> {
        let img = image::load_from_memory(bytes).map_err(|e| AnalysisError::ImageDecodeFailed {
            detail: e.to_string(),
        })?;

        // Canonical-bitmap normalisation. The buffer is discarded — nothing
        // reads it until an OCR stage exists — but the round-trip validates
        // the upload end to end.
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .map_err(|e| AnalysisError::ImageDecodeFailed {
                detail: format!("PNG re-encode: {e}"),
            })?;
        debug!(
            width = img.width(),
            height = img.height(),
            png_bytes = buf.len(),
            "Decoded image upload (no OCR, placeholder text returned)"
        );

        Ok(IMAGE_PLACEHOLDER_TEXT.to_string())
    }
}
