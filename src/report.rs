//! Core data types: the uploaded file, its tagged input variant, and the
//! analysis result returned to callers.

use serde::{Deserialize, Serialize};

/// Media types accepted by the upload form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaType {
    Pdf,
    Jpeg,
    Png,
}

impl MediaType {
    /// Parse a declared content type, ignoring parameters (`; charset=…`).
    ///
    /// Returns `None` for anything outside the accepted three — the caller
    /// turns that into [`crate::error::AnalysisError::UnsupportedMediaType`].
    pub fn from_declared(declared: &str) -> Option<Self> {
        let essence = declared.split(';').next().unwrap_or("").trim();
        match essence.to_ascii_lowercase().as_str() {
            "application/pdf" => Some(MediaType::Pdf),
            "image/jpeg" => Some(MediaType::Jpeg),
            "image/png" => Some(MediaType::Png),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Pdf => "application/pdf",
            MediaType::Jpeg => "image/jpeg",
            MediaType::Png => "image/png",
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, MediaType::Jpeg | MediaType::Png)
    }
}

/// One uploaded report: raw bytes plus the declared media type.
///
/// Created per submission, never persisted. Dropping it at the end of the
/// request is the whole retention policy.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub bytes: Vec<u8>,
    pub media_type: MediaType,
}

impl UploadedFile {
    pub fn new(bytes: Vec<u8>, media_type: MediaType) -> Self {
        Self { bytes, media_type }
    }
}

/// The accepted input, tagged by kind.
///
/// Produced by the acceptor after validation; each variant dispatches to a
/// distinct extractor implementation.
#[derive(Debug)]
pub enum ReportInput {
    Pdf(Vec<u8>),
    Image(Vec<u8>),
}

/// Result of one full analysis request.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutput {
    /// Text extracted from the uploaded report.
    pub extracted_text: String,
    /// The model's answer, verbatim. Never parsed or post-processed.
    pub analysis: String,
    /// Per-stage timings and counters.
    pub stats: AnalysisStats,
}

/// Timings and counters for one analysis request.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisStats {
    pub extraction_ms: u64,
    pub completion_ms: u64,
    pub total_ms: u64,
    /// Completion retries actually performed (0 = first attempt succeeded).
    pub retries: u32,
    /// Size of the submitted prompt in characters.
    pub prompt_chars: usize,
}
