//! Input acceptance: validate the upload and tag it by kind.
//!
//! The declared media type alone is attacker-controlled, so declared PDFs
//! are additionally sniffed for the `%PDF` magic prefix before anything
//! tries to parse them — a mismatch gets a precise error instead of a
//! confusing parser failure downstream. Images are not sniffed here; the
//! extractor's decode step is the validation.
//!
//! Size policy: uploads above `max_upload_bytes` (20 MiB by default) are
//! rejected outright. The web layer enforces the same bound on the request
//! body, so this check mostly matters for direct library callers.

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::report::{MediaType, ReportInput, UploadedFile};
use tracing::debug;

/// Validate an uploaded file and tag it for extraction.
///
/// # Errors
/// * [`AnalysisError::FileTooLarge`] — upload exceeds the configured cap
/// * [`AnalysisError::NotAPdf`] — declared `application/pdf` without the
///   PDF magic bytes
pub fn accept(file: UploadedFile, config: &AnalysisConfig) -> Result<ReportInput, AnalysisError> {
    if file.bytes.len() > config.max_upload_bytes {
        return Err(AnalysisError::FileTooLarge {
            size: file.bytes.len(),
            max: config.max_upload_bytes,
        });
    }

    debug!(
        media_type = file.media_type.as_str(),
        size = file.bytes.len(),
        "Accepted upload"
    );

    match file.media_type {
        MediaType::Pdf => {
            let mut magic = [0u8; 4];
            let head = file.bytes.get(..4).unwrap_or(&file.bytes[..]);
            magic[..head.len()].copy_from_slice(head);
            if &magic != b"%PDF" {
                return Err(AnalysisError::NotAPdf { magic });
            }
            Ok(ReportInput::Pdf(file.bytes))
        }
        MediaType::Jpeg | MediaType::Png => Ok(ReportInput::Image(file.bytes)),
    }
}
