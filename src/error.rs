//! Error types for the reportlens library.
//!
//! One enum, three failure classes, matching the three places a request can
//! die:
//!
//! * **Input errors** — the upload itself is unusable (missing, wrong type,
//!   too large). Nothing was extracted, nothing was sent to the model.
//! * **Extraction errors** — the bytes were accepted but no analyzable text
//!   came out of them (corrupt document, empty page, undecodable image).
//! * **Completion errors** — extraction succeeded but the remote model call
//!   failed (missing key, auth, rate limit, timeout, network, empty answer).
//!
//! The class distinction matters to callers: input and extraction errors are
//! the uploader's problem and never worth retrying; completion errors split
//! into configuration failures (fix the key) and transient ones (try again).
//! [`AnalysisError::is_transient`] encodes that split for the retry loop.
//!
//! Every variant wraps and translates — no lopdf, image, or reqwest error
//! ever reaches the presentation layer raw.

use thiserror::Error;

/// All errors returned by the reportlens library.
#[derive(Debug, Error)]
pub enum AnalysisError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// No file was supplied with the request.
    #[error("No report uploaded. Please upload a medical report to continue.")]
    MissingInput,

    /// The declared media type is not one of the accepted three.
    #[error("Unsupported media type '{declared}'. Accepted: application/pdf, image/jpeg, image/png.")]
    UnsupportedMediaType { declared: String },

    /// The upload exceeds the configured size cap.
    #[error("Uploaded file is too large: {size} bytes (maximum {max}).")]
    FileTooLarge { size: usize, max: usize },

    /// The multipart request body could not be read.
    #[error("Malformed upload request: {detail}")]
    MalformedUpload { detail: String },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// Declared as a PDF but the bytes do not start with the PDF magic.
    #[error("File declared as PDF is not a PDF (first bytes: {magic:?}).")]
    NotAPdf { magic: [u8; 4] },

    /// The byte stream is not a parseable document.
    #[error("Could not read the document: {detail}")]
    CorruptDocument { detail: String },

    /// A page produced no text at all.
    ///
    /// Scanned (image-only) PDFs commonly hit this — there is no text layer
    /// to extract, and silently analyzing an empty report would be worse
    /// than failing.
    #[error("Page {page} contains no extractable text. Scanned PDFs without a text layer are not supported.")]
    EmptyPage { page: u32 },

    /// The uploaded image could not be decoded.
    #[error("Could not decode the image: {detail}")]
    ImageDecodeFailed { detail: String },

    // ── Completion errors ─────────────────────────────────────────────────
    /// No API key was configured.
    #[error("No API key configured. Set GEMINI_API_KEY and restart.")]
    MissingApiKey,

    /// The provider rejected our credentials (401/403).
    #[error("Authentication failed (HTTP {status}): {detail}\nCheck that GEMINI_API_KEY is valid.")]
    AuthFailed { status: u16, detail: String },

    /// HTTP 429 from the provider — back off before retrying.
    #[error("Rate limit exceeded by the completion provider.")]
    RateLimited { retry_after_secs: Option<u64> },

    /// The completion call exceeded the configured timeout.
    #[error("Completion request timed out after {secs}s.")]
    ApiTimeout { secs: u64 },

    /// Transport-level failure talking to the provider.
    #[error("Network error calling the completion provider: {detail}")]
    Network { detail: String },

    /// Non-2xx response not covered by a more specific variant.
    #[error("Completion provider returned HTTP {status}: {detail}")]
    ApiError { status: u16, detail: String },

    /// The response body did not match the expected schema.
    #[error("Could not parse the completion response: {detail}")]
    InvalidResponse { detail: String },

    /// The provider answered, but with no text.
    #[error("The completion provider returned an empty response.")]
    EmptyCompletion,

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AnalysisError {
    /// Whether a retry could plausibly succeed.
    ///
    /// Transient: rate limits, timeouts, transport failures, and provider
    /// 5xx. Everything else — bad input, bad credentials, bad config — will
    /// fail identically on the next attempt and is not retried.
    pub fn is_transient(&self) -> bool {
        match self {
            AnalysisError::RateLimited { .. }
            | AnalysisError::ApiTimeout { .. }
            | AnalysisError::Network { .. } => true,
            AnalysisError::ApiError { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Whether this error belongs to the completion class.
    pub fn is_completion_error(&self) -> bool {
        matches!(
            self,
            AnalysisError::MissingApiKey
                | AnalysisError::AuthFailed { .. }
                | AnalysisError::RateLimited { .. }
                | AnalysisError::ApiTimeout { .. }
                | AnalysisError::Network { .. }
                | AnalysisError::ApiError { .. }
                | AnalysisError::InvalidResponse { .. }
                | AnalysisError::EmptyCompletion
        )
    }
}
