//! # reportlens
//!
//! Analyze medical reports (PDF or image) with a hosted LLM.
//!
//! ## What this crate does
//!
//! One uploaded report flows through a strictly linear pipeline: the file
//! is validated and tagged, its text extracted (PDF text layer; images are
//! a documented placeholder stub — no OCR), interpolated into a fixed
//! six-section analysis prompt, and sent to Google Gemini's
//! `generateContent` API. The model's free-text answer is returned
//! verbatim — never parsed, never persisted.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload
//!  │
//!  ├─ 1. Accept    validate media type, size cap, magic bytes
//!  ├─ 2. Extract   PDF: per-page text, document order, no separator
//!  │               image: decode + canonical PNG re-encode, placeholder text
//!  ├─ 3. Prompt    substitute text into the six-section template
//!  ├─ 4. Complete  one generateContent call, bounded retry, 30 s timeout
//!  └─ 5. Output    extracted text + analysis + per-stage stats
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use reportlens::{analyze, AnalysisConfig, MediaType, UploadedFile};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AnalysisConfig::builder()
//!         .api_key(std::env::var("GEMINI_API_KEY")?)
//!         .build()?;
//!
//!     let bytes = std::fs::read("report.pdf")?;
//!     let file = UploadedFile::new(bytes, MediaType::Pdf);
//!
//!     let output = analyze(Some(file), &config).await?;
//!     println!("{}", output.analysis);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `server` | on      | Enables the `reportlens` web binary (axum + clap + anyhow + tracing-subscriber) |
//!
//! Disable `server` when using only the library:
//! ```toml
//! reportlens = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod prompts;
pub mod report;
#[cfg(feature = "server")]
pub mod web;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{analyze, analyze_sync};
pub use config::{AnalysisConfig, AnalysisConfigBuilder, DEFAULT_API_BASE_URL, DEFAULT_MODEL};
pub use error::AnalysisError;
pub use pipeline::complete::{CompletionClient, GeminiClient};
pub use pipeline::extract::{TextExtractor, IMAGE_PLACEHOLDER_TEXT};
pub use report::{AnalysisOutput, AnalysisStats, MediaType, ReportInput, UploadedFile};
