//! The full analysis pipeline, end to end.
//!
//! One call runs the strictly linear sequence the system is built around:
//! accept → extract → build prompt → complete. Each invocation operates on
//! its own uploaded bytes and returns its own output; nothing is retained
//! across requests.

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::pipeline::complete::{complete_with_retry, CompletionClient, GeminiClient};
use crate::pipeline::{accept, extract};
use crate::prompts;
use crate::report::{AnalysisOutput, AnalysisStats, UploadedFile};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Analyze one uploaded medical report.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `file` — the uploaded report, or `None` when the request carried no
///   file (which fails fast with zero extraction and zero remote calls)
/// * `config` — analysis configuration
///
/// # Errors
/// Returns [`AnalysisError`] classified by stage: input errors
/// (missing/oversized/mistyped upload), extraction errors (corrupt
/// document, empty page, undecodable image), or completion errors (auth,
/// rate limit, timeout, network, empty answer).
pub async fn analyze(
    file: Option<UploadedFile>,
    config: &AnalysisConfig,
) -> Result<AnalysisOutput, AnalysisError> {
    let total_start = Instant::now();

    // ── Step 1: Require an upload ────────────────────────────────────────
    let file = file.ok_or(AnalysisError::MissingInput)?;
    info!(
        media_type = file.media_type.as_str(),
        size = file.bytes.len(),
        "Starting analysis"
    );

    // ── Step 2: Accept and tag ───────────────────────────────────────────
    let input = accept::accept(file, config)?;

    // ── Step 3: Extract text ─────────────────────────────────────────────
    // Document parsing is CPU-bound; keep it off the async runtime.
    let extract_start = Instant::now();
    let extracted_text = tokio::task::spawn_blocking(move || extract::extract_text(&input))
        .await
        .map_err(|e| AnalysisError::Internal(format!("extraction task: {e}")))??;
    let extraction_ms = extract_start.elapsed().as_millis() as u64;

    // ── Step 4: Build the prompt ─────────────────────────────────────────
    let prompt = prompts::build_prompt(&extracted_text, config.max_prompt_chars);
    let prompt_chars = prompt.chars().count();

    // ── Step 5: Complete ─────────────────────────────────────────────────
    let client = resolve_client(config)?;
    let completion_start = Instant::now();
    let (analysis, retries) = complete_with_retry(
        client.as_ref(),
        &prompt,
        config.max_retries,
        config.retry_backoff_ms,
    )
    .await?;
    let completion_ms = completion_start.elapsed().as_millis() as u64;

    let stats = AnalysisStats {
        extraction_ms,
        completion_ms,
        total_ms: total_start.elapsed().as_millis() as u64,
        retries,
        prompt_chars,
    };

    info!(
        extraction_ms,
        completion_ms,
        total_ms = stats.total_ms,
        retries,
        "Analysis complete"
    );

    Ok(AnalysisOutput {
        extracted_text,
        analysis,
        stats,
    })
}

/// Synchronous wrapper around [`analyze`].
///
/// Creates a temporary tokio runtime internally.
pub fn analyze_sync(
    file: Option<UploadedFile>,
    config: &AnalysisConfig,
) -> Result<AnalysisOutput, AnalysisError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| AnalysisError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(analyze(file, config))
}

/// Resolve the completion client, most specific first.
///
/// 1. **Pre-built client** (`config.client`) — the caller constructed and
///    configured it entirely; used as-is. This is how tests inject fakes.
/// 2. **Config-derived Gemini client** — built from the key/model/URL
///    fields. A missing key still resolves; the call itself fails with
///    [`AnalysisError::MissingApiKey`].
fn resolve_client(config: &AnalysisConfig) -> Result<Arc<dyn CompletionClient>, AnalysisError> {
    if let Some(ref client) = config.client {
        return Ok(Arc::clone(client));
    }
    Ok(Arc::new(GeminiClient::from_config(config)?))
}
