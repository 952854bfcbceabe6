//! Remote completion: send the prompt, return the model's text.
//!
//! [`CompletionClient`] is the seam between the pipeline and the provider.
//! The production implementation, [`GeminiClient`], posts one
//! `generateContent` request per analysis with **default model parameters**
//! (no temperature or output-length overrides) and returns the first
//! candidate's text verbatim. Tests substitute a fake client through
//! [`crate::config::AnalysisConfig::client`].
//!
//! ## Retry Strategy
//!
//! HTTP 429 / 5xx and transport failures are transient and worth a bounded
//! retry. Exponential backoff (`retry_backoff_ms * 2^attempt`) avoids
//! hammering a recovering endpoint: with a 500 ms base and 2 retries the
//! wait sequence is 500 ms → 1 s. Auth failures and other 4xx are never
//! retried — they will fail identically until the configuration changes.
//! The per-call timeout lives on the HTTP client itself, so a stalled
//! connection surfaces as [`AnalysisError::ApiTimeout`] instead of hanging
//! the request.

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

/// Capability: produce a text completion for a prompt.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// One completion attempt. No internal retries — the pipeline's retry
    /// loop owns that policy.
    async fn complete(&self, prompt: &str) -> Result<String, AnalysisError>;
}

/// Drive a [`CompletionClient`] with bounded retry and backoff.
///
/// Returns the completion text and the number of retries performed.
/// Non-transient errors surface immediately; transient ones are retried up
/// to `max_retries` times, and the last error is returned when the budget
/// is exhausted.
pub async fn complete_with_retry(
    client: &dyn CompletionClient,
    prompt: &str,
    max_retries: u32,
    retry_backoff_ms: u64,
) -> Result<(String, u32), AnalysisError> {
    let mut last_err: Option<AnalysisError> = None;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            let backoff = retry_backoff_ms * 2u64.pow(attempt - 1);
            warn!(attempt, max_retries, backoff_ms = backoff, "Retrying completion");
            sleep(Duration::from_millis(backoff)).await;
        }

        match client.complete(prompt).await {
            Ok(text) => return Ok((text, attempt)),
            Err(e) if e.is_transient() && attempt < max_retries => {
                warn!(error = %e, attempt, "Transient completion failure");
                last_err = Some(e);
            }
            Err(e) => return Err(e),
        }
    }

    // Unreachable unless max_retries wrapped; keep a defined failure anyway.
    Err(last_err.unwrap_or(AnalysisError::Internal("retry loop exhausted".into())))
}

// ── Gemini wire types ────────────────────────────────────────────────────

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

// ── Production client ────────────────────────────────────────────────────

/// Gemini `generateContent` client.
///
/// Constructed explicitly from [`AnalysisConfig`] — the key, model, and
/// endpoint all come from the config, never from ambient process state.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    timeout_secs: u64,
}

impl GeminiClient {
    /// Build a client from the analysis configuration.
    ///
    /// A missing API key is allowed here: the process should start and
    /// serve pages without one. The key is checked per completion call,
    /// which fails with [`AnalysisError::MissingApiKey`].
    pub fn from_config(config: &AnalysisConfig) -> Result<Self, AnalysisError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .map_err(|e| AnalysisError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            timeout_secs: config.api_timeout_secs,
        })
    }

    fn endpoint(&self, api_key: &str) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, api_key
        )
    }
}

#[async_trait]
impl CompletionClient for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String, AnalysisError> {
        let api_key = self.api_key.as_deref().ok_or(AnalysisError::MissingApiKey)?;

        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let response = self
            .http
            .post(self.endpoint(api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AnalysisError::ApiTimeout {
                        secs: self.timeout_secs,
                    }
                } else {
                    AnalysisError::Network {
                        detail: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            let detail = response.text().await.unwrap_or_default();

            return Err(match status.as_u16() {
                401 | 403 => AnalysisError::AuthFailed {
                    status: status.as_u16(),
                    detail,
                },
                429 => AnalysisError::RateLimited { retry_after_secs },
                code => AnalysisError::ApiError {
                    status: code,
                    detail,
                },
            });
        }

        let parsed: GenerateContentResponse =
            response
                .json()
                .await
                .map_err(|e| AnalysisError::InvalidResponse {
                    detail: e.to_string(),
                })?;

        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(AnalysisError::EmptyCompletion);
        }

        debug!(chars = text.chars().count(), "Completion received");
        Ok(text)
    }
}
