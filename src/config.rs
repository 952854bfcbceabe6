//! Configuration for report analysis.
//!
//! All behaviour is controlled through [`AnalysisConfig`], built via its
//! [`AnalysisConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share the config across handlers and to diff two runs to
//! understand why their outputs differ. There is no ambient global state:
//! the API key lives here and is handed to the completion client at
//! construction time.

use crate::error::AnalysisError;
use crate::pipeline::complete::CompletionClient;
use std::fmt;
use std::sync::Arc;

/// Default Gemini REST endpoint.
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Configuration for a report analysis.
///
/// Built via [`AnalysisConfig::builder()`] or [`AnalysisConfig::default()`].
///
/// # Example
/// ```rust
/// use reportlens::AnalysisConfig;
///
/// let config = AnalysisConfig::builder()
///     .api_key("AIza...")
///     .model("gemini-2.0-flash")
///     .api_timeout_secs(30)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct AnalysisConfig {
    /// API key for the completion provider. `None` means requests fail with
    /// [`AnalysisError::MissingApiKey`] — the process itself stays up.
    pub api_key: Option<String>,

    /// Model identifier. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// Base URL of the completion REST API. Default: [`DEFAULT_API_BASE_URL`].
    ///
    /// Overridable so tests can point the client at a local stub server.
    pub api_base_url: String,

    /// Per-completion-call timeout in seconds. Default: 30.
    ///
    /// The remote call is the only unbounded step in the pipeline; without
    /// this cap a stalled provider connection holds the request open
    /// indefinitely.
    pub api_timeout_secs: u64,

    /// Maximum retry attempts on a transient completion failure. Default: 2.
    ///
    /// Auth failures and other 4xx are never retried — they surface
    /// immediately. See [`AnalysisError::is_transient`].
    pub max_retries: u32,

    /// Initial retry delay in milliseconds (exponential backoff). Default: 500.
    ///
    /// Doubles after each attempt: 500 ms → 1 s → 2 s.
    pub retry_backoff_ms: u64,

    /// Maximum accepted upload size in bytes. Default: 20 MiB.
    pub max_upload_bytes: usize,

    /// Maximum length of the built prompt in characters. Default: `None`
    /// (unlimited).
    ///
    /// When set, extracted text is truncated at a character boundary so the
    /// prompt fits. `None` preserves the original behaviour of submitting
    /// whatever was extracted; documents exceeding the provider's input
    /// limit then fail at the provider, not here.
    pub max_prompt_chars: Option<usize>,

    /// Pre-constructed completion client. Takes precedence over the
    /// key/model/URL fields above. Used by tests to inject a fake.
    pub client: Option<Arc<dyn CompletionClient>>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_timeout_secs: 30,
            max_retries: 2,
            retry_backoff_ms: 500,
            max_upload_bytes: 20 * 1024 * 1024,
            max_prompt_chars: None,
            client: None,
        }
    }
}

impl fmt::Debug for AnalysisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("api_base_url", &self.api_base_url)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("max_prompt_chars", &self.max_prompt_chars)
            .field("client", &self.client.as_ref().map(|_| "<dyn CompletionClient>"))
            .finish()
    }
}

impl AnalysisConfig {
    /// Create a new builder for `AnalysisConfig`.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`AnalysisConfig`].
#[derive(Debug)]
pub struct AnalysisConfigBuilder {
    config: AnalysisConfig,
}

impl AnalysisConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_base_url = url.into();
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs.max(1);
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn max_upload_bytes(mut self, n: usize) -> Self {
        self.config.max_upload_bytes = n.max(1);
        self
    }

    pub fn max_prompt_chars(mut self, n: usize) -> Self {
        self.config.max_prompt_chars = Some(n);
        self
    }

    pub fn client(mut self, client: Arc<dyn CompletionClient>) -> Self {
        self.config.client = Some(client);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnalysisConfig, AnalysisError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(AnalysisError::InvalidConfig("Model must not be empty".into()));
        }
        if c.api_base_url.trim().is_empty() {
            return Err(AnalysisError::InvalidConfig(
                "API base URL must not be empty".into(),
            ));
        }
        if let Some(max) = c.max_prompt_chars {
            // The template itself occupies a fixed share of the budget.
            if max < crate::prompts::prompt_overhead_chars() {
                return Err(AnalysisError::InvalidConfig(format!(
                    "max_prompt_chars {} is smaller than the prompt template itself ({})",
                    max,
                    crate::prompts::prompt_overhead_chars()
                )));
            }
        }
        Ok(self.config)
    }
}
