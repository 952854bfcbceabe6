//! Web binary for reportlens.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `AnalysisConfig` and serves the upload form.

use anyhow::{Context, Result};
use clap::Parser;
use reportlens::{web, AnalysisConfig};
use std::io;
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Serve on the default address
  export GEMINI_API_KEY=AIza...
  reportlens

  # Custom address and model
  reportlens --addr 0.0.0.0:9000 --model gemini-2.0-flash

  # Cap prompt size for providers with small input limits
  reportlens --max-prompt-chars 30000

ROUTES:
  GET  /             upload form
  POST /analyze      multipart form upload, HTML result
  POST /api/analyze  multipart upload, JSON result

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY    Google Gemini API key. Without it the server still
                    starts, but every analysis fails with a clear error.

SETUP:
  1. Set API key:   export GEMINI_API_KEY=AIza...
  2. Serve:         reportlens
  3. Open:          http://127.0.0.1:8080/
"#;

/// Analyze medical reports (PDF or image) with a hosted LLM.
#[derive(Parser, Debug)]
#[command(
    name = "reportlens",
    version,
    about = "Analyze medical reports (PDF or image) with a hosted LLM",
    long_about = "Serves a single-page form that accepts a medical report (PDF, JPEG, or PNG), \
extracts its text, and asks Google Gemini for a six-section analysis. Nothing is persisted; \
each upload is processed and discarded.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Address to bind the web server to.
    #[arg(long, env = "REPORTLENS_ADDR", default_value = "127.0.0.1:8080")]
    addr: SocketAddr,

    /// Gemini API key. Read from the environment at startup.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Model identifier.
    #[arg(long, env = "REPORTLENS_MODEL", default_value = reportlens::DEFAULT_MODEL)]
    model: String,

    /// Per-completion-call timeout in seconds.
    #[arg(long, env = "REPORTLENS_API_TIMEOUT", default_value_t = 30)]
    api_timeout: u64,

    /// Retries on transient completion failures.
    #[arg(long, env = "REPORTLENS_MAX_RETRIES", default_value_t = 2)]
    max_retries: u32,

    /// Maximum upload size in bytes.
    #[arg(long, env = "REPORTLENS_MAX_UPLOAD_BYTES", default_value_t = 20 * 1024 * 1024)]
    max_upload_bytes: usize,

    /// Maximum prompt length in characters (unlimited when unset).
    #[arg(long, env = "REPORTLENS_MAX_PROMPT_CHARS")]
    max_prompt_chars: Option<usize>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "REPORTLENS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "REPORTLENS_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let mut builder = AnalysisConfig::builder()
        .model(cli.model.clone())
        .api_timeout_secs(cli.api_timeout)
        .max_retries(cli.max_retries)
        .max_upload_bytes(cli.max_upload_bytes);

    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key.clone());
    } else {
        tracing::warn!(
            "GEMINI_API_KEY is not set — the server will start, but analyses will fail \
             until a key is configured"
        );
    }
    if let Some(max) = cli.max_prompt_chars {
        builder = builder.max_prompt_chars(max);
    }

    let config = builder.build().context("Invalid configuration")?;

    // ── Serve ────────────────────────────────────────────────────────────
    let app = web::router(config);
    let listener = tokio::net::TcpListener::bind(cli.addr)
        .await
        .with_context(|| format!("Failed to bind {}", cli.addr))?;

    tracing::info!("Listening on http://{}", cli.addr);
    axum::serve(listener, app)
        .await
        .context("Server terminated unexpectedly")?;

    Ok(())
}
