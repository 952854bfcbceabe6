//! Web presentation layer: the upload form and the rendered result.
//!
//! Three routes, no session state:
//!
//! * `GET /` — the upload form
//! * `POST /analyze` — multipart upload → server-rendered result page
//! * `POST /api/analyze` — same pipeline, JSON in/out for programmatic use
//!
//! The HTML mirrors the observable states of the original demo: the
//! extracted-text block, a static "Analyzing Report..." indicator, and the
//! completion under an "Analysis Result" heading; a request without a file
//! renders an inline error and triggers no extraction and no remote call.
//! All user-derived text is escaped before it reaches the page.
//!
//! Handlers own the error translation: every [`AnalysisError`] maps to an
//! HTTP status and, for the JSON route, a stable error code — raw internal
//! errors never leak into a response.

use crate::analyze::analyze;
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::report::{MediaType, UploadedFile};
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

/// Name of the multipart file field.
const UPLOAD_FIELD: &str = "report";

/// Shared state: the immutable analysis configuration.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AnalysisConfig>,
}

/// Build the application router.
pub fn router(config: AnalysisConfig) -> Router {
    // Allow some slack over the upload cap for multipart framing; the
    // acceptor enforces the precise per-file bound.
    let body_limit = config.max_upload_bytes + 64 * 1024;
    let state = AppState {
        config: Arc::new(config),
    };

    Router::new()
        .route("/", get(index))
        .route("/analyze", post(analyze_form))
        .route("/api/analyze", post(analyze_json))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

// ── Handlers ─────────────────────────────────────────────────────────────

async fn index() -> Html<String> {
    Html(render_index())
}

async fn analyze_form(State(state): State<AppState>, multipart: Multipart) -> Response {
    let file = match read_upload(multipart).await {
        Ok(file) => file,
        Err(e) => return error_page(&e),
    };

    match analyze(file, &state.config).await {
        Ok(output) => Html(render_result(&output.extracted_text, &output.analysis)).into_response(),
        Err(e) => error_page(&e),
    }
}

async fn analyze_json(State(state): State<AppState>, multipart: Multipart) -> Response {
    let file = match read_upload(multipart).await {
        Ok(file) => file,
        Err(e) => return error_json(&e),
    };

    match analyze(file, &state.config).await {
        Ok(output) => Json(output).into_response(),
        Err(e) => error_json(&e),
    }
}

/// Pull the `report` field out of the multipart body.
///
/// Returns `Ok(None)` when the request carries no usable file — including
/// the empty part browsers submit when the picker was left blank — so the
/// pipeline can fail with its defined missing-input error.
async fn read_upload(mut multipart: Multipart) -> Result<Option<UploadedFile>, AnalysisError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AnalysisError::MalformedUpload {
            detail: e.to_string(),
        })?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let declared = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AnalysisError::MalformedUpload {
                detail: e.to_string(),
            })?;

        if bytes.is_empty() {
            return Ok(None);
        }

        let declared = declared.unwrap_or_default();
        let media_type = MediaType::from_declared(&declared)
            .ok_or(AnalysisError::UnsupportedMediaType { declared })?;

        return Ok(Some(UploadedFile::new(bytes.to_vec(), media_type)));
    }

    Ok(None)
}

// ── Error translation ────────────────────────────────────────────────────

/// HTTP status for each error class.
fn http_status(err: &AnalysisError) -> StatusCode {
    match err {
        AnalysisError::MissingInput | AnalysisError::MalformedUpload { .. } => {
            StatusCode::BAD_REQUEST
        }
        AnalysisError::UnsupportedMediaType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        AnalysisError::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        AnalysisError::NotAPdf { .. }
        | AnalysisError::CorruptDocument { .. }
        | AnalysisError::EmptyPage { .. }
        | AnalysisError::ImageDecodeFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        AnalysisError::MissingApiKey | AnalysisError::RateLimited { .. } => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        AnalysisError::ApiTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        AnalysisError::AuthFailed { .. }
        | AnalysisError::Network { .. }
        | AnalysisError::ApiError { .. }
        | AnalysisError::InvalidResponse { .. }
        | AnalysisError::EmptyCompletion => StatusCode::BAD_GATEWAY,
        AnalysisError::InvalidConfig(_) | AnalysisError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Stable machine-readable code for the JSON route.
fn error_code(err: &AnalysisError) -> &'static str {
    match err {
        AnalysisError::MissingInput => "MISSING_INPUT",
        AnalysisError::UnsupportedMediaType { .. } => "UNSUPPORTED_MEDIA_TYPE",
        AnalysisError::FileTooLarge { .. } => "FILE_TOO_LARGE",
        AnalysisError::MalformedUpload { .. } => "MALFORMED_UPLOAD",
        AnalysisError::NotAPdf { .. } => "NOT_A_PDF",
        AnalysisError::CorruptDocument { .. } => "CORRUPT_DOCUMENT",
        AnalysisError::EmptyPage { .. } => "EMPTY_PAGE",
        AnalysisError::ImageDecodeFailed { .. } => "IMAGE_DECODE_FAILED",
        AnalysisError::MissingApiKey => "MISSING_API_KEY",
        AnalysisError::AuthFailed { .. } => "AUTH_FAILED",
        AnalysisError::RateLimited { .. } => "RATE_LIMITED",
        AnalysisError::ApiTimeout { .. } => "API_TIMEOUT",
        AnalysisError::Network { .. } => "NETWORK",
        AnalysisError::ApiError { .. } => "API_ERROR",
        AnalysisError::InvalidResponse { .. } => "INVALID_RESPONSE",
        AnalysisError::EmptyCompletion => "EMPTY_COMPLETION",
        AnalysisError::InvalidConfig(_) => "INVALID_CONFIG",
        AnalysisError::Internal(_) => "INTERNAL",
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

fn error_page(err: &AnalysisError) -> Response {
    warn!(error = %err, "Request failed");
    (http_status(err), Html(render_error(&err.to_string()))).into_response()
}

fn error_json(err: &AnalysisError) -> Response {
    warn!(error = %err, "API request failed");
    let body = ErrorBody {
        error: ErrorDetail {
            code: error_code(err),
            message: err.to_string(),
        },
    };
    let mut response = (http_status(err), Json(body)).into_response();
    if let AnalysisError::RateLimited {
        retry_after_secs: Some(secs),
    } = err
    {
        if let Ok(val) = HeaderValue::from_str(&secs.to_string()) {
            response.headers_mut().insert("Retry-After", val);
        }
    }
    response
}

// ── HTML rendering ───────────────────────────────────────────────────────

const PAGE_TITLE: &str = "Medical Report Analysis Chatbot";

fn page(body: &str) -> String {
    format!(
        r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{PAGE_TITLE}</title>
<style>
  body {{ font-family: system-ui, sans-serif; background: #f0f2f6; margin: 0; }}
  main {{ max-width: 46rem; margin: 2rem auto; padding: 2rem; background: #fff;
         border-radius: 8px; box-shadow: 0 1px 4px rgba(0,0,0,.1); }}
  h1 {{ font-size: 1.4rem; }}
  pre, .analysis {{ white-space: pre-wrap; word-wrap: break-word; background: #f6f8fa;
         padding: 1rem; border-radius: 6px; }}
  .indicator {{ color: #555; font-style: italic; }}
  .error {{ color: #b00020; background: #fdecea; padding: 1rem; border-radius: 6px; }}
</style>
</head>
<body>
<main>
<h1>{PAGE_TITLE}</h1>
{body}
</main>
</body>
</html>
"#
    )
}

fn render_index() -> String {
    page(
        r#"<p>Upload your medical report (PDF or Image)</p>
<form method="post" action="/analyze" enctype="multipart/form-data">
  <input type="file" name="report" accept="application/pdf,image/jpeg,image/png">
  <button type="submit">Analyze</button>
</form>"#,
    )
}

fn render_result(extracted_text: &str, analysis: &str) -> String {
    page(&format!(
        r#"<h2>Extracted Text:</h2>
<pre>{}</pre>
<p class="indicator">Analyzing Report...</p>
<h2>Analysis Result</h2>
<div class="analysis">{}</div>
<p><a href="/">Analyze another report</a></p>"#,
        escape_html(extracted_text),
        escape_html(analysis),
    ))
}

fn render_error(message: &str) -> String {
    page(&format!(
        r#"<p class="error">{}</p>
<p><a href="/">Back</a></p>"#,
        escape_html(message),
    ))
}

/// Minimal HTML escaping for text interpolated into the page.
fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
