//! Integration tests for the analysis pipeline and the web layer.
//!
//! No network and no fixture files: test PDFs are constructed in memory
//! with lopdf, test images with the `image` crate, and the remote model is
//! a scripted fake injected through `AnalysisConfig::client`.

use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use reportlens::{
    analyze, AnalysisConfig, AnalysisError, CompletionClient, MediaType, UploadedFile,
    IMAGE_PLACEHOLDER_TEXT,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ── Test helpers ─────────────────────────────────────────────────────────

/// Build a minimal text-bearing PDF, one Tj operation per page.
fn make_pdf(pages: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![100.into(), 600.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode page content"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("serialise test PDF");
    buf
}

/// Encode a tiny solid-colour PNG.
fn make_png() -> Vec<u8> {
    use image::{DynamicImage, Rgba, RgbaImage};
    let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(6, 6, Rgba([10, 20, 30, 255])));
    let mut buf = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
        .expect("encode test PNG");
    buf
}

/// Fake remote model: counts calls, pops one scripted result per call.
struct FakeClient {
    calls: AtomicUsize,
    script: Vec<Result<String, &'static str>>,
}

impl FakeClient {
    fn ok(text: &str) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            script: vec![Ok(text.to_string())],
        })
    }

    fn scripted(script: Vec<Result<String, &'static str>>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            script,
        })
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionClient for FakeClient {
    async fn complete(&self, _prompt: &str) -> Result<String, AnalysisError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script.get(n).or_else(|| self.script.last()) {
            Some(Ok(text)) => Ok(text.clone()),
            Some(Err("network")) => Err(AnalysisError::Network {
                detail: "connection reset".into(),
            }),
            Some(Err("auth")) => Err(AnalysisError::AuthFailed {
                status: 401,
                detail: "invalid key".into(),
            }),
            Some(Err(other)) => Err(AnalysisError::Internal((*other).into())),
            None => unreachable!(),
        }
    }
}

fn config_with(client: Arc<FakeClient>) -> AnalysisConfig {
    AnalysisConfig::builder()
        .client(client)
        .retry_backoff_ms(1)
        .build()
        .unwrap()
}

// ── Pipeline tests ───────────────────────────────────────────────────────

#[tokio::test]
async fn single_page_pdf_text_reaches_the_output() {
    let client = FakeClient::ok("Some non-empty analysis.");
    let pdf = make_pdf(&["BP 120/80, Glucose 95 mg/dL"]);
    let file = UploadedFile::new(pdf, MediaType::Pdf);

    let output = analyze(Some(file), &config_with(client.clone())).await.unwrap();

    assert!(output.extracted_text.contains("BP 120/80, Glucose 95 mg/dL"));
    assert_eq!(output.analysis, "Some non-empty analysis.");
    assert_eq!(client.call_count(), 1);
    assert!(output.stats.prompt_chars > output.extracted_text.chars().count());
}

#[tokio::test]
async fn multi_page_pdf_concatenates_in_document_order() {
    let client = FakeClient::ok("ok");
    let pdf = make_pdf(&["first page alpha", "second page beta", "third page gamma"]);
    let file = UploadedFile::new(pdf, MediaType::Pdf);

    let output = analyze(Some(file), &config_with(client)).await.unwrap();
    let text = &output.extracted_text;

    let a = text.find("first page alpha").expect("page 1 text");
    let b = text.find("second page beta").expect("page 2 text");
    let c = text.find("third page gamma").expect("page 3 text");
    assert!(a < b && b < c, "pages out of order in: {text:?}");
}

#[tokio::test]
async fn image_upload_yields_the_fixed_placeholder() {
    let client = FakeClient::ok("image analysis");
    let file = UploadedFile::new(make_png(), MediaType::Png);

    let output = analyze(Some(file), &config_with(client)).await.unwrap();
    assert_eq!(output.extracted_text, IMAGE_PLACEHOLDER_TEXT);
}

#[tokio::test]
async fn missing_file_makes_no_remote_call() {
    let client = FakeClient::ok("never returned");

    let err = analyze(None, &config_with(client.clone())).await.unwrap_err();

    assert!(matches!(err, AnalysisError::MissingInput));
    assert_eq!(client.call_count(), 0);
}

#[tokio::test]
async fn corrupt_pdf_fails_before_any_remote_call() {
    let client = FakeClient::ok("never returned");
    let file = UploadedFile::new(b"%PDF-1.4 but the rest is garbage".to_vec(), MediaType::Pdf);

    let err = analyze(Some(file), &config_with(client.clone())).await.unwrap_err();

    assert!(
        matches!(err, AnalysisError::CorruptDocument { .. }),
        "got: {err:?}"
    );
    assert_eq!(client.call_count(), 0);
}

#[tokio::test]
async fn non_pdf_bytes_declared_as_pdf_are_rejected_distinctly() {
    let client = FakeClient::ok("never returned");
    let file = UploadedFile::new(b"GIF89a not a pdf at all".to_vec(), MediaType::Pdf);

    let err = analyze(Some(file), &config_with(client.clone())).await.unwrap_err();

    assert!(matches!(err, AnalysisError::NotAPdf { .. }));
    assert_eq!(client.call_count(), 0);
}

#[tokio::test]
async fn page_without_text_fails_extraction() {
    let client = FakeClient::ok("never returned");
    let pdf = make_pdf(&["real content", ""]);
    let file = UploadedFile::new(pdf, MediaType::Pdf);

    let err = analyze(Some(file), &config_with(client.clone())).await.unwrap_err();

    assert!(matches!(err, AnalysisError::EmptyPage { page: 2 }), "got: {err:?}");
    assert_eq!(client.call_count(), 0);
}

#[tokio::test]
async fn completion_failure_surfaces_as_completion_error() {
    let client = FakeClient::scripted(vec![Err("auth")]);
    let file = UploadedFile::new(make_pdf(&["content"]), MediaType::Pdf);

    let err = analyze(Some(file), &config_with(client)).await.unwrap_err();

    assert!(err.is_completion_error(), "got: {err:?}");
    assert!(matches!(err, AnalysisError::AuthFailed { .. }));
}

#[tokio::test]
async fn transient_completion_failures_are_retried() {
    let client = FakeClient::scripted(vec![
        Err("network"),
        Err("network"),
        Ok("recovered analysis".into()),
    ]);
    let file = UploadedFile::new(make_pdf(&["content"]), MediaType::Pdf);

    let output = analyze(Some(file), &config_with(client.clone())).await.unwrap();

    assert_eq!(output.analysis, "recovered analysis");
    assert_eq!(output.stats.retries, 2);
    assert_eq!(client.call_count(), 3);
}

#[tokio::test]
async fn auth_failure_is_not_retried() {
    let client = FakeClient::scripted(vec![Err("auth"), Ok("unreachable".into())]);
    let file = UploadedFile::new(make_pdf(&["content"]), MediaType::Pdf);

    let err = analyze(Some(file), &config_with(client.clone())).await.unwrap_err();

    assert!(matches!(err, AnalysisError::AuthFailed { .. }));
    assert_eq!(client.call_count(), 1);
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let client = FakeClient::ok("never returned");
    let config = AnalysisConfig::builder()
        .client(client.clone())
        .max_upload_bytes(16)
        .build()
        .unwrap();
    let file = UploadedFile::new(make_pdf(&["content"]), MediaType::Pdf);

    let err = analyze(Some(file), &config).await.unwrap_err();

    assert!(matches!(err, AnalysisError::FileTooLarge { .. }));
    assert_eq!(client.call_count(), 0);
}

// ── Web layer tests ──────────────────────────────────────────────────────

#[cfg(feature = "server")]
mod web {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use reportlens::web::router;
    use tower::ServiceExt;

    const BOUNDARY: &str = "reportlens-test-boundary";

    fn multipart_request(
        uri: &str,
        field: &str,
        filename: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; \
                 filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn index_serves_the_upload_form() {
        let app = router(config_with(FakeClient::ok("unused")));
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert!(html.contains(r#"name="report""#));
        assert!(html.contains("Medical Report Analysis Chatbot"));
    }

    #[tokio::test]
    async fn successful_analysis_renders_all_three_states() {
        let client = FakeClient::ok("Looks healthy overall.");
        let app = router(config_with(client));
        let request = multipart_request(
            "/analyze",
            "report",
            "report.pdf",
            "application/pdf",
            &make_pdf(&["BP 120/80, Glucose 95 mg/dL"]),
        );

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let html = body_string(response).await;
        assert!(html.contains("Extracted Text:"));
        assert!(html.contains("Analyzing Report..."));
        assert!(html.contains("Analysis Result"));
        assert!(html.contains("BP 120/80, Glucose 95 mg/dL"));
        assert!(html.contains("Looks healthy overall."));
    }

    #[tokio::test]
    async fn request_without_the_file_field_shows_the_error_state() {
        let client = FakeClient::ok("never returned");
        let app = router(config_with(client.clone()));
        let request = multipart_request("/analyze", "other", "x.pdf", "application/pdf", b"%PDF");

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let html = body_string(response).await;
        assert!(html.contains("Please upload a medical report to continue."));
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn empty_file_part_counts_as_missing() {
        let client = FakeClient::ok("never returned");
        let app = router(config_with(client.clone()));
        let request = multipart_request("/analyze", "report", "", "application/octet-stream", b"");

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn unsupported_declared_type_is_rejected_with_415() {
        let client = FakeClient::ok("never returned");
        let app = router(config_with(client.clone()));
        let request = multipart_request("/analyze", "report", "notes.txt", "text/plain", b"hello");

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn completion_failure_is_not_rendered_as_success() {
        let client = FakeClient::scripted(vec![Err("auth")]);
        let app = router(config_with(client));
        let request = multipart_request(
            "/analyze",
            "report",
            "report.pdf",
            "application/pdf",
            &make_pdf(&["content"]),
        );

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let html = body_string(response).await;
        assert!(!html.contains("Analysis Result"));
        assert!(html.contains("Authentication failed"));
    }

    #[tokio::test]
    async fn json_route_returns_the_output_schema() {
        let client = FakeClient::ok("structured-enough answer");
        let app = router(config_with(client));
        let request = multipart_request(
            "/api/analyze",
            "report",
            "report.pdf",
            "application/pdf",
            &make_pdf(&["Glucose 95 mg/dL"]),
        );

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json: serde_json::Value =
            serde_json::from_str(&body_string(response).await).unwrap();
        assert!(json["extracted_text"]
            .as_str()
            .unwrap()
            .contains("Glucose 95 mg/dL"));
        assert_eq!(json["analysis"], "structured-enough answer");
        assert!(json["stats"]["prompt_chars"].as_u64().unwrap() > 0);
    }

    #[tokio::test]
    async fn json_route_reports_errors_with_stable_codes() {
        let client = FakeClient::ok("never returned");
        let app = router(config_with(client));
        let request = multipart_request("/api/analyze", "other", "", "text/plain", b"");

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json: serde_json::Value =
            serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json["error"]["code"], "MISSING_INPUT");
    }

    #[tokio::test]
    async fn image_upload_shows_the_placeholder_text() {
        let client = FakeClient::ok("image-based analysis");
        let app = router(config_with(client));
        let request =
            multipart_request("/analyze", "report", "scan.png", "image/png", &make_png());

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let html = body_string(response).await;
        assert!(html.contains(IMAGE_PLACEHOLDER_TEXT));
        assert!(html.contains("image-based analysis"));
    }
}
