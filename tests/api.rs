//! Integration tests for the `/analyze-pdf` and `/health` handlers.
//!
//! The router is driven in-process with `tower::ServiceExt::oneshot` and a
//! stub model, so no network or API key is needed.

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use pdf_invoice_extract::api::{create_router, AppState};
use pdf_invoice_extract::{
    ExtractorConfig, InvoiceError, InvoiceExtractor, InvoiceModel, ModelReply, ModelRequest,
    ServerConfig,
};
use serde_json::{json, Value};
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;
use tracing_subscriber::fmt::MakeWriter;

// ── Test helpers ─────────────────────────────────────────────────────────────

const BOUNDARY: &str = "X-INVOICE-BOUNDARY";
const PDF_BYTES: &[u8] = b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog >>\nendobj\n%%EOF\n";

enum Behavior {
    Reply(String),
    Fail(u16, String),
    Hang,
}

struct StubModel {
    behavior: Behavior,
    calls: AtomicUsize,
}

impl StubModel {
    fn replying(text: &str) -> Arc<Self> {
        Self::with(Behavior::Reply(text.to_string()))
    }

    fn with(behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InvoiceModel for StubModel {
    fn name(&self) -> &str {
        "stub"
    }

    async fn complete(&self, _request: &ModelRequest) -> Result<ModelReply, InvoiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Reply(text) => Ok(ModelReply::text(text.clone())),
            Behavior::Fail(status, message) => Err(InvoiceError::ModelApi {
                status: *status,
                message: message.clone(),
            }),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(ModelReply::text("{}"))
            }
        }
    }
}

fn router_with(model: Arc<StubModel>, config: ExtractorConfig, server: &ServerConfig) -> Router {
    let extractor = InvoiceExtractor::new(model, config);
    create_router(AppState::new(Arc::new(extractor)), server)
}

fn router(model: Arc<StubModel>) -> Router {
    let config = ExtractorConfig::builder().api_key("test-key").build().unwrap();
    router_with(model, config, &ServerConfig::default())
}

fn multipart_body(field: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{BOUNDARY}\r\n\
Content-Disposition: form-data; name=\"{field}\"; filename=\"invoice.pdf\"\r\n\
Content-Type: {content_type}\r\n\
\r\n"
    )
    .into_bytes();
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(field: &str, content_type: &str, data: &[u8]) -> Request<Body> {
    let body = multipart_body(field, content_type, data);
    Request::builder()
        .method("POST")
        .uri("/analyze-pdf")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header("content-length", body.len())
        .body(Body::from(body))
        .expect("Failed to build request")
}

fn pdf_request() -> Request<Body> {
    upload_request("pdf_file", "application/pdf", PDF_BYTES)
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.expect("Request failed");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), 1_000_000)
        .await
        .expect("Failed to read body");
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

/// `MakeWriter` collecting formatted log lines in memory.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

// ── Validation ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn non_pdf_upload_is_rejected_without_model_call() {
    let model = StubModel::replying(r#"{"total_amount": 1}"#);
    let request = upload_request("pdf_file", "image/jpeg", b"\xff\xd8\xff\xe0");

    let (status, body) = send(router(model.clone()), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_type"], "validation");
    assert!(body["detail"].as_str().unwrap().contains("PDF"));
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn missing_pdf_field_is_rejected() {
    let model = StubModel::replying("{}");
    let request = upload_request("attachment", "application/pdf", PDF_BYTES);

    let (status, body) = send(router(model.clone()), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("pdf_file"));
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn non_multipart_body_is_rejected() {
    let model = StubModel::replying("{}");
    let request = Request::builder()
        .method("POST")
        .uri("/analyze-pdf")
        .header("content-type", "application/json")
        .body(Body::from("{}"))
        .unwrap();

    let (status, body) = send(router(model.clone()), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_type"], "validation");
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn oversized_body_is_413() {
    let model = StubModel::replying("{}");
    let config = ExtractorConfig::builder().api_key("test-key").build().unwrap();
    let server = ServerConfig {
        max_body_bytes: 1024,
        ..ServerConfig::default()
    };
    let request = upload_request("pdf_file", "application/pdf", &vec![b'x'; 8 * 1024]);

    let response = router_with(model.clone(), config, &server)
        .oneshot(request)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn oversized_body_without_content_length_is_413() {
    let model = StubModel::replying("{}");
    let config = ExtractorConfig::builder().api_key("test-key").build().unwrap();
    let server = ServerConfig {
        max_body_bytes: 1024,
        ..ServerConfig::default()
    };
    let body = multipart_body("pdf_file", "application/pdf", &vec![b'x'; 8 * 1024]);
    let request = Request::builder()
        .method("POST")
        .uri("/analyze-pdf")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header("transfer-encoding", "chunked")
        .body(Body::from(body))
        .unwrap();

    let (status, _) = send(router_with(model.clone(), config, &server), request).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(model.calls(), 0);
}

// ── Successful extraction ────────────────────────────────────────────────────

#[tokio::test]
async fn full_reply_maps_field_for_field() {
    let reply = json!({
        "total_amount": 1650,
        "transactions": [
            {
                "date": "2024-04-01",
                "description": "Consulting",
                "quantity": 3,
                "unit_price": 500,
                "amount": 1500,
                "notes": "April"
            },
            {
                "date": "2024-04-02",
                "description": "Travel",
                "quantity": 1,
                "unit_price": 150,
                "amount": 150,
                "notes": null
            }
        ]
    });
    let model = StubModel::replying(&reply.to_string());

    let (status, body) = send(router(model.clone()), pdf_request()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_amount"], json!(1650.0));
    assert_eq!(body["transactions"].as_array().unwrap().len(), 2);
    let first = &body["transactions"][0];
    assert_eq!(first["date"], "2024-04-01");
    assert_eq!(first["description"], "Consulting");
    assert_eq!(first["quantity"], json!(3.0));
    assert_eq!(first["unit_price"], json!(500.0));
    assert_eq!(first["amount"], json!(1500.0));
    assert_eq!(first["notes"], "April");
    assert_eq!(body["transactions"][1]["notes"], Value::Null);
    assert_eq!(model.calls(), 1);
}

#[tokio::test]
async fn absent_transactions_become_empty_list() {
    let model = StubModel::replying(r#"{"total_amount": 42}"#);

    let (status, body) = send(router(model), pdf_request()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_amount"], json!(42.0));
    assert_eq!(body["transactions"], json!([]));
}

#[tokio::test]
async fn json_inside_prose_is_extracted() {
    let model = StubModel::replying(
        "Here is the extracted data:\n```json\n{\"total_amount\": 100, \"transactions\": []}\n```\nLet me know if you need anything else.",
    );

    let (status, body) = send(router(model), pdf_request()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_amount"], json!(100.0));
}

#[tokio::test]
async fn japanese_keys_are_mapped() {
    let reply = r#"{
        "請求総額": "¥11,000",
        "取引明細": [
            {"日付": "2024/03/15", "内容": "ウェブ制作", "数量": 1, "単価": "10,000円", "金額": 10000, "備考": "税抜"},
            {"取引日付": "2024/03/16", "内容": "消費税", "金額": "1,000"}
        ]
    }"#;
    let model = StubModel::replying(reply);

    let (status, body) = send(router(model), pdf_request()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_amount"], json!(11000.0));
    let items = body["transactions"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["date"], "2024/03/15");
    assert_eq!(items[0]["description"], "ウェブ制作");
    assert_eq!(items[0]["unit_price"], json!(10000.0));
    assert_eq!(items[0]["notes"], "税抜");
    assert_eq!(items[1]["date"], "2024/03/16");
    assert_eq!(items[1]["amount"], json!(1000.0));
    assert_eq!(items[1]["quantity"], Value::Null);
}

#[tokio::test]
async fn repeated_requests_give_identical_output() {
    let model = StubModel::replying(r#"{"total_amount": 7, "transactions": [{"amount": 7}]}"#);
    let app = router(model.clone());

    let (_, first) = send(app.clone(), pdf_request()).await;
    let (_, second) = send(app, pdf_request()).await;

    assert_eq!(first, second);
    assert_eq!(model.calls(), 2);
}

// ── Failures ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn reply_without_json_is_parse_failure_and_logged() {
    let raw = "I'm sorry, but I could not find an invoice in this document.";
    let model = StubModel::replying(raw);
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_max_level(tracing::Level::INFO)
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let (status, body) = send(router(model), pdf_request()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error_type"], "parse_failure");
    assert_eq!(body["detail"], "Failed to parse invoice data");
    assert!(logs.contents().contains(raw), "raw reply missing from logs");
}

#[tokio::test]
async fn wrong_typed_field_is_500() {
    let model = StubModel::replying(r#"{"total_amount": {"value": 3}}"#);

    let (status, body) = send(router(model), pdf_request()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error_type"], "invalid_field");
    assert!(body["detail"].as_str().unwrap().contains("total_amount"));
}

#[tokio::test]
async fn model_error_is_500_with_cause() {
    let model = StubModel::with(Behavior::Fail(529, "overloaded_error: Overloaded".into()));

    let (status, body) = send(router(model), pdf_request()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error_type"], "model_error");
    assert!(body["detail"].as_str().unwrap().contains("Overloaded"));
}

#[tokio::test(start_paused = true)]
async fn model_timeout_is_504() {
    let model = StubModel::with(Behavior::Hang);
    let config = ExtractorConfig::builder()
        .api_key("test-key")
        .api_timeout_secs(5)
        .build()
        .unwrap();

    let (status, body) = send(
        router_with(model.clone(), config, &ServerConfig::default()),
        pdf_request(),
    )
    .await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["error_type"], "model_timeout");
    assert_eq!(model.calls(), 1);
}

// ── Scratch storage ──────────────────────────────────────────────────────────

fn scratch_router(model: Arc<StubModel>, dir: &Path) -> Router {
    let config = ExtractorConfig::builder()
        .api_key("test-key")
        .scratch_dir(dir)
        .build()
        .unwrap();
    router_with(model, config, &ServerConfig::default())
}

#[tokio::test]
async fn scratch_dir_is_empty_after_success_and_failure() {
    let dir = tempfile::tempdir().unwrap();

    let ok = StubModel::replying(r#"{"total_amount": 1}"#);
    let (status, _) = send(scratch_router(ok, dir.path()), pdf_request()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

    let bad = StubModel::replying("no json at all");
    let (status, _) = send(scratch_router(bad, dir.path()), pdf_request()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

    let failing = StubModel::with(Behavior::Fail(500, "api_error: boom".into()));
    let (status, _) = send(scratch_router(failing, dir.path()), pdf_request()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

// ── Health ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_reports_healthy() {
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(router(StubModel::replying("{}")), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "healthy"}));
}
