//! API request handlers.

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    Json,
};
use tracing::{debug, info};

use super::{
    error::ApiError,
    types::{AppState, HealthResponse},
};
use crate::error::InvoiceError;
use crate::invoice::InvoiceData;
use crate::pipeline::upload::{check_content_type, PdfUpload, PDF_FIELD};

/// Invoice analysis endpoint handler.
///
/// POST /analyze-pdf
///
/// Accepts multipart form data with a single `pdf_file` part. The part's
/// declared content type is checked before its bytes are read; other parts
/// are ignored.
///
/// # Errors
///
/// - 400 for a non-PDF part, a missing `pdf_file` or an unreadable body
/// - 413 when the body exceeds the configured limit
/// - 500 when the model fails or its reply cannot be mapped
/// - 504 when the model call times out
pub async fn analyze_pdf_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<InvoiceData>, ApiError> {
    let mut multipart = multipart.map_err(|rejection| {
        ApiError::with_status(
            rejection.status(),
            InvoiceError::Multipart(rejection.body_text()),
        )
    })?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().unwrap_or("").to_string();
        if field_name != PDF_FIELD || upload.is_some() {
            debug!("Skipping multipart field '{}'", field_name);
            continue;
        }

        let content_type = field.content_type().map(|s| s.to_string());
        check_content_type(content_type.as_deref())?;

        let file_name = field.file_name().map(|s| s.to_string());
        let data = field.bytes().await.map_err(multipart_error)?;
        upload = Some(PdfUpload::new(file_name, content_type, data.to_vec()));
    }

    let upload = upload.ok_or_else(|| InvoiceError::MissingFile {
        field: PDF_FIELD.to_string(),
    })?;

    let data = state.extractor.analyze(upload).await?;
    Ok(Json(data))
}

/// Health check endpoint handler.
///
/// GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    info!("Health check requested");
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}

fn multipart_error(e: MultipartError) -> ApiError {
    let status = match e.status() {
        StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
        _ => StatusCode::BAD_REQUEST,
    };
    ApiError::with_status(status, InvoiceError::Multipart(e.body_text()))
}
