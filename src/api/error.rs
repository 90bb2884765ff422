//! Conversion of [`InvoiceError`] into HTTP responses.

use super::types::ErrorResponse;
use crate::error::InvoiceError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, warn};

/// An [`InvoiceError`] on its way out of a handler.
///
/// The status comes from [`InvoiceError::status_code`] unless overridden,
/// which the multipart reader does for bodies over the size limit.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: InvoiceError,
}

impl ApiError {
    pub fn new(error: InvoiceError) -> Self {
        let status =
            StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self { status, error }
    }

    pub fn with_status(status: StatusCode, error: InvoiceError) -> Self {
        Self { status, error }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn error(&self) -> &InvoiceError {
        &self.error
    }
}

impl From<InvoiceError> for ApiError {
    fn from(error: InvoiceError) -> Self {
        Self::new(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!("Request failed ({}): {}", self.status, self.error);
        } else {
            warn!("Request rejected ({}): {}", self.status, self.error);
        }

        let body = ErrorResponse {
            detail: self.error.to_string(),
            error_type: self.error.kind().to_string(),
        };
        (self.status, Json(body)).into_response()
    }
}
