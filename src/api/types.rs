//! API state and response types.

use crate::extract::InvoiceExtractor;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Process-scoped state shared by every request.
///
/// Built once at startup; handlers only read it.
#[derive(Debug, Clone)]
pub struct AppState {
    pub extractor: Arc<InvoiceExtractor>,
}

impl AppState {
    pub fn new(extractor: Arc<InvoiceExtractor>) -> Self {
        Self { extractor }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable message
    pub detail: String,
    /// Error class (`validation`, `model_error`, `model_timeout`, …)
    pub error_type: String,
}
