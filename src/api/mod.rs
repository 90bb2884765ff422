//! HTTP surface for invoice extraction.
//!
//! An axum router exposing the extractor to browser and script clients.
//!
//! # Endpoints
//!
//! - `POST /analyze-pdf` - Extract invoice data from one PDF (multipart field `pdf_file`)
//! - `GET /health` - Liveness check
//!
//! # Examples
//!
//! ## Embedding the router in your app
//!
//! ```no_run
//! use pdf_invoice_extract::api::{create_router, AppState};
//! use pdf_invoice_extract::{ExtractorConfig, InvoiceExtractor, ServerConfig};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), pdf_invoice_extract::InvoiceError> {
//! let config = ExtractorConfig::builder().api_key_from_env().build()?;
//! let state = AppState::new(Arc::new(InvoiceExtractor::from_config(config)?));
//! let router = create_router(state, &ServerConfig::default());
//! let app = axum::Router::new().nest("/invoices", router);
//! # let _ = app;
//! # Ok(())
//! # }
//! ```
//!
//! # cURL Examples
//!
//! ```bash
//! curl -F "pdf_file=@invoice.pdf;type=application/pdf" http://localhost:8000/analyze-pdf
//! curl http://localhost:8000/health
//! ```

mod error;
mod handlers;
mod server;
mod types;

pub use error::ApiError;
pub use handlers::{analyze_pdf_handler, health_handler};
pub use server::{create_router, serve};
pub use types::{AppState, ErrorResponse, HealthResponse};
