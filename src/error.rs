//! Error types for the pdf-invoice-extract library.
//!
//! A single enum, [`InvoiceError`], covers every failure in the pipeline.
//! Variants fall into four classes that callers treat differently:
//!
//! * **Validation**: the upload itself is wrong (not a PDF, no file).
//!   Client-correctable; surfaced before any model call is made.
//!
//! * **External dependency**: the model call failed (transport, auth,
//!   quota, API error) or ran past the configured timeout. Never retried
//!   here; a timeout is reported separately so callers can retry it.
//!
//! * **Extraction**: the model answered but its text is not usable JSON,
//!   or a field holds a value of the wrong type. The raw text is logged but
//!   never placed in the error message.
//!
//! * **Startup**: configuration problems that must stop the process before
//!   it serves anything (missing API key, unknown provider).
//!
//! [`InvoiceError::kind`] exposes the class as a stable string used in HTTP
//! error bodies.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the pdf-invoice-extract library.
#[derive(Debug, Error)]
pub enum InvoiceError {
    // ── Validation errors ────────────────────────────────────────────────
    /// Declared content type of the upload is not `application/pdf`.
    #[error("Only PDF files are supported (got content type '{content_type}')")]
    UnsupportedContentType { content_type: String },

    /// The multipart form did not carry the expected file field.
    #[error("Missing required file field '{field}'")]
    MissingFile { field: String },

    /// The multipart body could not be read.
    #[error("Malformed multipart request: {0}")]
    Multipart(String),

    // ── Model errors ─────────────────────────────────────────────────────
    /// The model API returned a non-success response.
    #[error("Model API error ({status}): {message}")]
    ModelApi { status: u16, message: String },

    /// The model API rejected the credentials (401/403).
    #[error("Authentication error from model provider '{provider}': {detail}")]
    ModelAuth { provider: String, detail: String },

    /// The model API returned HTTP 429.
    #[error("Rate limit exceeded for model provider '{provider}'")]
    ModelRateLimited {
        provider: String,
        retry_after_secs: Option<u64>,
    },

    /// The request never produced an HTTP response (DNS, TLS, reset, …).
    #[error("Model request failed: {0}")]
    ModelTransport(String),

    /// The model call did not finish within the configured timeout.
    #[error("Model call timed out after {secs}s")]
    ModelTimeout { secs: u64 },

    // ── Extraction errors ────────────────────────────────────────────────
    /// Neither the `{…}` span nor the whole reply parsed as JSON.
    ///
    /// `reason` is the parser's message; it is logged, not displayed.
    #[error("Failed to parse invoice data")]
    ParseFailure { reason: String },

    /// A mapped field holds a value that cannot be coerced to its type.
    #[error("Invalid value for field '{field}': expected {expected}")]
    InvalidField {
        field: String,
        expected: &'static str,
    },

    // ── Startup errors ───────────────────────────────────────────────────
    /// `ANTHROPIC_API_KEY` (or the configured key) is absent or empty.
    #[error("Model API key is not set.\nSet the '{var}' environment variable.")]
    MissingApiKey { var: String },

    /// The named provider could not be constructed.
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── I/O errors ───────────────────────────────────────────────────────
    /// Could not create or write the scratch copy of an upload.
    #[error("Failed to write scratch file in '{dir}': {source}")]
    Scratch {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl InvoiceError {
    /// Stable classification string, used as `error_type` in HTTP bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnsupportedContentType { .. } | Self::MissingFile { .. } | Self::Multipart(_) => {
                "validation"
            }
            Self::ModelApi { .. }
            | Self::ModelAuth { .. }
            | Self::ModelRateLimited { .. }
            | Self::ModelTransport(_) => "model_error",
            Self::ModelTimeout { .. } => "model_timeout",
            Self::ParseFailure { .. } => "parse_failure",
            Self::InvalidField { .. } => "invalid_field",
            Self::MissingApiKey { .. }
            | Self::ProviderNotConfigured { .. }
            | Self::InvalidConfig(_) => "configuration",
            Self::Scratch { .. } | Self::Internal(_) => "internal",
        }
    }

    /// HTTP status for this error when surfaced by the API.
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            "validation" => 400,
            "model_timeout" => 504,
            _ => 500,
        }
    }

    /// `true` for errors caused by the client's request rather than the server.
    pub fn is_client_error(&self) -> bool {
        self.kind() == "validation"
    }

    /// `true` when repeating the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ModelTimeout { .. } | Self::ModelRateLimited { .. } | Self::ModelTransport(_)
        )
    }
}
