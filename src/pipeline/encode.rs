//! Document encoding: raw PDF bytes → base64 [`DocumentPayload`].
//!
//! Multimodal APIs take documents as base64 strings embedded in the JSON
//! request body. Standard (padded) base64 is what every provider accepts.

use crate::pipeline::upload::PDF_MEDIA_TYPE;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

/// A base64-encoded document with its media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPayload {
    pub data: String,
    pub media_type: String,
}

/// Encode a PDF for the model request.
pub fn encode_document(bytes: &[u8]) -> DocumentPayload {
    let data = STANDARD.encode(bytes);
    debug!("Encoded document: {} bytes → {} bytes base64", bytes.len(), data.len());
    DocumentPayload {
        data,
        media_type: PDF_MEDIA_TYPE.to_string(),
    }
}
