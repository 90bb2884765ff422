//! Upload validation and optional scratch storage.
//!
//! The declared content type is the only gate: anything other than
//! `application/pdf` is rejected before the payload is touched, so a bad
//! upload never reaches the model.
//!
//! ## Scratch files
//!
//! Processing is in-memory. When a scratch directory is configured the
//! upload is additionally written to a [`NamedTempFile`] inside it. The
//! file's name is generated by `tempfile`, never taken from the client, and
//! the file is unlinked when the [`ScratchFile`] guard drops, on every exit
//! path including early `?` returns and panics.

use crate::error::InvoiceError;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// The only accepted media type.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// Multipart field name carrying the PDF.
pub const PDF_FIELD: &str = "pdf_file";

/// An uploaded file held in memory.
#[derive(Debug, Clone)]
pub struct PdfUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl PdfUpload {
    pub fn new(
        file_name: Option<String>,
        content_type: Option<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name,
            content_type,
            bytes: bytes.into(),
        }
    }

    /// Check the declared content type. See [`check_content_type`].
    pub fn validate(&self) -> Result<(), InvoiceError> {
        check_content_type(self.content_type.as_deref())
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// File name for logging; falls back to `"<unnamed>"`.
    pub fn display_name(&self) -> &str {
        self.file_name.as_deref().unwrap_or("<unnamed>")
    }
}

/// `true` if `content_type` denotes a PDF.
///
/// The comparison is on the media-type essence, ASCII case-insensitive;
/// parameters after `;` are ignored.
pub fn is_pdf_media_type(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(str::trim)
        .is_some_and(|essence| essence.eq_ignore_ascii_case(PDF_MEDIA_TYPE))
}

/// Reject anything whose declared content type is not a PDF.
pub fn check_content_type(content_type: Option<&str>) -> Result<(), InvoiceError> {
    match content_type {
        Some(ct) if is_pdf_media_type(ct) => Ok(()),
        Some(ct) if !ct.trim().is_empty() => Err(InvoiceError::UnsupportedContentType {
            content_type: ct.to_string(),
        }),
        _ => Err(InvoiceError::UnsupportedContentType {
            content_type: "<none>".to_string(),
        }),
    }
}

/// A scratch copy of an upload, removed on drop.
pub struct ScratchFile {
    file: NamedTempFile,
}

impl ScratchFile {
    /// Write `bytes` to a fresh file inside `dir`.
    pub fn write(dir: &Path, bytes: &[u8]) -> Result<Self, InvoiceError> {
        let scratch_err = |source| InvoiceError::Scratch {
            dir: dir.to_path_buf(),
            source,
        };
        let mut file = tempfile::Builder::new()
            .prefix("invoice-")
            .suffix(".pdf")
            .tempfile_in(dir)
            .map_err(scratch_err)?;
        file.write_all(bytes).map_err(scratch_err)?;
        file.flush().map_err(scratch_err)?;
        debug!("Wrote scratch copy: {}", file.path().display());
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        debug!("Removing scratch copy: {}", self.file.path().display());
    }
}
