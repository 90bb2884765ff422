//! The invoice extraction handler.
//!
//! [`InvoiceExtractor`] owns the process-scoped pieces (config and model
//! backend) and runs one upload through the pipeline per call. It knows
//! nothing about HTTP, so a long-running server, a serverless entry point
//! or a batch job can all drive it the same way.
//!
//! Every call starts from scratch: the extractor holds no per-request state,
//! so identical inputs with an identical model reply give identical output.

use crate::client::build_model;
use crate::config::ExtractorConfig;
use crate::error::InvoiceError;
use crate::invoice::InvoiceData;
use crate::pipeline::encode::encode_document;
use crate::pipeline::fields::map_invoice;
use crate::pipeline::json_span::parse_reply;
use crate::pipeline::llm::{call_model, InvoiceModel, ModelRequest};
use crate::pipeline::upload::{PdfUpload, ScratchFile};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Runs uploads through validate → encode → model → parse → map.
#[derive(Clone)]
pub struct InvoiceExtractor {
    model: Arc<dyn InvoiceModel>,
    config: ExtractorConfig,
}

impl fmt::Debug for InvoiceExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvoiceExtractor")
            .field("model", &self.model.name())
            .field("config", &self.config)
            .finish()
    }
}

impl InvoiceExtractor {
    /// Use an explicit model backend (a stub in tests, a custom client, …).
    pub fn new(model: Arc<dyn InvoiceModel>, config: ExtractorConfig) -> Self {
        Self { model, config }
    }

    /// Build the backend selected by `config` and wrap it.
    pub fn from_config(config: ExtractorConfig) -> Result<Self, InvoiceError> {
        let model = build_model(&config)?;
        Ok(Self::new(model, config))
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Extract invoice data from one uploaded PDF.
    ///
    /// # Errors
    /// - [`InvoiceError::UnsupportedContentType`] before any model call when
    ///   the upload is not declared as a PDF
    /// - model errors and [`InvoiceError::ModelTimeout`] from the call
    /// - [`InvoiceError::ParseFailure`] / [`InvoiceError::InvalidField`]
    ///   when the reply cannot be turned into [`InvoiceData`]; the raw reply
    ///   is logged, not returned
    pub async fn analyze(&self, upload: PdfUpload) -> Result<InvoiceData, InvoiceError> {
        let start = Instant::now();
        info!(
            "Received upload '{}' ({} bytes, content type {:?})",
            upload.display_name(),
            upload.len(),
            upload.content_type
        );

        if let Err(e) = upload.validate() {
            warn!("Rejected upload '{}': {}", upload.display_name(), e);
            return Err(e);
        }

        // Held until the end of this call; the file is removed on drop.
        let scratch = match &self.config.scratch_dir {
            Some(dir) => {
                let file = ScratchFile::write(dir, &upload.bytes).inspect_err(|e| {
                    error!("Could not write scratch copy: {}", e);
                })?;
                info!("Saved scratch copy: {}", file.path().display());
                Some(file)
            }
            None => None,
        };

        let document = encode_document(&upload.bytes);
        let request = ModelRequest::for_document(document, &self.config);

        info!("Sending PDF to {} for analysis", self.model.name());
        let reply = call_model(&self.model, &request, self.config.api_timeout_secs)
            .await
            .inspect_err(|e| error!("Model call failed: {}", e))?;
        info!("Model response: {}", reply.text);

        let parsed = parse_reply(&reply.text).inspect_err(|e| {
            if let InvoiceError::ParseFailure { reason } = e {
                error!("Failed to parse model response as JSON: {}", reason);
            }
            error!("Text under analysis: {}", reply.text);
        })?;
        debug!("Parsed invoice object: {}", parsed);

        let data = map_invoice(&parsed).inspect_err(|e| {
            error!("Model JSON does not fit the invoice shape: {}", e);
            error!("Text under analysis: {}", reply.text);
        })?;

        drop(scratch);
        info!(
            "Extracted {} transactions (total {:?}) in {:?}",
            data.transactions.len(),
            data.total_amount,
            start.elapsed()
        );
        debug!("Formatted result: {:?}", data);
        Ok(data)
    }
}
