//! Model interaction: the [`InvoiceModel`] seam and the bounded call.
//!
//! The extractor never talks to a provider SDK directly. It builds a
//! [`ModelRequest`] and hands it to whatever `Arc<dyn InvoiceModel>` it was
//! constructed with: the native Anthropic client, the edgequake-llm
//! adapter, or a stub in tests.
//!
//! ## No retries
//!
//! The first failure is terminal for the request. The only policy applied
//! here is a timeout, reported as [`InvoiceError::ModelTimeout`] so callers
//! can tell it apart from a hard failure.

use crate::config::ExtractorConfig;
use crate::error::InvoiceError;
use crate::pipeline::encode::DocumentPayload;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

/// Everything the model needs for one extraction.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub system: String,
    pub document: DocumentPayload,
    pub instruction: String,
    pub max_tokens: usize,
    pub temperature: Option<f32>,
}

impl ModelRequest {
    /// Build the request for `document` from the extractor config.
    pub fn for_document(document: DocumentPayload, config: &ExtractorConfig) -> Self {
        Self {
            system: config.effective_system_prompt().to_string(),
            document,
            instruction: config.profile.user_instruction().to_string(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }
}

/// The model's free-text answer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelReply {
    pub text: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl ModelReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// A multimodal model able to read a PDF and answer in text.
#[async_trait]
pub trait InvoiceModel: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Send one request and return the reply text.
    async fn complete(&self, request: &ModelRequest) -> Result<ModelReply, InvoiceError>;
}

/// Call `model` once, bounded by `timeout_secs`.
pub async fn call_model(
    model: &Arc<dyn InvoiceModel>,
    request: &ModelRequest,
    timeout_secs: u64,
) -> Result<ModelReply, InvoiceError> {
    let start = Instant::now();
    match timeout(Duration::from_secs(timeout_secs), model.complete(request)).await {
        Ok(Ok(reply)) => {
            debug!(
                "{}: {} input tokens, {} output tokens, {:?}",
                model.name(),
                reply.input_tokens,
                reply.output_tokens,
                start.elapsed()
            );
            Ok(reply)
        }
        Ok(Err(e)) => {
            warn!("{}: call failed after {:?}: {}", model.name(), start.elapsed(), e);
            Err(e)
        }
        Err(_) => {
            warn!("{}: call timed out after {}s", model.name(), timeout_secs);
            Err(InvoiceError::ModelTimeout { secs: timeout_secs })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::encode::encode_document;

    struct Slow;

    #[async_trait]
    impl InvoiceModel for Slow {
        fn name(&self) -> &str {
            "slow"
        }

        async fn complete(&self, _request: &ModelRequest) -> Result<ModelReply, InvoiceError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(ModelReply::text("{}"))
        }
    }

    struct Failing;

    #[async_trait]
    impl InvoiceModel for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        async fn complete(&self, _request: &ModelRequest) -> Result<ModelReply, InvoiceError> {
            Err(InvoiceError::ModelTransport("connection reset".into()))
        }
    }

    fn request() -> ModelRequest {
        let config = ExtractorConfig::builder().api_key("k").build().unwrap();
        ModelRequest::for_document(encode_document(b"%PDF"), &config)
    }

    #[test]
    fn request_uses_config() {
        let r = request();
        assert_eq!(r.max_tokens, 4000);
        assert_eq!(r.document.media_type, "application/pdf");
        assert!(r.system.contains("total_amount"));
        assert!(r.instruction.contains("JSON"));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_maps_to_model_timeout() {
        let model: Arc<dyn InvoiceModel> = Arc::new(Slow);
        let err = call_model(&model, &request(), 5).await.unwrap_err();
        assert!(matches!(err, InvoiceError::ModelTimeout { secs: 5 }));
    }

    #[tokio::test]
    async fn errors_pass_through() {
        let model: Arc<dyn InvoiceModel> = Arc::new(Failing);
        let err = call_model(&model, &request(), 5).await.unwrap_err();
        assert!(matches!(err, InvoiceError::ModelTransport(_)));
    }
}
