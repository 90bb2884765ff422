//! Adapter running extraction through an `edgequake_llm::LLMProvider`.
//!
//! The PDF travels as an attachment on the user message, the same way page
//! images do for vision calls. Whether a provider accepts
//! `application/pdf` there is up to the provider; Gemini's inline data does,
//! for example. Use the native [`crate::client::AnthropicClient`] for Claude.

use crate::error::InvoiceError;
use crate::pipeline::llm::{InvoiceModel, ModelReply, ModelRequest};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider, ProviderFactory};
use std::sync::Arc;
use tracing::debug;

/// An [`InvoiceModel`] backed by an edgequake-llm provider.
pub struct ProviderModel {
    provider: Arc<dyn LLMProvider>,
    label: String,
}

impl ProviderModel {
    /// Wrap an already-configured provider.
    pub fn new(provider: Arc<dyn LLMProvider>, label: impl Into<String>) -> Self {
        Self {
            provider,
            label: label.into(),
        }
    }

    /// Create a named provider (`"gemini"`, `"openai"`, …) for `model`.
    ///
    /// The provider reads its own API key from the environment.
    pub fn from_name(provider_name: &str, model: &str) -> Result<Self, InvoiceError> {
        let provider = ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
            InvoiceError::ProviderNotConfigured {
                provider: provider_name.to_string(),
                hint: format!("{e}"),
            }
        })?;
        Ok(Self::new(provider, provider_name))
    }

    fn build_messages(request: &ModelRequest) -> Vec<ChatMessage> {
        let document = ImageData::new(
            request.document.data.clone(),
            request.document.media_type.as_str(),
        );
        vec![
            ChatMessage::system(request.system.as_str()),
            ChatMessage::user_with_images(request.instruction.as_str(), vec![document]),
        ]
    }

    fn build_options(request: &ModelRequest) -> CompletionOptions {
        CompletionOptions {
            temperature: request.temperature,
            max_tokens: Some(request.max_tokens),
            ..Default::default()
        }
    }
}

#[async_trait]
impl InvoiceModel for ProviderModel {
    fn name(&self) -> &str {
        &self.label
    }

    async fn complete(&self, request: &ModelRequest) -> Result<ModelReply, InvoiceError> {
        let messages = Self::build_messages(request);
        let options = Self::build_options(request);
        debug!("{}: sending document via provider chat", self.label);

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| InvoiceError::ModelTransport(format!("{}: {e}", self.label)))?;

        Ok(ModelReply {
            text: response.content,
            input_tokens: response.prompt_tokens as u64,
            output_tokens: response.completion_tokens as u64,
        })
    }
}
