//! Model backends implementing [`crate::pipeline::llm::InvoiceModel`].
//!
//! * [`anthropic`]: native Messages API client. The default, and the only
//!   backend that sends the PDF as a `document` content block.
//! * [`provider`]: adapter over any `edgequake_llm::LLMProvider`, for
//!   providers whose vision input accepts `application/pdf` inline data.
//!
//! [`build_model`] picks one from an [`ExtractorConfig`].

pub mod anthropic;
pub mod provider;

use crate::config::ExtractorConfig;
use crate::error::InvoiceError;
use crate::pipeline::llm::InvoiceModel;
use std::sync::Arc;

pub use anthropic::AnthropicClient;
pub use provider::ProviderModel;

/// Construct the backend selected by `config`.
///
/// `provider_name` set → [`ProviderModel`]; otherwise [`AnthropicClient`].
pub fn build_model(config: &ExtractorConfig) -> Result<Arc<dyn InvoiceModel>, InvoiceError> {
    match config.provider_name.as_deref() {
        Some(name) => Ok(Arc::new(ProviderModel::from_name(name, &config.model)?)),
        None => Ok(Arc::new(AnthropicClient::from_config(config)?)),
    }
}
