//! Native Anthropic Messages API client.
//!
//! Sends the invoice as a `document` content block:
//!
//! ```text
//! POST {base_url}/v1/messages
//! x-api-key: …
//! anthropic-version: 2023-06-01
//!
//! { "model": …, "max_tokens": …, "system": …,
//!   "messages": [{ "role": "user", "content": [
//!       { "type": "document", "source": { "type": "base64", "media_type": "application/pdf", "data": … } },
//!       { "type": "text", "text": … } ] }] }
//! ```
//!
//! All `text` blocks of the reply are concatenated. HTTP failures are mapped
//! onto [`InvoiceError`] by status: 401/403 → `ModelAuth`, 429 →
//! `ModelRateLimited`, anything else → `ModelApi` with the API's message.

use crate::config::ExtractorConfig;
use crate::error::InvoiceError;
use crate::pipeline::llm::{InvoiceModel, ModelReply, ModelRequest};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

/// Value of the `anthropic-version` header.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

const PROVIDER: &str = "anthropic";

/// HTTP client for the Messages API.
pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl fmt::Debug for AnthropicClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnthropicClient")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl AnthropicClient {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: &str,
    ) -> Result<Self, InvoiceError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| InvoiceError::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            model: model.into(),
            endpoint: format!("{}/v1/messages", base_url.trim_end_matches('/')),
        })
    }

    /// Build from the extractor config; fails if the API key is missing.
    pub fn from_config(config: &ExtractorConfig) -> Result<Self, InvoiceError> {
        let key = config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| InvoiceError::MissingApiKey {
                var: crate::config::API_KEY_ENV.to_string(),
            })?;
        Self::new(key, &config.model, &config.base_url)
    }
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: Vec<ContentBlock<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock<'a> {
    Document { source: DocumentSource<'a> },
    Text { text: &'a str },
}

#[derive(Debug, Serialize)]
struct DocumentSource<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    media_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Default, Deserialize)]
struct Usage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    message: String,
}

fn build_body<'a>(model: &'a str, request: &'a ModelRequest) -> MessagesRequest<'a> {
    MessagesRequest {
        model,
        max_tokens: request.max_tokens,
        temperature: request.temperature,
        system: &request.system,
        messages: vec![Message {
            role: "user",
            content: vec![
                ContentBlock::Document {
                    source: DocumentSource {
                        kind: "base64",
                        media_type: &request.document.media_type,
                        data: &request.document.data,
                    },
                },
                ContentBlock::Text {
                    text: &request.instruction,
                },
            ],
        }],
    }
}

/// Turn a non-success response into the matching error variant.
fn map_status(status: StatusCode, retry_after: Option<u64>, body: &str) -> InvoiceError {
    let message = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(env) if !env.error.message.is_empty() => {
            if env.error.kind.is_empty() {
                env.error.message
            } else {
                format!("{}: {}", env.error.kind, env.error.message)
            }
        }
        _ if body.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
        _ => body.trim().to_string(),
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => InvoiceError::ModelAuth {
            provider: PROVIDER.to_string(),
            detail: message,
        },
        StatusCode::TOO_MANY_REQUESTS => InvoiceError::ModelRateLimited {
            provider: PROVIDER.to_string(),
            retry_after_secs: retry_after,
        },
        _ => InvoiceError::ModelApi {
            status: status.as_u16(),
            message,
        },
    }
}

#[async_trait]
impl InvoiceModel for AnthropicClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn complete(&self, request: &ModelRequest) -> Result<ModelReply, InvoiceError> {
        let body = build_body(&self.model, request);
        debug!(
            "POST {} (model {}, max_tokens {}, document {} bytes base64)",
            self.endpoint,
            self.model,
            request.max_tokens,
            request.document.data.len()
        );

        let response = self
            .http
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| InvoiceError::ModelTransport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            let text = match response.text().await {
                Ok(text) => text,
                Err(e) => {
                    debug!("Could not read error body for status {}: {}", status, e);
                    String::new()
                }
            };
            return Err(map_status(status, retry_after, &text));
        }

        let parsed: MessagesResponse = response.json().await.map_err(|e| InvoiceError::ModelApi {
            status: status.as_u16(),
            message: format!("unexpected response body: {e}"),
        })?;

        if parsed.stop_reason.as_deref() == Some("max_tokens") {
            warn!(
                "Model stopped at max_tokens ({}); reply is likely truncated",
                request.max_tokens
            );
        }

        let text: String = parsed
            .content
            .into_iter()
            .filter_map(|block| match block {
                ResponseBlock::Text { text } => Some(text),
                ResponseBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("");
        let usage = parsed.usage.unwrap_or_default();

        Ok(ModelReply {
            text,
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
        })
    }
}
