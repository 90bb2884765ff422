//! Configuration types for invoice extraction and the HTTP server.
//!
//! Extraction behaviour is controlled through [`ExtractorConfig`], built via
//! its [`ExtractorConfigBuilder`]. The server-only knobs (bind address, CORS,
//! body limit) live in [`ServerConfig`] so the extractor can be embedded in
//! other hosts without dragging HTTP settings along.
//!
//! Both are constructed once at startup and shared immutably with every
//! request.

use crate::error::InvoiceError;
use crate::prompts::PromptProfile;
use std::fmt;
use std::path::PathBuf;

/// Environment variable holding the Anthropic API key.
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "claude-3-7-sonnet-20250219";

/// Default Anthropic API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Configuration for an [`crate::InvoiceExtractor`].
///
/// # Example
/// ```rust
/// use pdf_invoice_extract::{ExtractorConfig, PromptProfile};
///
/// let config = ExtractorConfig::builder()
///     .api_key("sk-ant-test")
///     .max_tokens(2000)
///     .profile(PromptProfile::Japanese)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_tokens, 2000);
/// ```
#[derive(Clone)]
pub struct ExtractorConfig {
    /// API key for the native Anthropic backend. Required unless
    /// `provider_name` selects another backend.
    pub api_key: Option<String>,

    /// Model identifier. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// Base URL of the Anthropic API. Default: [`DEFAULT_BASE_URL`].
    pub base_url: String,

    /// edgequake-llm provider name (e.g. "gemini", "openai"). When set the
    /// provider backend is used instead of the native Anthropic client.
    pub provider_name: Option<String>,

    /// Maximum tokens the model may generate. Default: 4000.
    ///
    /// Invoices with dozens of line items run to roughly 2 000 output tokens
    /// of JSON; a truncated reply fails to parse rather than silently losing
    /// rows.
    pub max_tokens: usize,

    /// Sampling temperature. Default: None (provider default).
    pub temperature: Option<f32>,

    /// Upper bound on a single model call, in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Prompt pair sent to the model. Default: [`PromptProfile::Canonical`].
    pub profile: PromptProfile,

    /// Custom system prompt. If None, uses the profile's prompt.
    pub system_prompt: Option<String>,

    /// Directory for per-request scratch copies of uploads. Default: None
    /// (uploads stay in memory).
    pub scratch_dir: Option<PathBuf>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            provider_name: None,
            max_tokens: 4000,
            temperature: None,
            api_timeout_secs: 120,
            profile: PromptProfile::default(),
            system_prompt: None,
            scratch_dir: None,
        }
    }
}

impl fmt::Debug for ExtractorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractorConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("provider_name", &self.provider_name)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("profile", &self.profile)
            .field("system_prompt", &self.system_prompt.as_ref().map(|p| p.len()))
            .field("scratch_dir", &self.scratch_dir)
            .finish()
    }
}

impl ExtractorConfig {
    /// Create a new builder for `ExtractorConfig`.
    pub fn builder() -> ExtractorConfigBuilder {
        ExtractorConfigBuilder {
            config: Self::default(),
        }
    }

    /// The system prompt in effect: the override if set, else the profile's.
    pub fn effective_system_prompt(&self) -> &str {
        self.system_prompt
            .as_deref()
            .unwrap_or_else(|| self.profile.system_prompt())
    }
}

/// Builder for [`ExtractorConfig`].
#[derive(Debug)]
pub struct ExtractorConfigBuilder {
    config: ExtractorConfig,
}

impl ExtractorConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    /// Read the API key from [`API_KEY_ENV`] if present.
    pub fn api_key_from_env(mut self) -> Self {
        self.config.api_key = std::env::var(API_KEY_ENV).ok();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = Some(t.clamp(0.0, 1.0));
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn profile(mut self, profile: PromptProfile) -> Self {
        self.config.profile = profile;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.scratch_dir = Some(dir.into());
        self
    }

    /// Build the configuration, validating constraints.
    ///
    /// A missing API key is only an error for the native Anthropic backend;
    /// provider backends read their own keys.
    pub fn build(self) -> Result<ExtractorConfig, InvoiceError> {
        let c = &self.config;
        if c.provider_name.is_none() && c.api_key.as_deref().is_none_or(|k| k.trim().is_empty()) {
            return Err(InvoiceError::MissingApiKey {
                var: API_KEY_ENV.to_string(),
            });
        }
        if c.max_tokens == 0 {
            return Err(InvoiceError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.api_timeout_secs == 0 {
            return Err(InvoiceError::InvalidConfig(
                "api_timeout_secs must be ≥ 1".into(),
            ));
        }
        if c.model.trim().is_empty() {
            return Err(InvoiceError::InvalidConfig("model must not be empty".into()));
        }
        if let Some(dir) = &c.scratch_dir {
            if !dir.is_dir() {
                return Err(InvoiceError::InvalidConfig(format!(
                    "scratch directory '{}' does not exist",
                    dir.display()
                )));
            }
        }
        Ok(self.config)
    }
}

/// HTTP server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins. Empty means any origin.
    pub cors_origins: Vec<String>,
    /// Maximum request body size in bytes. Default: 32 MB.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: Vec::new(),
            max_body_bytes: 32 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    /// Parse a comma-separated origin list, dropping blanks.
    pub fn parse_origins(list: &str) -> Vec<String> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
