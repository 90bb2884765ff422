//! HTTP server binary for pdf-invoice-extract.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractorConfig` / `ServerConfig` and serves the API router.

use anyhow::{Context, Result};
use clap::Parser;
use pdf_invoice_extract::api::{serve, AppState};
use pdf_invoice_extract::{ExtractorConfig, InvoiceExtractor, PromptProfile, ServerConfig};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Serve on 0.0.0.0:8000 with the Anthropic key from the environment
  export ANTHROPIC_API_KEY=sk-ant-...
  invoice-server

  # Japanese prompts, scratch copies under /tmp/invoices
  invoice-server --profile japanese --scratch-dir /tmp/invoices

  # Analyse an invoice
  curl -F "pdf_file=@invoice.pdf;type=application/pdf" http://localhost:8000/analyze-pdf

ENVIRONMENT VARIABLES:
  ANTHROPIC_API_KEY       Anthropic API key (required for the default backend)
  INVOICE_LLM_PROVIDER    Use an edgequake-llm provider instead (gemini, openai, …)
  RUST_LOG                Log filter, overrides -v / -q

  A .env file in the working directory is loaded at startup unless running
  on AWS Lambda (AWS_LAMBDA_FUNCTION_NAME set).
"#;

/// Extract invoice totals and line items from uploaded PDFs.
#[derive(Parser, Debug)]
#[command(
    name = "invoice-server",
    version,
    about = "HTTP service extracting invoice data from PDFs with a multimodal LLM",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Address to bind.
    #[arg(long, env = "INVOICE_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on.
    #[arg(short, long, env = "INVOICE_PORT", default_value_t = 8000)]
    port: u16,

    /// Model ID.
    #[arg(long, env = "INVOICE_MODEL", default_value = pdf_invoice_extract::config::DEFAULT_MODEL)]
    model: String,

    /// Use an edgequake-llm provider (gemini, openai, …) instead of the native Anthropic client.
    #[arg(long, env = "INVOICE_LLM_PROVIDER")]
    provider: Option<String>,

    /// Anthropic API base URL.
    #[arg(long, env = "INVOICE_BASE_URL")]
    base_url: Option<String>,

    /// Max output tokens per model call.
    #[arg(long, env = "INVOICE_MAX_TOKENS", default_value_t = 4000)]
    max_tokens: usize,

    /// Sampling temperature (0.0–1.0). Provider default when unset.
    #[arg(long, env = "INVOICE_TEMPERATURE")]
    temperature: Option<f32>,

    /// Model call timeout in seconds.
    #[arg(long, env = "INVOICE_TIMEOUT", default_value_t = 120)]
    timeout: u64,

    /// Prompt language profile.
    #[arg(long, env = "INVOICE_PROFILE", value_enum, default_value = "canonical")]
    profile: ProfileArg,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "INVOICE_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Directory for temporary on-disk copies of uploads (removed after each request).
    #[arg(long, env = "INVOICE_SCRATCH_DIR")]
    scratch_dir: Option<PathBuf>,

    /// Comma-separated allowed CORS origins. All origins when unset.
    #[arg(long, env = "INVOICE_CORS_ORIGINS")]
    cors_origins: Option<String>,

    /// Maximum request body size in bytes.
    #[arg(long, env = "INVOICE_MAX_BODY_BYTES", default_value_t = 32 * 1024 * 1024)]
    max_body_bytes: usize,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "INVOICE_VERBOSE")]
    verbose: bool,

    /// Only log warnings and errors.
    #[arg(short, long, env = "INVOICE_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum ProfileArg {
    Canonical,
    Japanese,
}

impl From<ProfileArg> for PromptProfile {
    fn from(v: ProfileArg) -> Self {
        match v {
            ProfileArg::Canonical => PromptProfile::Canonical,
            ProfileArg::Japanese => PromptProfile::Japanese,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    if std::env::var_os("AWS_LAMBDA_FUNCTION_NAME").is_none() {
        allow_missing_env_file(dotenvy::dotenv())?;
    }

    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stdout)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let config = build_config(&cli).await?;
    let extractor = InvoiceExtractor::from_config(config)
        .context("Failed to initialise the model backend")?;
    tracing::info!("Using model backend '{}'", extractor.model_name());

    let server = ServerConfig {
        host: cli.host.clone(),
        port: cli.port,
        cors_origins: cli
            .cors_origins
            .as_deref()
            .map(ServerConfig::parse_origins)
            .unwrap_or_default(),
        max_body_bytes: cli.max_body_bytes,
    };

    // ── Serve ────────────────────────────────────────────────────────────
    serve(AppState::new(Arc::new(extractor)), &server)
        .await
        .context("Server error")?;

    Ok(())
}

/// A missing `.env` is fine; a malformed one is a startup error.
fn allow_missing_env_file<T>(result: dotenvy::Result<T>) -> Result<()> {
    match result {
        Ok(_) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(e).context("Failed to load .env file"),
    }
}

async fn build_config(cli: &Cli) -> Result<ExtractorConfig> {
    let system_prompt = if let Some(ref path) = cli.system_prompt {
        Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read system prompt from {:?}", path))?,
        )
    } else {
        None
    };

    let mut builder = ExtractorConfig::builder()
        .api_key_from_env()
        .model(cli.model.clone())
        .max_tokens(cli.max_tokens)
        .api_timeout_secs(cli.timeout)
        .profile(cli.profile.clone().into());

    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(ref url) = cli.base_url {
        builder = builder.base_url(url.clone());
    }
    if let Some(t) = cli.temperature {
        builder = builder.temperature(t);
    }
    if let Some(prompt) = system_prompt {
        builder = builder.system_prompt(prompt);
    }
    if let Some(ref dir) = cli.scratch_dir {
        builder = builder.scratch_dir(dir.clone());
    }

    builder.build().context("Invalid configuration")
}
