//! # pdf-invoice-extract
//!
//! Extract invoice totals and line items from PDF uploads using a multimodal
//! LLM.
//!
//! ## Why this crate?
//!
//! Invoices arrive as PDFs with every imaginable layout: scanned paper,
//! spreadsheet exports, Japanese and English headings. Instead of writing a
//! template per vendor, this crate hands the whole PDF to a model that reads
//! documents natively and asks it for a small JSON object. The reply is then
//! parsed leniently and mapped onto a fixed record, tolerating the key names
//! the model tends to use.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF upload
//!  │
//!  ├─ 1. Validate  declared content type must be application/pdf
//!  ├─ 2. Encode    bytes → base64 document block
//!  ├─ 3. Model     one call, bounded by a timeout
//!  ├─ 4. Locate    first '{' … last '}' span of the reply
//!  ├─ 5. Map       alias-tolerant keys → InvoiceData
//!  └─ 6. Respond   JSON body, or a classified error
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_invoice_extract::{ExtractorConfig, InvoiceExtractor, PdfUpload};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads ANTHROPIC_API_KEY
//!     let config = ExtractorConfig::builder().api_key_from_env().build()?;
//!     let extractor = InvoiceExtractor::from_config(config)?;
//!
//!     let bytes = std::fs::read("invoice.pdf")?;
//!     let upload = PdfUpload::new(None, Some("application/pdf".into()), bytes);
//!     let invoice = extractor.analyze(upload).await?;
//!     println!("{}", serde_json::to_string_pretty(&invoice)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `server` | on      | Enables the `invoice-server` binary (clap + anyhow + dotenvy + tracing-subscriber) |
//!
//! Disable `server` when embedding only the library or the router:
//! ```toml
//! pdf-invoice-extract = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod extract;
pub mod invoice;
pub mod pipeline;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use client::{AnthropicClient, ProviderModel};
pub use config::{ExtractorConfig, ExtractorConfigBuilder, ServerConfig};
pub use error::InvoiceError;
pub use extract::InvoiceExtractor;
pub use invoice::{InvoiceData, TransactionItem};
pub use pipeline::llm::{InvoiceModel, ModelReply, ModelRequest};
pub use pipeline::upload::PdfUpload;
pub use prompts::PromptProfile;
