//! Pipeline stages for PDF invoice extraction.
//!
//! Each submodule implements exactly one transformation step, so each can be
//! tested without the others and without a live model.
//!
//! ## Data Flow
//!
//! ```text
//! upload ──▶ encode ──▶ llm ──▶ json_span ──▶ fields
//! (validate)  (base64)  (model)  (locate+parse) (alias mapping)
//! ```
//!
//! 1. [`upload`] - check the declared content type; optional scratch copy
//! 2. [`encode`] - base64-wrap the PDF for the JSON request body
//! 3. [`llm`] - the [`llm::InvoiceModel`] seam and the bounded call;
//!    the only stage with network I/O
//! 4. [`json_span`] - find the `{…}` span in the reply and parse it
//! 5. [`fields`] - map canonical or natural-language keys onto
//!    [`crate::InvoiceData`]

pub mod encode;
pub mod fields;
pub mod json_span;
pub mod llm;
pub mod upload;
