//! Locate and parse the JSON object embedded in a model reply.
//!
//! Models rarely answer with bare JSON. Typical replies wrap it in prose
//! ("Here is the extracted data: {…} Let me know…") or in a ```json fence.
//! Taking everything from the first `{` to the last `}` handles both without
//! a grammar. When no such pair exists the whole text is tried as-is, which
//! still accepts a bare JSON literal and produces a parse error otherwise.

use crate::error::InvoiceError;
use serde_json::Value;

/// Return the candidate JSON text inside `reply`.
///
/// The span runs from the first `{` through the last `}`. If either brace
/// is missing, or the last `}` precedes the first `{`, the whole reply is
/// returned.
pub fn locate_json_span(reply: &str) -> &str {
    match (reply.find('{'), reply.rfind('}')) {
        (Some(start), Some(end)) if end > start => &reply[start..=end],
        _ => reply,
    }
}

/// Parse the JSON object embedded in `reply`.
pub fn parse_reply(reply: &str) -> Result<Value, InvoiceError> {
    let candidate = locate_json_span(reply);
    serde_json::from_str(candidate).map_err(|e| InvoiceError::ParseFailure {
        reason: e.to_string(),
    })
}
