//! Invoice records returned to callers.
//!
//! Both types are plain data scoped to a single request. Every field is
//! serialised even when `None` so clients always see the full shape with
//! explicit `null`s.

use serde::{Deserialize, Serialize};

/// One line item of an invoice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionItem {
    pub date: Option<String>,
    pub description: Option<String>,
    pub quantity: Option<f64>,
    pub unit_price: Option<f64>,
    pub amount: Option<f64>,
    pub notes: Option<String>,
}

/// Structured extraction result for one invoice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceData {
    pub total_amount: Option<f64>,
    #[serde(default)]
    pub transactions: Vec<TransactionItem>,
}
