//! Field mapping: parsed model JSON → [`InvoiceData`].
//!
//! Depending on the prompt, models label fields either with the canonical
//! lowercase keys (`unit_price`) or with the natural-language labels used in
//! the prompt (`単価`). [`FIELD_ALIASES`] lists, for every canonical field,
//! the keys accepted for it. Lookup walks the aliases in order and takes the
//! first non-null value, so the canonical key wins when both are present.
//!
//! Missing fields become `None`. A value of the wrong type is an error, not a
//! `None`: a string like `"about 3"` in `quantity` means the model misread
//! the document, and returning `null` would hide that.

use crate::error::InvoiceError;
use crate::invoice::{InvoiceData, TransactionItem};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

/// Accepted input keys for one canonical field.
#[derive(Debug, Clone, Copy)]
pub struct FieldAliases {
    pub canonical: &'static str,
    /// Accepted keys in priority order; the canonical key comes first.
    pub aliases: &'static [&'static str],
}

/// The alias table for every field the mapper reads.
pub const FIELD_ALIASES: &[FieldAliases] = &[
    FieldAliases {
        canonical: "total_amount",
        aliases: &["total_amount", "請求総額", "請求金額"],
    },
    FieldAliases {
        canonical: "transactions",
        aliases: &["transactions", "取引明細"],
    },
    FieldAliases {
        canonical: "date",
        aliases: &["date", "日付", "取引日付"],
    },
    FieldAliases {
        canonical: "description",
        aliases: &["description", "内容"],
    },
    FieldAliases {
        canonical: "quantity",
        aliases: &["quantity", "数量"],
    },
    FieldAliases {
        canonical: "unit_price",
        aliases: &["unit_price", "単価"],
    },
    FieldAliases {
        canonical: "amount",
        aliases: &["amount", "金額"],
    },
    FieldAliases {
        canonical: "notes",
        aliases: &["notes", "備考"],
    },
];

/// Accepted keys for `canonical`; empty if the field has no table entry.
pub fn aliases_for(canonical: &str) -> &'static [&'static str] {
    FIELD_ALIASES
        .iter()
        .find(|f| f.canonical == canonical)
        .map(|f| f.aliases)
        .unwrap_or(&[])
}

/// First non-null value among `canonical`'s aliases.
fn lookup<'a>(obj: &'a Map<String, Value>, canonical: &str) -> Option<&'a Value> {
    aliases_for(canonical)
        .iter()
        .filter_map(|key| obj.get(*key))
        .find(|v| !v.is_null())
}

/// Map a parsed model reply onto [`InvoiceData`].
pub fn map_invoice(value: &Value) -> Result<InvoiceData, InvoiceError> {
    let obj = value.as_object().ok_or_else(|| InvoiceError::InvalidField {
        field: "$".to_string(),
        expected: "a JSON object",
    })?;

    let total_amount = coerce_number(lookup(obj, "total_amount"), "total_amount")?;

    let transactions = match lookup(obj, "transactions") {
        None => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| map_transaction(item, i))
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => {
            return Err(InvoiceError::InvalidField {
                field: "transactions".to_string(),
                expected: "an array",
            })
        }
    };

    Ok(InvoiceData {
        total_amount,
        transactions,
    })
}

fn map_transaction(item: &Value, index: usize) -> Result<TransactionItem, InvoiceError> {
    let obj = item.as_object().ok_or_else(|| InvoiceError::InvalidField {
        field: format!("transactions[{index}]"),
        expected: "an object",
    })?;
    let path = |name: &str| format!("transactions[{index}].{name}");

    Ok(TransactionItem {
        date: coerce_string(lookup(obj, "date"), &path("date"))?,
        description: coerce_string(lookup(obj, "description"), &path("description"))?,
        quantity: coerce_number(lookup(obj, "quantity"), &path("quantity"))?,
        unit_price: coerce_number(lookup(obj, "unit_price"), &path("unit_price"))?,
        amount: coerce_number(lookup(obj, "amount"), &path("amount"))?,
        notes: coerce_string(lookup(obj, "notes"), &path("notes"))?,
    })
}

fn coerce_string(value: Option<&Value>, field: &str) -> Result<Option<String>, InvoiceError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(_) => Err(InvoiceError::InvalidField {
            field: field.to_string(),
            expected: "a string",
        }),
    }
}

fn coerce_number(value: Option<&Value>, field: &str) -> Result<Option<f64>, InvoiceError> {
    let invalid = || InvoiceError::InvalidField {
        field: field.to_string(),
        expected: "a number",
    };
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_f64().map(Some).ok_or_else(invalid),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => parse_amount(s).map(Some).ok_or_else(invalid),
        Some(_) => Err(invalid()),
    }
}

static RE_AMOUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(-)?\s*[¥￥$€£]?\s*(-)?\s*([0-9]{1,3}(?:,[0-9]{3})+|[0-9]+)(\.[0-9]+)?\s*円?\s*$",
    )
    .unwrap()
});

/// Parse a numeric string as written on invoices.
///
/// Accepts an optional sign, one leading currency symbol, comma thousands
/// grouping, a decimal fraction and a trailing `円`. Returns `None` for
/// anything else.
pub fn parse_amount(s: &str) -> Option<f64> {
    let caps = RE_AMOUNT.captures(s)?;
    let negative = caps.get(1).is_some() || caps.get(2).is_some();
    let mut digits = caps[3].replace(',', "");
    if let Some(frac) = caps.get(4) {
        digits.push_str(frac.as_str());
    }
    let n: f64 = digits.parse().ok()?;
    Some(if negative { -n } else { n })
}
