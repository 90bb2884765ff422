//! Prompts for VLM-based invoice extraction.
//!
//! Every prompt lives here so the wording can change without touching the
//! request or parsing code.
//!
//! Two profiles exist. [`PromptProfile::Japanese`] keeps the wording the
//! service was first deployed with; models answering it often label line
//! item fields in Japanese (`日付`, `金額`, …). [`PromptProfile::Canonical`]
//! asks for the lowercase English keys outright. The field mapper in
//! [`crate::pipeline::fields`] accepts both key sets whichever profile is
//! active.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// English system prompt naming the canonical keys.
pub const CANONICAL_SYSTEM_PROMPT: &str = r#"You are an expert at analysing PDF invoices. Extract the following information from the attached PDF:

1. The total invoiced amount (total_amount)
2. Every transaction line item (transactions), each with:
   - date
   - description
   - quantity
   - unit_price
   - amount
   - notes

Return the result as a single JSON object of the form
{"total_amount": number, "transactions": [{"date": string, "description": string, "quantity": number, "unit_price": number, "amount": number, "notes": string}]}.
Use null for any value that cannot be found."#;

/// English user instruction sent alongside the document.
pub const CANONICAL_USER_INSTRUCTION: &str =
    "Analyse this invoice PDF and extract the invoiced amount and the transaction line items. Return JSON.";

/// Japanese system prompt.
pub const JAPANESE_SYSTEM_PROMPT: &str = "あなたはPDF請求書の解析エキスパートです。アップロードされたPDFから以下の情報を抽出してください：\
1. 請求総額 (total_amount)\
2. 取引明細の各項目 (transactions): 日付、内容、数量、単価、金額、備考\
結果はJSON形式で返してください。情報が見つからない場合はnullを返してください。";

/// Japanese user instruction sent alongside the document.
pub const JAPANESE_USER_INSTRUCTION: &str =
    "この請求書PDFを解析し、請求金額と取引明細の情報を抽出してください。JSONフォーマットで返してください。";

/// Which prompt pair is sent to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptProfile {
    /// English prompts, canonical lowercase keys. (default)
    #[default]
    Canonical,
    /// Japanese prompts; replies may use natural-language keys.
    Japanese,
}

impl PromptProfile {
    pub fn system_prompt(self) -> &'static str {
        match self {
            PromptProfile::Canonical => CANONICAL_SYSTEM_PROMPT,
            PromptProfile::Japanese => JAPANESE_SYSTEM_PROMPT,
        }
    }

    pub fn user_instruction(self) -> &'static str {
        match self {
            PromptProfile::Canonical => CANONICAL_USER_INSTRUCTION,
            PromptProfile::Japanese => JAPANESE_USER_INSTRUCTION,
        }
    }
}

impl fmt::Display for PromptProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptProfile::Canonical => f.write_str("canonical"),
            PromptProfile::Japanese => f.write_str("japanese"),
        }
    }
}

impl FromStr for PromptProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "canonical" | "en" | "english" => Ok(PromptProfile::Canonical),
            "japanese" | "ja" | "jp" => Ok(PromptProfile::Japanese),
            other => Err(format!(
                "unknown prompt profile '{other}' (expected 'canonical' or 'japanese')"
            )),
        }
    }
}
