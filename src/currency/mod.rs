//! Currency codes, quick-entry aliases, and amount formatting.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Upper-cased currency code such as `DZD`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct CurrencyCode(pub String);

impl CurrencyCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        Self::new("DZD")
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Local spellings mapped onto canonical codes.
const ALIASES: &[(&str, &str)] = &[("DA", "DZD"), ("DINAR", "DZD"), ("DINARS", "DZD")];

/// Interprets `token` as a currency when it names one of `accepted` (or an alias
/// of one). Returns `None` for anything else so callers can treat the token as
/// the start of a note.
pub fn parse_currency(token: &str, accepted: &[CurrencyCode]) -> Option<CurrencyCode> {
    let upper = token.trim().to_uppercase();
    let canonical = ALIASES
        .iter()
        .find(|(alias, _)| *alias == upper)
        .map(|(_, code)| (*code).to_string())
        .unwrap_or(upper);
    accepted
        .iter()
        .find(|code| code.as_str() == canonical)
        .cloned()
}

/// Largest amount a single transaction may carry.
pub const MAX_AMOUNT: f64 = 1e12;

/// Parses a user-typed amount. Grouping commas and spaces are ignored; values
/// beyond [`MAX_AMOUNT`] are refused.
pub fn parse_amount(input: &str) -> Option<f64> {
    let cleaned: String = input
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | ' ' | '_'))
        .collect();
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && value.abs() <= MAX_AMOUNT)
}

/// Formats the magnitude of `value` with thousands grouping: whole values get
/// no decimals, fractional values get two.
pub fn format_number(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (digits, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if cents == "00" {
        grouped
    } else {
        format!("{}.{}", grouped, cents)
    }
}

/// `1,000 DZD` style rendering of an absolute amount.
pub fn format_amount(value: f64, currency: &CurrencyCode) -> String {
    format!("{} {}", format_number(value), currency)
}
