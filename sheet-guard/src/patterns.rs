//! Cell-level pattern recognition shared by the stages.
//!
//! The header resolver, type coercer and quality scorer all need to answer
//! the same questions about a cell ("does this look like a number?", "is this
//! a date?"). The answers live here so the stages agree with each other.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::Value;

/// Currency symbols stripped before numeric parsing.
pub const CURRENCY_SYMBOLS: &[char] = &['$', '€', '£', '¥', '₹'];

/// Date formats tried in order by [`parse_temporal`].
pub const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d/%m/%Y", "%d.%m.%Y", "%d-%b-%Y", "%b %d, %Y",
    "%B %d, %Y",
];

/// Date-time formats tried in order by [`parse_temporal`].
pub const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Words that commonly appear in column headers.
pub const HEADER_KEYWORDS: &[&str] = &[
    "id", "name", "date", "time", "total", "amount", "qty", "quantity", "price", "cost",
    "sales", "revenue", "count", "number", "code", "type", "category", "status", "description",
    "email", "phone", "address", "city", "country", "region", "state", "year", "month", "day",
    "customer", "product", "item", "order", "value", "score", "rate", "balance", "title",
    "created", "updated",
];

static NUMBER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[+-]?(?:\d{1,3}(?:,\d{3})+|\d+)?(?:\.\d+)?(?:[eE][+-]?\d+)?$")
        .expect("Hard-coded regex pattern should be valid")
});

static ID_CODE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[A-Za-z]{1,6}[-_]?\d{2,}$").expect("Hard-coded regex pattern should be valid")
});

static SYNTHESIZED_NAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^Column_\d+(?:_\d+)?$").expect("Hard-coded regex pattern should be valid")
});

/// Coarse shape of a cell, used where only the family of a value matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueShape {
    Numeric,
    Boolean,
    Temporal,
    Text,
}

impl ValueShape {
    /// Returns true for every shape other than text.
    pub fn is_typed(&self) -> bool {
        !matches!(self, ValueShape::Text)
    }
}

/// A number recognized in a text cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedNumber {
    pub value: f64,
    /// Written without a decimal point or exponent
    pub integral_literal: bool,
    /// A currency symbol was stripped
    pub has_currency: bool,
}

impl ParsedNumber {
    /// Converts to a cell value: `Integer` for integral literals that fit,
    /// `Float` otherwise.
    pub fn to_value(self) -> Value {
        if self.integral_literal && self.value.abs() < i64::MAX as f64 {
            Value::Integer(self.value as i64)
        } else {
            Value::Float(self.value)
        }
    }
}

/// Parses a numeric string, accepting one currency symbol and thousands
/// separators in groups of three.
///
/// Percent signs, units and free text are rejected.
pub fn parse_number(raw: &str) -> Option<ParsedNumber> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let symbol_count = trimmed.chars().filter(|c| CURRENCY_SYMBOLS.contains(c)).count();
    if symbol_count > 1 {
        return None;
    }
    let has_currency = symbol_count == 1;
    let stripped: String = if has_currency {
        trimmed
            .chars()
            .filter(|c| !CURRENCY_SYMBOLS.contains(c))
            .collect::<String>()
            .trim()
            .to_string()
    } else {
        trimmed.to_string()
    };

    if stripped.is_empty() || !stripped.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    if !NUMBER_PATTERN.is_match(&stripped) {
        return None;
    }

    let value: f64 = stripped.replace(',', "").parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(ParsedNumber {
        value,
        integral_literal: !stripped.contains(['.', 'e', 'E']),
        has_currency,
    })
}

/// Parses a boolean token: `true/false`, `yes/no`, `y/n`, `t/f`, `on/off`
/// and `1/0`, case-insensitively.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "yes" | "y" | "t" | "on" | "1" => Some(true),
        "false" | "no" | "n" | "f" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// Returns true for boolean words, excluding the digit tokens `1` and `0`.
pub fn is_boolean_word(raw: &str) -> bool {
    let trimmed = raw.trim();
    !matches!(trimmed, "1" | "0") && parse_bool(trimmed).is_some()
}

/// Parses a date or date-time using the fixed format lists, then RFC 3339
/// (converted to naive UTC).
pub fn parse_temporal(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if trimmed.len() < 6 || !trimmed.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Some(Value::Date(date));
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(Value::DateTime(dt));
        }
    }
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|dt| Value::DateTime(dt.naive_utc()))
}

/// Returns true when the text carries a currency symbol.
pub fn has_currency_symbol(raw: &str) -> bool {
    raw.contains(CURRENCY_SYMBOLS)
}

/// Returns true for identifier codes such as `INV-0042` or `SKU1001`.
pub fn is_id_code(raw: &str) -> bool {
    ID_CODE_PATTERN.is_match(raw.trim())
}

/// Shape of a cell; `None` for missing and blank cells.
///
/// Text is tested as a number first, then as a boolean word, then as a date,
/// so `"1"` is numeric and `"yes"` is boolean.
pub fn shape_of(value: &Value) -> Option<ValueShape> {
    match value {
        Value::Missing => None,
        Value::Integer(_) | Value::Float(_) => Some(ValueShape::Numeric),
        Value::Boolean(_) => Some(ValueShape::Boolean),
        Value::Date(_) | Value::DateTime(_) => Some(ValueShape::Temporal),
        Value::Text(s) if s.trim().is_empty() => None,
        Value::Text(s) => Some(text_shape(s)),
    }
}

fn text_shape(s: &str) -> ValueShape {
    if parse_number(s).is_some() {
        ValueShape::Numeric
    } else if parse_bool(s).is_some() {
        ValueShape::Boolean
    } else if parse_temporal(s).is_some() {
        ValueShape::Temporal
    } else {
        ValueShape::Text
    }
}

/// Returns true for positional labels produced by readers with no header:
/// blank names, all-digit names such as `"3"` and `Unnamed…` labels.
pub fn is_placeholder_name(name: &str) -> bool {
    let trimmed = name.trim();
    trimmed.is_empty()
        || trimmed.bytes().all(|b| b.is_ascii_digit())
        || trimmed.to_lowercase().starts_with("unnamed")
}

/// Returns true for positional fallback names (`Column_3`, `Column_3_1`).
pub fn is_synthesized_name(name: &str) -> bool {
    SYNTHESIZED_NAME_PATTERN.is_match(name)
}

/// Returns true if any word of the text is a known header keyword.
pub fn contains_header_keyword(text: &str) -> bool {
    let lowered = text.to_lowercase();
    lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .any(|word| HEADER_KEYWORDS.contains(&word))
}

/// Cleans a header cell into a column name: newlines become spaces, the
/// result is trimmed, characters other than alphanumerics, `_`, `-` and
/// space become `_`, and the name is cut to `max_len` characters.
pub fn clean_header_name(raw: &str, max_len: usize) -> String {
    raw.replace(['\r', '\n'], " ")
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '_' | '-' | ' ') {
                c
            } else {
                '_'
            }
        })
        .take(max_len)
        .collect::<String>()
        .trim()
        .to_string()
}
