//! Cell values and semantic column types.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A single cell of a [`Table`](super::Table).
///
/// `Missing` is the uniform "no value" marker. It is distinct from zero, the
/// empty string and `false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// No value
    #[default]
    Missing,
    /// Raw or free text
    Text(String),
    /// Whole number
    Integer(i64),
    /// Floating point number (also used for currency amounts)
    Float(f64),
    /// Boolean flag
    Boolean(bool),
    /// Calendar date without a time component
    Date(NaiveDate),
    /// Date and time without a time zone
    DateTime(NaiveDateTime),
}

impl Value {
    /// Builds a value from an optional raw string as produced by a reader.
    ///
    /// `None` becomes [`Value::Missing`]; strings are kept verbatim, including
    /// blank ones, so the normalizer can account for them.
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw {
            Some(s) => Value::Text(s.to_string()),
            None => Value::Missing,
        }
    }

    /// Creates a text value.
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    /// Returns true for the missing marker.
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Returns true when the cell carries no information: missing or
    /// whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Missing => true,
            Value::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Returns the text payload, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Returns the numeric payload as `f64` for integer and float values.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Short name of the variant, used in diagnostics and log fields.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Missing => "missing",
            Value::Text(_) => "text",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Boolean(_) => "boolean",
            Value::Date(_) => "date",
            Value::DateTime(_) => "datetime",
        }
    }

    /// Returns true when this value is a valid representation for a column
    /// of the given semantic type.
    pub fn conforms_to(&self, ty: SemanticType) -> bool {
        match (ty, self) {
            (_, Value::Missing) => true,
            (SemanticType::Integer, Value::Integer(_)) => true,
            (SemanticType::Float | SemanticType::Currency, Value::Float(_) | Value::Integer(_)) => {
                true
            }
            (SemanticType::Boolean, Value::Boolean(_)) => true,
            (SemanticType::Temporal, Value::Date(_) | Value::DateTime(_)) => true,
            (SemanticType::Categorical | SemanticType::FreeText, Value::Text(_)) => true,
            _ => false,
        }
    }

    /// Hashable identity of the value, used for exact-duplicate detection.
    ///
    /// Floats compare by bit pattern after folding `-0.0` into `0.0` and all
    /// NaNs into one canonical NaN.
    pub fn key(&self) -> ValueKey {
        match self {
            Value::Missing => ValueKey::Missing,
            Value::Text(s) => ValueKey::Text(s.clone()),
            Value::Integer(i) => ValueKey::Integer(*i),
            Value::Float(f) => {
                let canonical = if f.is_nan() {
                    f64::NAN
                } else if *f == 0.0 {
                    0.0
                } else {
                    *f
                };
                ValueKey::Float(canonical.to_bits())
            }
            Value::Boolean(b) => ValueKey::Boolean(*b),
            Value::Date(d) => ValueKey::Date(*d),
            Value::DateTime(dt) => ValueKey::DateTime(*dt),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Missing => Ok(()),
            Value::Text(s) => write!(f, "{s}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Missing, Into::into)
    }
}

/// Hashable, totally-ordered identity of a [`Value`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueKey {
    Missing,
    Text(String),
    Integer(i64),
    Float(u64),
    Boolean(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

/// Semantic type inferred for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticType {
    /// Whole numbers
    Integer,
    /// Floating point numbers
    Float,
    /// Monetary amounts parsed from values carrying currency symbols
    Currency,
    /// Boolean flags
    Boolean,
    /// Dates and date-times
    Temporal,
    /// Low-cardinality text
    Categorical,
    /// Unconstrained text
    FreeText,
}

impl SemanticType {
    /// Get the type name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            SemanticType::Integer => "Integer",
            SemanticType::Float => "Float",
            SemanticType::Currency => "Currency",
            SemanticType::Boolean => "Boolean",
            SemanticType::Temporal => "Temporal",
            SemanticType::Categorical => "Categorical",
            SemanticType::FreeText => "FreeText",
        }
    }

    /// Returns true for types whose cells are stored as text.
    pub fn is_textual(&self) -> bool {
        matches!(self, SemanticType::Categorical | SemanticType::FreeText)
    }

    /// Returns true for integer, float and currency columns.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            SemanticType::Integer | SemanticType::Float | SemanticType::Currency
        )
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}
