// Cell values as the assistant sees them
//
// Values only: a formula is a raw string beginning with '='; nothing in
// this workspace evaluates it. The host is the calculator.

use serde::{Deserialize, Serialize};

/// A single cell value: text, number, boolean, or empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Empty,
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// True only for a non-empty text value (header detection).
    pub fn is_nonempty_text(&self) -> bool {
        matches!(self, CellValue::Text(s) if !s.trim().is_empty())
    }

    /// Parse a raw text field (CSV cell, host string value) into a value.
    /// Numbers and TRUE/FALSE are recognized; everything else stays text.
    pub fn from_field(field: &str) -> CellValue {
        let trimmed = field.trim();
        if trimmed.is_empty() {
            return CellValue::Empty;
        }
        if trimmed.eq_ignore_ascii_case("true") {
            return CellValue::Bool(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return CellValue::Bool(false);
        }
        if let Ok(n) = trimmed.parse::<f64>() {
            if n.is_finite() {
                return CellValue::Number(n);
            }
        }
        CellValue::Text(field.to_string())
    }

    /// The value as JSON, for embedding in a context payload.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            CellValue::Text(s) => serde_json::Value::String(s.clone()),
            CellValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            CellValue::Bool(b) => serde_json::Value::Bool(*b),
            CellValue::Empty => serde_json::Value::Null,
        }
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            CellValue::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            CellValue::Empty => Ok(()),
        }
    }
}
