//! Loosely-typed feed rows
//!
//! A `RawRecord` is one parsed CSV line: a mapping from column name to a
//! string/number/boolean cell. Records carry no invariants; every typed
//! accessor applies the "to-value-or-absent" rule so malformed cells become
//! explicit absence at this boundary instead of NaN downstream.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One cell of a raw feed row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Integer(i64),
    Boolean(bool),
    String(String),
    Null,
}

impl CellValue {
    /// Coerce to a finite number; parse failures and non-finite values are absent
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => n.is_finite().then_some(*n),
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            CellValue::Boolean(_) | CellValue::Null => None,
        }
    }

    /// Borrow the cell as a string, when it is one
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Coerce to text the way an identity column is read: numbers format
    /// without a trailing fraction, booleans and nulls are absent
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::String(s) => Some(s.clone()),
            CellValue::Integer(i) => Some(i.to_string()),
            CellValue::Number(n) if n.is_finite() => {
                if n.fract() == 0.0 {
                    Some(format!("{}", *n as i64))
                } else {
                    Some(n.to_string())
                }
            }
            _ => None,
        }
    }

    /// Boolean-like coercion: `true`, `"True"`, `"true"`, `1`, `"1"` are
    /// true, everything else is false
    pub fn is_truthy(&self) -> bool {
        match self {
            CellValue::Boolean(b) => *b,
            CellValue::Number(n) => *n == 1.0,
            CellValue::Integer(i) => *i == 1,
            CellValue::String(s) => matches!(s.as_str(), "true" | "True" | "1"),
            CellValue::Null => false,
        }
    }

    /// Whether the cell carries any value at all
    pub fn is_present(&self) -> bool {
        !matches!(self, CellValue::Null)
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Number(v)
    }
}

impl From<i64> for CellValue {
    fn from(v: i64) -> Self {
        CellValue::Integer(v)
    }
}

impl From<bool> for CellValue {
    fn from(v: bool) -> Self {
        CellValue::Boolean(v)
    }
}

impl From<&str> for CellValue {
    fn from(v: &str) -> Self {
        CellValue::String(v.to_string())
    }
}

impl From<String> for CellValue {
    fn from(v: String) -> Self {
        CellValue::String(v)
    }
}

/// One raw feed row: column name to cell value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord {
    cells: HashMap<String, CellValue>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one cell, replacing any prior value for the column
    pub fn set(&mut self, column: &str, value: impl Into<CellValue>) -> &mut Self {
        self.cells.insert(column.to_string(), value.into());
        self
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells.get(column)
    }

    /// First non-null cell across a synonym chain
    pub fn first_present(&self, columns: &[&str]) -> Option<&CellValue> {
        columns
            .iter()
            .filter_map(|c| self.cells.get(*c))
            .find(|v| v.is_present())
    }

    /// Finite number from one column, or absent
    pub fn number(&self, column: &str) -> Option<f64> {
        self.get(column)?.as_f64()
    }

    /// Finite number from the first synonym that yields one
    pub fn number_any(&self, columns: &[&str]) -> Option<f64> {
        columns.iter().find_map(|c| self.number(c))
    }

    /// Text from one column, or absent
    pub fn text(&self, column: &str) -> Option<String> {
        self.get(column)?.as_text()
    }

    /// Text from the first synonym that yields any
    pub fn text_any(&self, columns: &[&str]) -> Option<String> {
        columns.iter().find_map(|c| self.text(c))
    }

    /// Boolean-like coercion of one column; a missing cell is false
    pub fn truthy(&self, column: &str) -> bool {
        self.get(column).map(CellValue::is_truthy).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_mixed_cells() {
        let json = r#"{"pid": "p01", "stress": 3, "rmssd": 42.5, "valid": true, "note": null}"#;
        let record: RawRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.text("pid"), Some("p01".to_string()));
        assert_eq!(record.number("stress"), Some(3.0));
        assert_eq!(record.number("rmssd"), Some(42.5));
        assert!(record.truthy("valid"));
        assert!(!record.get("note").unwrap().is_present());
    }

    #[test]
    fn test_number_coercion_never_yields_nan() {
        let mut record = RawRecord::new();
        record.set("a", "not-a-number");
        record.set("b", "  7.5 ");
        record.set("c", true);

        assert_eq!(record.number("a"), None);
        assert_eq!(record.number("b"), Some(7.5));
        assert_eq!(record.number("c"), None);
        assert_eq!(record.number("missing"), None);
    }

    #[test]
    fn test_truthy_rule() {
        let mut record = RawRecord::new();
        record.set("a", true);
        record.set("b", "True");
        record.set("c", "true");
        record.set("d", 1i64);
        record.set("e", "1");
        record.set("f", "yes");
        record.set("g", 0i64);

        for col in ["a", "b", "c", "d", "e"] {
            assert!(record.truthy(col), "{col} should be truthy");
        }
        for col in ["f", "g", "missing"] {
            assert!(!record.truthy(col), "{col} should be falsy");
        }
    }

    #[test]
    fn test_first_present_skips_null() {
        let mut record = RawRecord::new();
        record.set("primary", CellValue::Null);
        record.set("fallback", 12i64);

        let cell = record.first_present(&["primary", "fallback"]).unwrap();
        assert_eq!(cell.as_f64(), Some(12.0));
    }

    #[test]
    fn test_numeric_identity_formats_without_fraction() {
        let mut record = RawRecord::new();
        record.set("pid", 3.0);
        assert_eq!(record.text("pid"), Some("3".to_string()));
    }
}
