// src/extract/value.rs

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fmt;

use crate::decode;

/// A single cell from an extract, after conversion out of Arrow.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Str(String),
    Date(NaiveDate),
    Bytes(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "."),
            Value::Bytes(b) => {
                for byte in b {
                    write!(f, "{:02X}", byte)?;
                }
                Ok(())
            }
            other => write!(f, "{}", decode::safe_str(other)),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

static NULL: Value = Value::Null;

/// One extract row keyed by upper-cased source column name.
///
/// Reading an absent column gives `Value::Null` rather than an error, the
/// same way a missing variable reads as missing in the mainframe jobs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    values: BTreeMap<String, Value>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, column: &str) -> &Value {
        match self.values.get(column) {
            Some(v) => v,
            None => self
                .values
                .get(&column.to_ascii_uppercase())
                .unwrap_or(&NULL),
        }
    }

    pub fn set(&mut self, column: &str, value: impl Into<Value>) {
        self.values.insert(column.to_ascii_uppercase(), value.into());
    }

    pub fn with(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.set(column, value);
        self
    }

    pub fn int(&self, column: &str) -> i64 {
        decode::safe_int(self.get(column))
    }

    pub fn float(&self, column: &str) -> f64 {
        decode::safe_float(self.get(column))
    }

    pub fn str(&self, column: &str) -> String {
        decode::safe_str(self.get(column))
    }

    pub fn date(&self, column: &str, encoding: decode::DateEncoding) -> Option<NaiveDate> {
        decode::value_date(self.get(column), encoding)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_column_reads_as_null() {
        let row = Row::new().with("ACCTNO", 42i64);
        assert_eq!(row.get("ACCTNO"), &Value::Int(42));
        assert_eq!(row.get("acctno"), &Value::Int(42));
        assert!(row.get("NOTENO").is_null());
        assert_eq!(row.int("NOTENO"), 0);
        assert_eq!(row.str("NAME"), "");
    }

    #[test]
    fn display_bytes_as_hex() {
        assert_eq!(Value::Bytes(vec![0x20, 0x24, 0x1C]).to_string(), "20241C");
        assert_eq!(Value::Null.to_string(), ".");
    }
}
