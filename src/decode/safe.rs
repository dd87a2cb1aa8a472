// src/decode/safe.rs

use crate::decode::date::date_to_sas;
use crate::extract::Value;

/// Lenient integer coercion. Anything that cannot be read becomes 0.
pub fn safe_int(v: &Value) -> i64 {
    match v {
        Value::Int(i) => *i,
        Value::Float(f) => float_to_int(*f),
        Value::Str(s) => parse_int(s),
        Value::Date(d) => date_to_sas(*d),
        Value::Null | Value::Bytes(_) => 0,
    }
}

/// Lenient float coercion. Anything that cannot be read becomes 0.0.
pub fn safe_float(v: &Value) -> f64 {
    match v {
        Value::Int(i) => *i as f64,
        Value::Float(f) if f.is_finite() => *f,
        Value::Float(_) => 0.0,
        Value::Str(s) => s
            .trim()
            .replace(',', "")
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .unwrap_or(0.0),
        Value::Date(d) => date_to_sas(*d) as f64,
        Value::Null | Value::Bytes(_) => 0.0,
    }
}

/// Lenient string coercion; trailing blanks are dropped like a SAS `TRIM`.
pub fn safe_str(v: &Value) -> String {
    match v {
        Value::Str(s) => s.trim_end().to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) if !f.is_finite() => String::new(),
        Value::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Value::Float(f) => f.to_string(),
        Value::Date(d) => d.format("%Y-%m-%d").to_string(),
        Value::Null | Value::Bytes(_) => String::new(),
    }
}

fn float_to_int(f: f64) -> i64 {
    if f.is_finite() {
        f.trunc() as i64
    } else {
        0
    }
}

fn parse_int(s: &str) -> i64 {
    let t = s.trim().replace(',', "");
    if let Ok(i) = t.parse::<i64>() {
        return i;
    }
    t.parse::<f64>().map(float_to_int).unwrap_or(0)
}
