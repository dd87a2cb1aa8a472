use chrono::{NaiveDate, TimeDelta};
use once_cell::sync::Lazy;

use crate::decode::packed::unpack_integer;
use crate::extract::Value;

static SAS_EPOCH: Lazy<NaiveDate> =
    Lazy::new(|| NaiveDate::from_ymd_opt(1960, 1, 1).expect("valid epoch"));

/// How a numeric column carries a calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateEncoding {
    /// Days since 1960-01-01.
    Sas,
    /// `MMDDYYYY` in the first 8 of 11 zero-padded digits.
    Z11,
    /// `YYYYMMDD` as a plain number.
    Ymd,
    /// `DDMMYYYY` as a plain number.
    Dmy,
}

pub fn sas_to_date(days: i64) -> Option<NaiveDate> {
    SAS_EPOCH.checked_add_signed(TimeDelta::try_days(days)?)
}

pub fn date_to_sas(date: NaiveDate) -> i64 {
    date.signed_duration_since(*SAS_EPOCH).num_days()
}

/// Decode a Z11 date: `12312023000` → 2023-12-31.
pub fn z11_date(n: i64) -> Option<NaiveDate> {
    if n <= 0 {
        return None;
    }
    let s = format!("{:011}", n);
    if s.len() != 11 {
        return None;
    }
    let month: u32 = s[0..2].parse().ok()?;
    let day: u32 = s[2..4].parse().ok()?;
    let year: i32 = s[4..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

pub fn ymd_num(n: i64) -> Option<NaiveDate> {
    if !(1..=99_991_231).contains(&n) {
        return None;
    }
    let year = (n / 10_000) as i32;
    let month = ((n / 100) % 100) as u32;
    let day = (n % 100) as u32;
    NaiveDate::from_ymd_opt(year, month, day)
}

pub fn dmy_num(n: i64) -> Option<NaiveDate> {
    if !(1..=31_129_999).contains(&n) {
        return None;
    }
    let day = (n / 1_000_000) as u32;
    let month = ((n / 10_000) % 100) as u32;
    let year = (n % 10_000) as i32;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn decode_number(n: i64, encoding: DateEncoding) -> Option<NaiveDate> {
    match encoding {
        DateEncoding::Sas => sas_to_date(n),
        DateEncoding::Z11 => z11_date(n),
        DateEncoding::Ymd => ymd_num(n),
        DateEncoding::Dmy => dmy_num(n),
    }
}

/// Read a date out of any cell. Native dates pass through untouched;
/// numbers, digit strings and packed bytes go through `encoding`.
pub fn value_date(v: &Value, encoding: DateEncoding) -> Option<NaiveDate> {
    match v {
        Value::Date(d) => Some(*d),
        Value::Null => None,
        Value::Int(n) => decode_number(*n, encoding),
        Value::Float(f) if f.is_finite() => decode_number(f.trunc() as i64, encoding),
        Value::Float(_) => None,
        Value::Str(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                return Some(d);
            }
            s.parse::<i64>()
                .ok()
                .and_then(|n| decode_number(n, encoding))
        }
        Value::Bytes(b) => unpack_integer(b).and_then(|n| decode_number(n, encoding)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn sas_epoch_offsets() {
        assert_eq!(sas_to_date(0), Some(d(1960, 1, 1)));
        assert_eq!(sas_to_date(-1), Some(d(1959, 12, 31)));
        // 2024-01-01 is SAS day 23376
        assert_eq!(sas_to_date(23376), Some(d(2024, 1, 1)));
        assert_eq!(date_to_sas(d(2024, 1, 1)), 23376);
        assert_eq!(sas_to_date(i64::MAX), None);
    }

    #[test]
    fn z11_takes_leading_mmddyyyy() {
        assert_eq!(z11_date(12_312_023_000), Some(d(2023, 12, 31)));
        // leading zero month survives the padding
        assert_eq!(z11_date(1_152_024_000), Some(d(2024, 1, 15)));
        assert_eq!(z11_date(0), None);
        assert_eq!(z11_date(-5), None);
        assert_eq!(z11_date(13_012_024_000), None);
        assert_eq!(z11_date(123_456_789_012), None);
    }

    #[test]
    fn numeric_layouts() {
        assert_eq!(ymd_num(20240229), Some(d(2024, 2, 29)));
        assert_eq!(ymd_num(20230229), None);
        assert_eq!(ymd_num(0), None);
        assert_eq!(dmy_num(31122023), Some(d(2023, 12, 31)));
        assert_eq!(dmy_num(1012024), Some(d(2024, 1, 1)));
    }

    #[test]
    fn value_dates_follow_encoding() {
        assert_eq!(
            value_date(&Value::Int(23376), DateEncoding::Sas),
            Some(d(2024, 1, 1))
        );
        assert_eq!(
            value_date(&Value::Float(12_312_023_000.0), DateEncoding::Z11),
            Some(d(2023, 12, 31))
        );
        assert_eq!(
            value_date(&Value::Str("2024-06-30".into()), DateEncoding::Z11),
            Some(d(2024, 6, 30))
        );
        assert_eq!(
            value_date(&Value::Str(" 20240630 ".into()), DateEncoding::Ymd),
            Some(d(2024, 6, 30))
        );
        assert_eq!(
            value_date(&Value::Bytes(vec![0x02, 0x02, 0x40, 0x63, 0x0C]), DateEncoding::Ymd),
            Some(d(2024, 6, 30))
        );
        assert_eq!(value_date(&Value::Null, DateEncoding::Sas), None);
        assert_eq!(value_date(&Value::Str("  ".into()), DateEncoding::Sas), None);
    }
}
