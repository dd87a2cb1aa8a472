// src/decode/packed.rs

use chrono::NaiveDate;

use crate::decode::date::ymd_num;

/// Unpack a COMP-3 field into its unscaled integer.
///
/// Two BCD digits per byte; the low nibble of the last byte is the sign
/// (`D`/`B` negative, `C`/`F`/`A`/`E` positive). Returns `None` on a bad
/// digit or sign nibble, or when the digits overflow an `i64`.
pub fn unpack_integer(bytes: &[u8]) -> Option<i64> {
    let (last, body) = bytes.split_last()?;
    let mut acc: i64 = 0;
    let mut push = |nibble: u8| -> Option<()> {
        if nibble > 9 {
            return None;
        }
        acc = acc.checked_mul(10)?.checked_add(nibble as i64)?;
        Some(())
    };
    for b in body {
        push(b >> 4)?;
        push(b & 0x0F)?;
    }
    push(last >> 4)?;
    match last & 0x0F {
        0x0D | 0x0B => Some(-acc),
        0x0C | 0x0F | 0x0A | 0x0E => Some(acc),
        _ => None,
    }
}

/// Unpack and apply an implied decimal scale (`PD6.2` → `scale = 2`).
pub fn unpack_decimal(bytes: &[u8], scale: u32) -> Option<f64> {
    let raw = unpack_integer(bytes)?;
    Some(raw as f64 / 10f64.powi(scale as i32))
}

/// Packed `YYYYMMDD`; an all-zero field means no date.
pub fn packed_date(bytes: &[u8]) -> Option<NaiveDate> {
    unpack_integer(bytes).and_then(ymd_num)
}
