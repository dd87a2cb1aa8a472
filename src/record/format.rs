// src/record/format.rs
//
// Field renderers for positional layouts. Every function returns exactly
// `width` characters.

use chrono::NaiveDate;

/// Zero-padded integer (`Zw.`). Negative values carry a leading `-`.
/// A value too wide for the field is rendered as `*` fill.
pub fn z(n: i64, width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    let s = if n < 0 {
        format!("-{:0>w$}", n.unsigned_abs(), w = width.saturating_sub(1))
    } else {
        format!("{:0>w$}", n, w = width)
    };
    if s.len() > width {
        "*".repeat(width)
    } else {
        s
    }
}

/// Implied-decimal amount: `amount(1234.5, 10, 2)` → `0000123450`.
pub fn amount(v: f64, width: usize, decimals: u32) -> String {
    z(scaled(v, decimals), width)
}

/// Round half away from zero after scaling by `10^decimals`.
pub fn scaled(v: f64, decimals: u32) -> i64 {
    if !v.is_finite() {
        return 0;
    }
    let factor = 10f64.powi(decimals as i32);
    // nudge before rounding so 1.005 lands on 101, not 100
    let x = v * factor;
    (x + x.signum() * 1e-7).round() as i64
}

/// Left-justified text, truncated or blank-padded to `width`.
pub fn text(s: &str, width: usize) -> String {
    let mut out: String = s.chars().take(width).collect();
    let len = out.chars().count();
    out.extend(std::iter::repeat(' ').take(width - len));
    out
}

/// Right-justified text.
pub fn rtext(s: &str, width: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() >= width {
        chars[chars.len() - width..].iter().collect()
    } else {
        format!("{:>w$}", s, w = width)
    }
}

/// `YYYYMMDD`, or eight blanks for a missing date.
pub fn ymd(d: Option<NaiveDate>) -> String {
    match d {
        Some(d) => d.format("%Y%m%d").to_string(),
        None => " ".repeat(8),
    }
}

/// `DD/MM/YYYY` as used on printed report headings.
pub fn dmy_slash(d: NaiveDate) -> String {
    d.format("%d/%m/%Y").to_string()
}

/// Thousands-separated amount, right-aligned (`COMMAw.d`).
pub fn comma(v: f64, width: usize, decimals: u32) -> String {
    let n = scaled(v, decimals);
    let neg = n < 0;
    let abs = n.unsigned_abs();
    let factor = 10u64.pow(decimals);
    let (whole, frac) = (abs / factor, abs % factor);

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let mut s = String::new();
    if neg {
        s.push('-');
    }
    s.push_str(&grouped);
    if decimals > 0 {
        s.push('.');
        s.push_str(&format!("{:0>w$}", frac, w = decimals as usize));
    }
    if s.len() > width {
        "*".repeat(width)
    } else {
        format!("{:>w$}", s, w = width)
    }
}
