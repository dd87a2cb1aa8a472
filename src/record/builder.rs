use chrono::NaiveDate;
use tracing::warn;

use super::format;

/// Space-filled positional buffer of exactly `lrecl` bytes.
#[derive(Debug, Clone)]
pub struct FixedRecord {
    buf: Vec<u8>,
}

impl FixedRecord {
    pub fn new(lrecl: usize) -> Self {
        Self {
            buf: vec![b' '; lrecl],
        }
    }

    pub fn lrecl(&self) -> usize {
        self.buf.len()
    }

    /// Overlay `value` starting at 1-based `col`. Whatever runs past the
    /// end of the record is dropped; non-printable or non-ASCII characters
    /// become blanks so the byte width never drifts.
    pub fn put(&mut self, col: usize, value: &str) -> &mut Self {
        if col == 0 {
            warn!(value, "column 0 is not addressable; field dropped");
            return self;
        }
        let start = col - 1;
        for (pos, ch) in (start..self.buf.len()).zip(value.chars()) {
            self.buf[pos] = if ch.is_ascii() && !ch.is_ascii_control() {
                ch as u8
            } else {
                b' '
            };
        }
        self
    }

    pub fn put_text(&mut self, col: usize, width: usize, value: &str) -> &mut Self {
        self.put(col, &format::text(value, width))
    }

    pub fn put_z(&mut self, col: usize, width: usize, n: i64) -> &mut Self {
        self.put(col, &format::z(n, width))
    }

    pub fn put_amount(&mut self, col: usize, width: usize, decimals: u32, v: f64) -> &mut Self {
        self.put(col, &format::amount(v, width, decimals))
    }

    pub fn put_ymd(&mut self, col: usize, d: Option<NaiveDate>) -> &mut Self {
        self.put(col, &format::ymd(d))
    }

    pub fn as_str(&self) -> &str {
        // only printable ASCII is ever written into `buf`
        std::str::from_utf8(&self.buf).unwrap_or_default()
    }

    pub fn finish(self) -> String {
        String::from_utf8(self.buf).unwrap_or_default()
    }
}

/// Build one record from `(column, value)` pairs; columns are 1-based and
/// later pairs overwrite earlier ones where they overlap.
pub fn build_record(fields: &[(usize, &str)], lrecl: usize) -> String {
    let mut rec = FixedRecord::new(lrecl);
    for (col, value) in fields {
        rec.put(*col, value);
    }
    rec.finish()
}
