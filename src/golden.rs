// src/golden.rs
//
// Line-by-line, column-level comparison of a produced file against a
// reference file.

use anyhow::{Context, Result};
use serde::Serialize;
use std::{fmt, fs, path::Path};

/// Inclusive 1-based column range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub from: usize,
    pub to: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineDiff {
    /// 1-based line number.
    pub line: usize,
    pub spans: Vec<Span>,
    pub actual: String,
    pub expected: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Comparison {
    pub lines_compared: usize,
    pub differing_lines: usize,
    /// First `max_diffs` differing lines.
    pub diffs: Vec<LineDiff>,
    /// Lines only in the expected file.
    pub missing: usize,
    /// Lines only in the actual file.
    pub extra: usize,
}

impl Comparison {
    pub fn is_match(&self) -> bool {
        self.differing_lines == 0 && self.missing == 0 && self.extra == 0
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_match() {
            return write!(f, "MATCH ({} lines)", self.lines_compared);
        }
        writeln!(
            f,
            "MISMATCH: {} of {} lines differ, {} missing, {} extra",
            self.differing_lines, self.lines_compared, self.missing, self.extra
        )?;
        for d in &self.diffs {
            let spans: Vec<String> = d
                .spans
                .iter()
                .map(|s| {
                    if s.from == s.to {
                        s.from.to_string()
                    } else {
                        format!("{}-{}", s.from, s.to)
                    }
                })
                .collect();
            writeln!(f, "line {}: columns {}", d.line, spans.join(", "))?;
            writeln!(f, "  actual:   {}", d.actual)?;
            writeln!(f, "  expected: {}", d.expected)?;
        }
        Ok(())
    }
}

/// Columns where `a` and `b` differ. A length difference is one extra span
/// covering the columns only the longer line has.
pub fn diff_spans(a: &str, b: &str) -> Vec<Span> {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let common = a.len().min(b.len());
    let mut spans: Vec<Span> = Vec::new();
    for i in 0..common {
        if a[i] == b[i] {
            continue;
        }
        let col = i + 1;
        match spans.last_mut() {
            Some(last) if last.to + 1 == col => last.to = col,
            _ => spans.push(Span { from: col, to: col }),
        }
    }
    let longest = a.len().max(b.len());
    if longest > common {
        spans.push(Span {
            from: common + 1,
            to: longest,
        });
    }
    spans
}

pub fn compare_lines(actual: &str, expected: &str, max_diffs: usize) -> Comparison {
    let actual: Vec<&str> = actual.lines().collect();
    let expected: Vec<&str> = expected.lines().collect();
    let mut cmp = Comparison {
        lines_compared: actual.len().min(expected.len()),
        missing: expected.len().saturating_sub(actual.len()),
        extra: actual.len().saturating_sub(expected.len()),
        ..Comparison::default()
    };
    for (i, (a, e)) in actual.iter().zip(&expected).enumerate() {
        if a == e {
            continue;
        }
        cmp.differing_lines += 1;
        if cmp.diffs.len() < max_diffs {
            cmp.diffs.push(LineDiff {
                line: i + 1,
                spans: diff_spans(a, e),
                actual: a.to_string(),
                expected: e.to_string(),
            });
        }
    }
    cmp
}

pub fn compare_files(actual: &Path, expected: &Path, max_diffs: usize) -> Result<Comparison> {
    let a = fs::read_to_string(actual)
        .with_context(|| format!("reading actual file {}", actual.display()))?;
    let e = fs::read_to_string(expected)
        .with_context(|| format!("reading expected file {}", expected.display()))?;
    Ok(compare_lines(&a, &e, max_diffs))
}
