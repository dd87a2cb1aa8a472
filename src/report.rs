// src/report.rs
//
// Paper-style listings: 133-byte lines whose first byte is the ASA
// carriage-control character.

use anyhow::Result;

use crate::output::FixedWidthWriter;
use crate::record::{format, FixedRecord};

pub const PRINT_LRECL: usize = 133;
pub const PAGE_DEPTH: usize = 60;
const BODY: usize = PRINT_LRECL - 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Carriage {
    NewPage,
    Single,
    Double,
}

impl Carriage {
    fn code(self) -> &'static str {
        match self {
            Carriage::NewPage => "1",
            Carriage::Single => " ",
            Carriage::Double => "0",
        }
    }

    fn advance(self) -> usize {
        match self {
            Carriage::Double => 2,
            _ => 1,
        }
    }
}

/// Paginates lines under a repeating page heading.
pub struct PagedReport {
    writer: FixedWidthWriter,
    institution: String,
    title: String,
    headings: Vec<String>,
    page_depth: usize,
    page: u32,
    line_on_page: usize,
    break_pending: bool,
}

impl PagedReport {
    pub fn new(writer: FixedWidthWriter, institution: &str, title: &str) -> Self {
        Self {
            writer,
            institution: institution.to_string(),
            title: title.to_string(),
            headings: Vec::new(),
            page_depth: PAGE_DEPTH,
            page: 0,
            line_on_page: 0,
            break_pending: true,
        }
    }

    pub fn with_page_depth(mut self, depth: usize) -> Self {
        self.page_depth = depth.max(8);
        self
    }

    /// Lines printed under the title on every page from the next break on.
    pub fn set_headings(&mut self, headings: Vec<String>) {
        self.headings = headings;
    }

    /// Start a fresh page before the next detail line.
    pub fn page_break(&mut self) {
        self.break_pending = true;
    }

    pub fn pages(&self) -> u32 {
        self.page
    }

    pub fn line(&mut self, text: &str) -> Result<()> {
        self.emit(Carriage::Single, text)
    }

    pub fn double(&mut self, text: &str) -> Result<()> {
        self.emit(Carriage::Double, text)
    }

    fn emit(&mut self, cc: Carriage, text: &str) -> Result<()> {
        if self.break_pending || self.line_on_page + cc.advance() > self.page_depth {
            self.heading()?;
        }
        self.raw(cc, text)
    }

    fn heading(&mut self) -> Result<()> {
        self.page += 1;
        self.line_on_page = 0;
        self.break_pending = false;

        let page_no = format!("PAGE {:>4}", self.page);
        let mut top = FixedRecord::new(BODY);
        top.put_text(1, BODY - page_no.len(), &self.institution)
            .put(BODY - page_no.len() + 1, &page_no);
        self.raw(Carriage::NewPage, top.as_str())?;

        let pad = BODY.saturating_sub(self.title.len()) / 2;
        let title = format!("{}{}", " ".repeat(pad), self.title);
        self.raw(Carriage::Single, &title)?;

        let headings = std::mem::take(&mut self.headings);
        let result = headings
            .iter()
            .enumerate()
            .try_for_each(|(i, h)| {
                let cc = if i == 0 { Carriage::Double } else { Carriage::Single };
                self.raw(cc, h)
            });
        self.headings = headings;
        result
    }

    fn raw(&mut self, cc: Carriage, text: &str) -> Result<()> {
        let mut rec = FixedRecord::new(PRINT_LRECL);
        rec.put(1, cc.code()).put(2, &format::text(text, BODY));
        self.writer.write(rec.as_str())?;
        self.line_on_page += cc.advance();
        Ok(())
    }

    pub fn finish(self) -> Result<u64> {
        self.writer.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn pages_break_on_depth_and_request() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("LIST.TXT");
        let writer = FixedWidthWriter::create(&path, PRINT_LRECL)?;
        let mut rpt = PagedReport::new(writer, "BANK BHD", "TEST LISTING").with_page_depth(8);
        rpt.set_headings(vec!["COL A   COL B".into(), "-----   -----".into()]);

        // heading takes 1 + 1 + 2 + 1 = 5 lines, leaving 3 detail lines per page
        for i in 0..4 {
            rpt.line(&format!("DETAIL {}", i))?;
        }
        rpt.page_break();
        rpt.double("TOTAL")?;
        assert_eq!(rpt.pages(), 3);
        rpt.finish()?;

        let text = fs::read_to_string(&path)?;
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines.iter().all(|l| l.len() == PRINT_LRECL));

        let firsts: String = lines.iter().map(|l| &l[..1]).collect();
        assert_eq!(firsts, "1 0    1 0  1 0 0");

        assert!(lines[0][1..].starts_with("BANK BHD"));
        assert!(lines[0].trim_end().ends_with("PAGE    1"));
        assert_eq!(lines[1].trim(), "TEST LISTING");
        assert_eq!(lines[4].trim(), "DETAIL 0");
        assert!(lines[7].trim_end().ends_with("PAGE    2"));
        assert_eq!(lines[11].trim(), "DETAIL 3");
        assert_eq!(lines[lines.len() - 1][1..].trim(), "TOTAL");
        Ok(())
    }
}
