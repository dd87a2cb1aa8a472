// src/programs/submission.rs

use anyhow::Result;
use std::path::Path;

use crate::output::FixedWidthWriter;
use crate::period::ReportingPeriod;
use crate::record::FixedRecord;

/// A regulatory submission file: `H` header, `D` details, `T` trailer,
/// every record padded to the file's LRECL.
pub struct SubmissionFile {
    writer: FixedWidthWriter,
    institution: String,
    details: u64,
    hash_total: i64,
}

impl SubmissionFile {
    pub fn create(
        path: &Path,
        lrecl: usize,
        institution: &str,
        period: &ReportingPeriod,
        file_id: &str,
    ) -> Result<Self> {
        let mut writer = FixedWidthWriter::create(path, lrecl)?;
        let mut header = FixedRecord::new(lrecl);
        header
            .put(1, "H")
            .put_text(2, 4, institution)
            .put(6, &period.ymd())
            .put_text(14, 20, file_id);
        writer.write(header.as_str())?;
        Ok(Self {
            writer,
            institution: institution.to_string(),
            details: 0,
            hash_total: 0,
        })
    }

    /// Write one detail record and fold `hash_cents` into the control total.
    pub fn detail(&mut self, record: &str, hash_cents: i64) -> Result<()> {
        self.writer.write(record)?;
        self.details += 1;
        self.hash_total = self.hash_total.saturating_add(hash_cents);
        Ok(())
    }

    pub fn close(mut self) -> Result<(u64, i64)> {
        let mut trailer = FixedRecord::new(self.writer.lrecl());
        trailer
            .put(1, "T")
            .put_text(2, 4, &self.institution)
            .put_z(6, 9, self.details as i64)
            .put_z(15, 18, self.hash_total);
        self.writer.write(trailer.as_str())?;
        self.writer.finish()?;
        Ok((self.details, self.hash_total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn header_details_trailer() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("SUB.TXT");
        let period = ReportingPeriod::new(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap());
        let mut sub = SubmissionFile::create(&path, 40, "B001", &period, "TESTFILE")?;
        sub.detail(&format!("{:<40}", "D1"), 150)?;
        sub.detail(&format!("{:<40}", "D2"), 250)?;
        assert_eq!(sub.close()?, (2, 400));

        let text = fs::read_to_string(&path)?;
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(&lines[0][..13], "HB00120240630");
        assert_eq!(lines[0][13..33].trim_end(), "TESTFILE");
        assert_eq!(&lines[3][..32], "TB001000000002000000000000000400");
        assert!(lines.iter().all(|l| l.len() == 40));
        Ok(())
    }
}
