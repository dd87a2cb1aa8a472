// src/programs/ccris_credit.rs

use anyhow::Result;
use tracing::{info, warn};

use super::ident::classify_id;
use super::notes::{cents, Note, LNNOTE};
use super::submission::SubmissionFile;
use super::{Program, RunContext, RunStats};
use crate::lookup::FormatTable;
use crate::period::ReportingPeriod;
use crate::record::FixedRecord;

pub const LRECL: usize = 400;

/// Monthly CCRIS credit-account submission, one record per loan note.
pub struct CcrisCredit;

impl Program for CcrisCredit {
    fn name(&self) -> &'static str {
        "ccris-credit"
    }

    fn description(&self) -> &'static str {
        "CCRIS credit account file from the loan note extract"
    }

    fn datasets(&self) -> &'static [&'static str] {
        &[LNNOTE]
    }

    fn default_output(&self) -> &'static str {
        "CCRIS.CREDIT.TXT"
    }

    #[tracing::instrument(level = "info", skip_all, fields(program = "ccris-credit"))]
    fn run(&self, ctx: &RunContext) -> Result<RunStats> {
        let rows = ctx.load(LNNOTE)?;
        let facility = ctx.formats.table("loan_facility")?;
        let purpose = ctx.formats.table("loan_purpose")?;

        let path = ctx.output_path(self.name(), self.default_output());
        let mut out = SubmissionFile::create(
            &path,
            LRECL,
            &ctx.config.institution_code,
            &ctx.period,
            "CCRIS-CREDIT",
        )?;

        let mut stats = RunStats {
            rows_read: rows.len() as u64,
            ..RunStats::ZERO
        };
        for (idx, row) in rows.iter().enumerate() {
            let note = Note::from_row(row);
            if note.acctno <= 0 {
                warn!(row = idx, "ACCTNO missing or non-positive; rejected");
                stats.rejected += 1;
                continue;
            }
            if !note.is_reportable(&ctx.period) {
                stats.skipped += 1;
                continue;
            }
            let rec = credit_record(
                &note,
                &ctx.config.institution_code,
                &ctx.period,
                facility,
                purpose,
            );
            out.detail(&rec, cents(note.reported_balance()))?;
        }

        let (written, hash_total) = out.close()?;
        stats.written = written;
        stats.hash_total = hash_total;
        info!(
            written,
            skipped = stats.skipped,
            rejected = stats.rejected,
            output = %path.display(),
            "ccris credit file written"
        );
        Ok(stats)
    }
}

pub fn credit_record(
    note: &Note,
    institution: &str,
    period: &ReportingPeriod,
    facility: &FormatTable,
    purpose: &FormatTable,
) -> String {
    let (id_type, id_no) = classify_id(&note.idno);
    let status = note.status();

    let mut rec = FixedRecord::new(LRECL);
    rec.put(1, "D")
        .put_text(2, 4, institution)
        .put_z(6, 4, note.branch)
        .put(10, &note.account_key())
        .put(30, id_type.code())
        .put_text(32, 20, &id_no)
        .put_text(52, 60, &note.name)
        .put_text(112, 5, facility.num(note.loantype).unwrap_or_default())
        .put_text(117, 4, purpose.num(note.sector).unwrap_or_default())
        .put_ymd(121, note.issued)
        .put_ymd(129, note.maturity)
        .put_amount(137, 15, 2, note.limit.max(0.0))
        .put_amount(152, 15, 2, note.reported_balance())
        .put_amount(167, 15, 2, note.instalment.max(0.0))
        .put_z(182, 3, note.months_in_arrears(period))
        .put(185, status.code())
        .put(186, if note.is_impaired(period) { "Y" } else { "N" })
        .put_amount(187, 6, 3, note.rate.max(0.0))
        .put_z(193, 3, note.term.clamp(0, 999))
        .put_ymd(198, note.last_txn);
    rec.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::decode::date_to_sas;
    use crate::testutil::{init_logging, write_parquet, Col};
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::tempdir;

    fn sas(y: i32, m: u32, d: u32) -> Option<i64> {
        Some(date_to_sas(NaiveDate::from_ymd_opt(y, m, d).unwrap()))
    }

    #[test]
    fn writes_credit_records() -> Result<()> {
        init_logging();
        let dir = tempdir()?;
        let input = dir.path().join("input");
        fs::create_dir_all(&input)?;
        write_parquet(
            &input.join("lnnote.parquet"),
            vec![
                Col::int(
                    "ACCTNO",
                    vec![Some(8001234567), Some(8001234568), None, Some(8001234569)],
                ),
                Col::int("NOTENO", vec![Some(1), Some(2), Some(3), Some(4)]),
                Col::int("BRANCH", vec![Some(12), Some(12), Some(12), Some(7)]),
                Col::str(
                    "NAME",
                    vec![
                        Some("Lim Mei Ling"),
                        Some("SETTLED LONG AGO"),
                        None,
                        Some("Syarikat Maju Sdn Bhd"),
                    ],
                ),
                Col::str("NEWIC", vec![Some("900212-10-5566"), None, None, Some("123456-K")]),
                Col::int("LOANTYPE", vec![Some(210), Some(150), Some(150), Some(999)]),
                Col::int("SECTOR", vec![Some(8310), Some(3100), None, Some(5100)]),
                Col::int("ISSDTE", vec![Some(3_152_019_000), None, None, Some(1_012_024_000)]),
                Col::int("MATDATE", vec![sas(2049, 3, 15), None, None, sas(2029, 1, 1)]),
                Col::float(
                    "APPRLIMT",
                    vec![Some(450000.0), Some(10000.0), None, Some(2_000_000.0)],
                ),
                Col::float(
                    "BALANCE",
                    vec![Some(398765.43), Some(0.0), Some(10.0), Some(1_950_000.0)],
                ),
                Col::float("BILPAY", vec![Some(2150.6), None, None, Some(41000.0)]),
                Col::int("BLDATE", vec![sas(2024, 6, 1), None, None, sas(2024, 2, 1)]),
                Col::str("WRITEOFF", vec![Some("N"), Some("N"), None, Some("N")]),
                Col::float("INTRATE", vec![Some(4.25), None, None, Some(6.875)]),
                Col::int("NOTETERM", vec![Some(360), Some(60), None, Some(60)]),
                Col::int("LSTTRNDT", vec![Some(6_282_024_000), Some(1_102_023_000), None, None]),
            ],
        )?;

        let config = Config {
            institution_code: "B042".into(),
            input_dir: input,
            output_dir: dir.path().join("output"),
            ..Config::default()
        };
        let period = ReportingPeriod::new(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap());
        let ctx = RunContext::new(config, period)?;

        let stats = CcrisCredit.run(&ctx)?;
        assert_eq!(stats.rows_read, 4);
        assert_eq!(stats.written, 2);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.hash_total, 39876543 + 195000000);

        let text = fs::read_to_string(dir.path().join("output/CCRIS.CREDIT.TXT"))?;
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines.iter().all(|l| l.len() == LRECL));

        let r = lines[1];
        let col = move |from: usize, to: usize| &r[from - 1..to];
        assert_eq!(col(1, 5), "DB042");
        assert_eq!(col(6, 9), "0012");
        assert_eq!(col(10, 24), "800123456700001");
        assert_eq!(col(30, 31), "01");
        assert_eq!(col(32, 51).trim_end(), "900212105566");
        assert_eq!(col(52, 111).trim_end(), "LIM MEI LING");
        assert_eq!(col(112, 116), "34120");
        assert_eq!(col(117, 120), "8310");
        assert_eq!(col(121, 128), "20190315");
        assert_eq!(col(129, 136), "20490315");
        assert_eq!(col(137, 151), "000000045000000");
        assert_eq!(col(152, 166), "000000039876543");
        assert_eq!(col(167, 181), "000000000215060");
        assert_eq!(col(182, 184), "000");
        assert_eq!(col(185, 186), "AN");
        assert_eq!(col(187, 192), "004250");
        assert_eq!(col(193, 195), "360");
        assert_eq!(col(198, 205), "20240628");

        let r = lines[2];
        let col = move |from: usize, to: usize| &r[from - 1..to];
        assert_eq!(col(30, 31), "04");
        assert_eq!(col(32, 51).trim_end(), "123456K");
        assert_eq!(col(112, 116), "99999");
        assert_eq!(col(117, 120), "5000");
        // 2024-02-01 .. 2024-06-30 = 150 days
        assert_eq!(col(182, 184), "005");
        assert_eq!(col(185, 186), "AY");
        assert_eq!(col(187, 192), "006875");
        assert_eq!(col(198, 205), "        ");

        assert_eq!(&lines[3][..32], "TB042000000002000000000234876543");
        Ok(())
    }
}
