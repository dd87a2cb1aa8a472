// src/programs/bnm_deposit.rs

use anyhow::Result;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use super::notes::cents;
use super::submission::SubmissionFile;
use super::{Program, RunContext, RunStats};
use crate::decode::{packed_date, value_date, DateEncoding};
use crate::extract::{Row, Value};
use crate::lookup::FormatTable;
use crate::period::ReportingPeriod;
use crate::record::FixedRecord;

pub const LRECL: usize = 80;
pub const DEPOSIT: &str = "DEPOSIT";

/// BNM deposit return: balances and account counts summed per item code.
pub struct BnmDeposit;

impl Program for BnmDeposit {
    fn name(&self) -> &'static str {
        "bnm-deposit"
    }

    fn description(&self) -> &'static str {
        "BNM deposit return by product, holder sector and residual maturity"
    }

    fn datasets(&self) -> &'static [&'static str] {
        &[DEPOSIT]
    }

    fn default_output(&self) -> &'static str {
        "BNM.DEPOSIT.TXT"
    }

    #[tracing::instrument(level = "info", skip_all, fields(program = "bnm-deposit"))]
    fn run(&self, ctx: &RunContext) -> Result<RunStats> {
        let rows = ctx.load(DEPOSIT)?;
        let mapper = ItemMapper {
            category: ctx.formats.table("deposit_category")?,
            sector: ctx.formats.table("customer_sector")?,
            item: ctx.formats.table("bnm_deposit_item")?,
            period: &ctx.period,
        };

        let mut stats = RunStats {
            rows_read: rows.len() as u64,
            ..RunStats::ZERO
        };
        // item code → (cents, accounts)
        let mut items: BTreeMap<String, (i64, u64)> = BTreeMap::new();
        for (idx, row) in rows.iter().enumerate() {
            let acctno = row.int("ACCTNO");
            let balance = row.float("CURBAL");
            if row.str("STATUS").trim().eq_ignore_ascii_case("C") || cents(balance) == 0 {
                stats.skipped += 1;
                continue;
            }
            match mapper.item_code(row) {
                Ok(code) => {
                    let entry = items.entry(code).or_insert((0, 0));
                    entry.0 = entry.0.saturating_add(cents(balance));
                    entry.1 += 1;
                }
                Err(reason) => {
                    warn!(row = idx, acctno, reason, "deposit not mapped; rejected");
                    stats.rejected += 1;
                }
            }
        }
        debug!(items = items.len(), "deposit items aggregated");

        let path = ctx.output_path(self.name(), self.default_output());
        let mut out = SubmissionFile::create(
            &path,
            LRECL,
            &ctx.config.institution_code,
            &ctx.period,
            "BNM-DEPOSIT",
        )?;
        for (code, (amount, accounts)) in &items {
            let mut rec = FixedRecord::new(LRECL);
            rec.put(1, "D")
                .put_text(2, 4, &ctx.config.institution_code)
                .put(6, &ctx.period.ymd())
                .put_text(14, 7, code)
                .put_z(21, 18, *amount)
                .put_z(39, 9, *accounts as i64);
            out.detail(rec.as_str(), *amount)?;
        }

        let (written, hash_total) = out.close()?;
        stats.written = written;
        stats.hash_total = hash_total;
        info!(
            items = written,
            skipped = stats.skipped,
            rejected = stats.rejected,
            output = %path.display(),
            "bnm deposit return written"
        );
        Ok(stats)
    }
}

struct ItemMapper<'a> {
    category: &'a FormatTable,
    sector: &'a FormatTable,
    item: &'a FormatTable,
    period: &'a ReportingPeriod,
}

impl ItemMapper<'_> {
    fn item_code(&self, row: &Row) -> Result<String, &'static str> {
        let category = self
            .category
            .num(row.int("PRODUCT"))
            .ok_or("unknown product")?;
        let sector = self
            .sector
            .num(row.int("CUSTCODE"))
            .ok_or("unknown customer code")?;
        let base = self
            .item
            .text(&format!("{}{}", category, sector))
            .ok_or("no item for category and sector")?;

        let suffix = if category == "FD" {
            let maturity = maturity_date(row).ok_or("fixed deposit without maturity")?;
            maturity_bucket(self.period, maturity)
        } else {
            '0'
        };
        Ok(format!("{}{}", base, suffix))
    }
}

/// Packed `MATDT` first, then the SAS-dated `MATDATE`.
fn maturity_date(row: &Row) -> Option<NaiveDate> {
    let packed = match row.get("MATDT") {
        Value::Bytes(b) => packed_date(b),
        other => value_date(other, DateEncoding::Ymd),
    };
    packed.or_else(|| row.date("MATDATE", DateEncoding::Sas))
}

/// Residual maturity band, as one digit.
pub fn maturity_bucket(period: &ReportingPeriod, maturity: NaiveDate) -> char {
    if maturity <= period.plus_months(1) {
        '1'
    } else if maturity <= period.plus_months(3) {
        '2'
    } else if maturity <= period.plus_months(6) {
        '3'
    } else if maturity <= period.plus_months(12) {
        '4'
    } else {
        '5'
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::decode::date_to_sas;
    use crate::testutil::{init_logging, pack, write_parquet, Col};
    use std::fs;
    use tempfile::tempdir;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn buckets() {
        let p = ReportingPeriod::new(d(2024, 6, 30));
        assert_eq!(maturity_bucket(&p, d(2024, 5, 1)), '1');
        assert_eq!(maturity_bucket(&p, d(2024, 7, 30)), '1');
        assert_eq!(maturity_bucket(&p, d(2024, 7, 31)), '2');
        assert_eq!(maturity_bucket(&p, d(2024, 12, 30)), '3');
        assert_eq!(maturity_bucket(&p, d(2025, 6, 30)), '4');
        assert_eq!(maturity_bucket(&p, d(2025, 7, 1)), '5');
    }

    #[test]
    fn aggregates_by_item() -> Result<()> {
        init_logging();
        let dir = tempdir()?;
        let input = dir.path().join("input");
        fs::create_dir_all(&input)?;
        write_parquet(
            &input.join("deposit.parquet"),
            vec![
                Col::int(
                    "ACCTNO",
                    vec![Some(1), Some(2), Some(3), Some(4), Some(5), Some(6), Some(7), Some(8)],
                ),
                Col::int(
                    "PRODUCT",
                    vec![
                        Some(210),
                        Some(220),
                        Some(310),
                        Some(310),
                        Some(110),
                        Some(999),
                        Some(310),
                        Some(310),
                    ],
                ),
                Col::int(
                    "CUSTCODE",
                    vec![
                        Some(77),
                        Some(78),
                        Some(77),
                        Some(35),
                        Some(40),
                        Some(77),
                        Some(77),
                        Some(77),
                    ],
                ),
                Col::float(
                    "CURBAL",
                    vec![
                        Some(1000.10),
                        Some(250.0),
                        Some(50000.0),
                        Some(120000.0),
                        Some(0.0),
                        Some(10.0),
                        Some(7000.0),
                        Some(300.0),
                    ],
                ),
                Col::str(
                    "STATUS",
                    vec![None, None, None, None, None, None, None, Some("C")],
                ),
                Col::bytes(
                    "MATDT",
                    vec![
                        None,
                        None,
                        Some(pack(20240915, 5)),
                        None,
                        None,
                        None,
                        None,
                        None,
                    ],
                ),
                Col::int(
                    "MATDATE",
                    vec![
                        None,
                        None,
                        None,
                        Some(date_to_sas(d(2026, 1, 31))),
                        None,
                        None,
                        None,
                        None,
                    ],
                ),
            ],
        )?;

        let config = Config {
            institution_code: "B042".into(),
            input_dir: input,
            output_dir: dir.path().join("output"),
            ..Config::default()
        };
        let ctx = RunContext::new(config, ReportingPeriod::new(d(2024, 6, 30)))?;
        let stats = BnmDeposit.run(&ctx)?;

        assert_eq!(stats.rows_read, 8);
        // zero balance and closed account
        assert_eq!(stats.skipped, 2);
        // unknown product, and an FD with no maturity
        assert_eq!(stats.rejected, 2);
        assert_eq!(stats.written, 3);
        assert_eq!(stats.hash_total, 125010 + 5000000 + 12000000);

        let text = fs::read_to_string(dir.path().join("output/BNM.DEPOSIT.TXT"))?;
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines.iter().all(|l| l.len() == LRECL));
        assert_eq!(
            &lines[1][..47],
            "DB04220240630422100 000000000000125010000000002"
        );
        assert_eq!(
            &lines[2][..47],
            "DB04220240630423102 000000000005000000000000001"
        );
        assert_eq!(
            &lines[3][..47],
            "DB04220240630423205 000000000012000000000000001"
        );
        Ok(())
    }

    #[test]
    fn item_total_saturates() -> Result<()> {
        init_logging();
        let dir = tempdir()?;
        let input = dir.path().join("input");
        fs::create_dir_all(&input)?;
        write_parquet(
            &input.join("deposit.parquet"),
            vec![
                Col::int("ACCTNO", vec![Some(1), Some(2)]),
                Col::int("PRODUCT", vec![Some(210), Some(210)]),
                Col::int("CUSTCODE", vec![Some(77), Some(77)]),
                Col::float("CURBAL", vec![Some(5e16), Some(5e16)]),
            ],
        )?;
        let config = Config {
            institution_code: "B042".into(),
            input_dir: input,
            output_dir: dir.path().join("output"),
            ..Config::default()
        };
        let ctx = RunContext::new(config, ReportingPeriod::new(d(2024, 6, 30)))?;
        let stats = BnmDeposit.run(&ctx)?;
        assert_eq!(stats.written, 1);
        assert_eq!(stats.hash_total, i64::MAX);

        let text = fs::read_to_string(dir.path().join("output/BNM.DEPOSIT.TXT"))?;
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(&lines[1][13..20], "422100 ");
        assert_eq!(&lines[1][20..38], "*".repeat(18));
        assert_eq!(&lines[1][38..47], "000000002");
        Ok(())
    }
}
