// src/programs/ccris_collateral.rs

use anyhow::Result;
use std::collections::HashSet;
use tracing::{debug, info, warn};

use super::ident::classify_id;
use super::notes::{account_key, cents, Note, LNNOTE};
use super::submission::SubmissionFile;
use super::{Program, RunContext, RunStats};
use crate::decode::DateEncoding;
use crate::extract::Row;
use crate::lookup::FormatTable;
use crate::period::ReportingPeriod;
use crate::record::FixedRecord;

pub const LRECL: usize = 200;
pub const COLLATER: &str = "COLLATER";
const STALE_AFTER_MONTHS: u32 = 36;

/// CCRIS collateral file for the notes reported on the credit file.
pub struct CcrisCollateral;

impl Program for CcrisCollateral {
    fn name(&self) -> &'static str {
        "ccris-collateral"
    }

    fn description(&self) -> &'static str {
        "CCRIS collateral file, limited to reportable loan notes"
    }

    fn datasets(&self) -> &'static [&'static str] {
        &[COLLATER, LNNOTE]
    }

    fn default_output(&self) -> &'static str {
        "CCRIS.COLLATERAL.TXT"
    }

    #[tracing::instrument(level = "info", skip_all, fields(program = "ccris-collateral"))]
    fn run(&self, ctx: &RunContext) -> Result<RunStats> {
        // 1) notes that make it onto this month's credit file
        let reportable: HashSet<(i64, i64)> = ctx
            .load(LNNOTE)?
            .iter()
            .map(Note::from_row)
            .filter(|n| n.acctno > 0 && n.is_reportable(&ctx.period))
            .map(|n| (n.acctno, n.noteno))
            .collect();
        debug!(notes = reportable.len(), "reportable notes");

        // 2) collateral rows, first occurrence per key
        let rows = ctx.load(COLLATER)?;
        let coll_type = ctx.formats.table("collateral_type")?;

        let path = ctx.output_path(self.name(), self.default_output());
        let mut out = SubmissionFile::create(
            &path,
            LRECL,
            &ctx.config.institution_code,
            &ctx.period,
            "CCRIS-COLLATERAL",
        )?;

        let mut stats = RunStats {
            rows_read: rows.len() as u64,
            ..RunStats::ZERO
        };
        let mut seen: HashSet<(i64, i64, String)> = HashSet::new();
        for (idx, row) in rows.iter().enumerate() {
            let coll = Collateral::from_row(row);
            if coll.acctno <= 0 || coll.collno.is_empty() {
                warn!(row = idx, acctno = coll.acctno, "collateral key incomplete; rejected");
                stats.rejected += 1;
                continue;
            }
            if !reportable.contains(&(coll.acctno, coll.noteno)) {
                stats.skipped += 1;
                continue;
            }
            if !seen.insert((coll.acctno, coll.noteno, coll.collno.clone())) {
                debug!(row = idx, collno = %coll.collno, "duplicate collateral key dropped");
                stats.skipped += 1;
                continue;
            }
            let rec = collateral_record(
                &coll,
                &ctx.config.institution_code,
                &ctx.period,
                coll_type,
            );
            out.detail(&rec, cents(coll.value.max(0.0)))?;
        }

        let (written, hash_total) = out.close()?;
        stats.written = written;
        stats.hash_total = hash_total;
        info!(
            written,
            skipped = stats.skipped,
            rejected = stats.rejected,
            output = %path.display(),
            "ccris collateral file written"
        );
        Ok(stats)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Collateral {
    pub acctno: i64,
    pub noteno: i64,
    pub collno: String,
    pub colltype: i64,
    pub value: f64,
    pub valued: Option<chrono::NaiveDate>,
    pub owner_id: String,
    pub owner_name: String,
}

impl Collateral {
    pub fn from_row(row: &Row) -> Self {
        Self {
            acctno: row.int("ACCTNO"),
            noteno: row.int("NOTENO"),
            collno: row.str("COLLNO").trim().to_string(),
            colltype: row.int("COLLTYPE"),
            value: row.float("COLLVAL"),
            valued: row.date("VALDATE", DateEncoding::Sas),
            owner_id: row.str("OWNERID"),
            owner_name: row.str("OWNERNAME").trim().to_uppercase(),
        }
    }

    /// Valued before the reporting date minus 36 months, or never valued.
    pub fn is_stale(&self, period: &ReportingPeriod) -> bool {
        match self.valued {
            Some(d) => d < period.minus_months(STALE_AFTER_MONTHS),
            None => true,
        }
    }
}

pub fn collateral_record(
    coll: &Collateral,
    institution: &str,
    period: &ReportingPeriod,
    coll_type: &FormatTable,
) -> String {
    let (id_type, id_no) = classify_id(&coll.owner_id);
    let mut rec = FixedRecord::new(LRECL);
    rec.put(1, "D")
        .put_text(2, 4, institution)
        .put(6, &account_key(coll.acctno, coll.noteno))
        .put_text(21, 20, &coll.collno)
        .put_text(41, 3, coll_type.num(coll.colltype).unwrap_or_default())
        .put_amount(44, 15, 2, coll.value.max(0.0))
        .put_ymd(59, coll.valued)
        .put(67, id_type.code())
        .put_text(69, 20, &id_no)
        .put_text(89, 60, &coll.owner_name)
        .put(149, if coll.is_stale(period) { "S" } else { " " });
    rec.finish()
}
