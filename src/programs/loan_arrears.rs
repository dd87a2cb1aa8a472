// src/programs/loan_arrears.rs

use anyhow::Result;
use tracing::{debug, info, warn};

use super::notes::{cents, Note, LNNOTE};
use super::{Program, RunContext, RunStats};
use crate::output::FixedWidthWriter;
use crate::period::ReportingPeriod;
use crate::record::{format, FixedRecord};
use crate::report::{PagedReport, PRINT_LRECL};

const LINE: usize = PRINT_LRECL - 1;

/// Loans-in-arrears listing, one page group per branch.
pub struct LoanArrears;

impl Program for LoanArrears {
    fn name(&self) -> &'static str {
        "loan-arrears"
    }

    fn description(&self) -> &'static str {
        "Printed listing of loan notes one month or more in arrears"
    }

    fn datasets(&self) -> &'static [&'static str] {
        &[LNNOTE]
    }

    fn default_output(&self) -> &'static str {
        "LOAN.ARREARS.LST"
    }

    #[tracing::instrument(level = "info", skip_all, fields(program = "loan-arrears"))]
    fn run(&self, ctx: &RunContext) -> Result<RunStats> {
        let rows = ctx.load(LNNOTE)?;
        let mut stats = RunStats {
            rows_read: rows.len() as u64,
            ..RunStats::ZERO
        };

        // 1) notes in arrears, with their month count
        let mut listed: Vec<(Note, i64)> = Vec::new();
        for (idx, row) in rows.iter().enumerate() {
            let note = Note::from_row(row);
            if note.acctno <= 0 {
                warn!(row = idx, "ACCTNO missing or non-positive; rejected");
                stats.rejected += 1;
                continue;
            }
            let months = note.months_in_arrears(&ctx.period);
            if months < 1 {
                stats.skipped += 1;
                continue;
            }
            listed.push((note, months));
        }

        // 2) branch, then worst arrears first, then account
        listed.sort_by(|(a, am), (b, bm)| {
            a.branch
                .cmp(&b.branch)
                .then(bm.cmp(am))
                .then(a.acctno.cmp(&b.acctno))
                .then(a.noteno.cmp(&b.noteno))
        });
        debug!(listed = listed.len(), "arrears notes sorted");

        // 3) print
        let path = ctx.output_path(self.name(), self.default_output());
        let writer = FixedWidthWriter::create(&path, PRINT_LRECL)?;
        let title = format!(
            "LOANS IN ARREARS AS AT {}",
            format::dmy_slash(ctx.period.date)
        );
        let mut rpt = PagedReport::new(writer, &ctx.config.institution_name, &title);

        if listed.is_empty() {
            rpt.set_headings(column_headings());
            rpt.double("NO ACCOUNTS IN ARREARS")?;
        }

        let mut grand = Totals::default();
        for group in listed.chunk_by(|(a, _), (b, _)| a.branch == b.branch) {
            let branch = group[0].0.branch;
            let mut headings = vec![format!("BRANCH: {}", format::z(branch, 4))];
            headings.extend(column_headings());
            rpt.set_headings(headings);
            rpt.page_break();

            let mut sub = Totals::default();
            for (note, months) in group {
                rpt.line(&detail_line(note, *months, &ctx.period))?;
                sub.add(note);
                stats.hash_total = stats.hash_total.saturating_add(cents(note.reported_balance()));
            }
            rpt.double(&total_line(
                &format!("BRANCH {} TOTAL", format::z(branch, 4)),
                &sub,
            ))?;
            grand.merge(&sub);
        }
        if grand.accounts > 0 {
            rpt.double(&total_line("GRAND TOTAL", &grand))?;
        }

        let pages = rpt.pages();
        rpt.finish()?;
        stats.written = grand.accounts;
        info!(
            listed = stats.written,
            pages,
            skipped = stats.skipped,
            rejected = stats.rejected,
            output = %path.display(),
            "loan arrears listing written"
        );
        Ok(stats)
    }
}

#[derive(Debug, Default)]
struct Totals {
    accounts: u64,
    balance: f64,
    instalment: f64,
}

impl Totals {
    fn add(&mut self, note: &Note) {
        self.accounts += 1;
        self.balance += note.reported_balance();
        self.instalment += note.instalment.max(0.0);
    }

    fn merge(&mut self, other: &Totals) {
        self.accounts += other.accounts;
        self.balance += other.balance;
        self.instalment += other.instalment;
    }
}

fn column_headings() -> Vec<String> {
    let mut cols = FixedRecord::new(LINE);
    cols.put(1, "ACCOUNT NO")
        .put(13, "NOTE")
        .put(20, "BORROWER NAME")
        .put(52, "TYPE")
        .put(58, &format::rtext("BALANCE", 18))
        .put(78, &format::rtext("INSTALMENT", 16))
        .put(95, "MTHS")
        .put(102, "REMARKS");
    let mut rule = FixedRecord::new(LINE);
    rule.put(1, &"-".repeat(110));
    vec![cols.finish(), rule.finish()]
}

fn detail_line(note: &Note, months: i64, period: &ReportingPeriod) -> String {
    let mut rec = FixedRecord::new(LINE);
    rec.put_z(1, 10, note.acctno)
        .put_z(13, 5, note.noteno)
        .put_text(20, 30, &note.name)
        .put(52, &format::rtext(&note.loantype.to_string(), 4))
        .put(58, &format::comma(note.reported_balance(), 18, 2))
        .put(78, &format::comma(note.instalment.max(0.0), 16, 2))
        .put(96, &format::rtext(&months.to_string(), 3));
    if note.is_impaired(period) {
        rec.put(102, "IMPAIRED");
    }
    rec.finish()
}

fn total_line(label: &str, totals: &Totals) -> String {
    let mut rec = FixedRecord::new(LINE);
    rec.put_text(1, 30, label)
        .put(32, &format!("ACCOUNTS: {}", totals.accounts))
        .put(58, &format::comma(totals.balance, 18, 2))
        .put(78, &format::comma(totals.instalment, 16, 2));
    rec.finish()
}
