// src/programs/notes.rs
//
// Loan note fields and the derivations shared by the CCRIS credit file,
// the collateral file and the arrears listing.

use chrono::NaiveDate;

use crate::decode::DateEncoding;
use crate::extract::Row;
use crate::period::ReportingPeriod;
use crate::record::format;

pub const LNNOTE: &str = "LNNOTE";
const MAX_ARREARS_MONTHS: i64 = 999;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountStatus {
    Active,
    Settled,
    WrittenOff,
}

impl AccountStatus {
    pub fn code(self) -> &'static str {
        match self {
            AccountStatus::Active => "A",
            AccountStatus::Settled => "S",
            AccountStatus::WrittenOff => "W",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub acctno: i64,
    pub noteno: i64,
    pub branch: i64,
    pub name: String,
    pub idno: String,
    pub loantype: i64,
    pub sector: i64,
    pub issued: Option<NaiveDate>,
    pub maturity: Option<NaiveDate>,
    pub limit: f64,
    pub balance: f64,
    pub instalment: f64,
    pub billed: Option<NaiveDate>,
    pub written_off: bool,
    pub rate: f64,
    pub term: i64,
    pub last_txn: Option<NaiveDate>,
}

impl Note {
    pub fn from_row(row: &Row) -> Self {
        Self {
            acctno: row.int("ACCTNO"),
            noteno: row.int("NOTENO"),
            branch: row.int("BRANCH"),
            name: row.str("NAME").trim().to_uppercase(),
            idno: row.str("NEWIC"),
            loantype: row.int("LOANTYPE"),
            sector: row.int("SECTOR"),
            issued: row.date("ISSDTE", DateEncoding::Z11),
            maturity: row.date("MATDATE", DateEncoding::Sas),
            limit: row.float("APPRLIMT"),
            balance: row.float("BALANCE"),
            instalment: row.float("BILPAY"),
            billed: row.date("BLDATE", DateEncoding::Sas),
            written_off: row.str("WRITEOFF").trim().eq_ignore_ascii_case("Y"),
            rate: row.float("INTRATE"),
            term: row.int("NOTETERM"),
            last_txn: row.date("LSTTRNDT", DateEncoding::Z11),
        }
    }

    /// `ACCTNO` Z10 followed by `NOTENO` Z5.
    pub fn account_key(&self) -> String {
        account_key(self.acctno, self.noteno)
    }

    pub fn status(&self) -> AccountStatus {
        if self.written_off {
            AccountStatus::WrittenOff
        } else if self.balance <= 0.0 {
            AccountStatus::Settled
        } else {
            AccountStatus::Active
        }
    }

    /// Settled notes are reported once, in the month they close.
    pub fn is_reportable(&self, period: &ReportingPeriod) -> bool {
        match self.status() {
            AccountStatus::Settled => self
                .last_txn
                .is_some_and(|d| d >= period.month_start()),
            _ => true,
        }
    }

    pub fn days_in_arrears(&self, period: &ReportingPeriod) -> i64 {
        match self.billed {
            Some(billed) if self.balance > 0.0 && billed < period.date => {
                period.days_since(billed)
            }
            _ => 0,
        }
    }

    pub fn months_in_arrears(&self, period: &ReportingPeriod) -> i64 {
        (self.days_in_arrears(period) / 30).min(MAX_ARREARS_MONTHS)
    }

    pub fn is_impaired(&self, period: &ReportingPeriod) -> bool {
        self.status() == AccountStatus::WrittenOff || self.months_in_arrears(period) >= 3
    }

    pub fn reported_balance(&self) -> f64 {
        self.balance.max(0.0)
    }
}

pub fn account_key(acctno: i64, noteno: i64) -> String {
    format!("{}{}", format::z(acctno, 10), format::z(noteno, 5))
}

/// Money in whole cents for control totals.
pub fn cents(v: f64) -> i64 {
    format::scaled(v, 2)
}
