use chrono::{Datelike, Local, Months, NaiveDate};

use crate::decode::date_to_sas;

/// The reporting date every program in a run works against, plus the
/// values derived from it (`REPTMON`, `NOWK`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportingPeriod {
    pub date: NaiveDate,
}

impl ReportingPeriod {
    pub fn new(date: NaiveDate) -> Self {
        Self { date }
    }

    /// Month end before `today`: runs in October report September.
    pub fn previous_month_end(today: NaiveDate) -> Self {
        let first = today.with_day(1).unwrap_or(today);
        Self::new(first.pred_opt().unwrap_or(first))
    }

    pub fn default_for_today() -> Self {
        Self::previous_month_end(Local::now().date_naive())
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn reptmon(&self) -> String {
        format!("{:02}", self.date.month())
    }

    pub fn reptday(&self) -> String {
        format!("{:02}", self.date.day())
    }

    /// Week of month as the weekly returns number it.
    pub fn week(&self) -> u32 {
        match self.date.day() {
            1..=8 => 1,
            9..=15 => 2,
            16..=22 => 3,
            _ => 4,
        }
    }

    pub fn month_start(&self) -> NaiveDate {
        self.date.with_day(1).unwrap_or(self.date)
    }

    pub fn sas_day(&self) -> i64 {
        date_to_sas(self.date)
    }

    pub fn ymd(&self) -> String {
        self.date.format("%Y%m%d").to_string()
    }

    pub fn days_since(&self, earlier: NaiveDate) -> i64 {
        self.date.signed_duration_since(earlier).num_days()
    }

    /// Reporting date moved forward `n` months, clamped to month end.
    pub fn plus_months(&self, n: u32) -> NaiveDate {
        self.date
            .checked_add_months(Months::new(n))
            .unwrap_or(NaiveDate::MAX)
    }

    /// Reporting date moved back `n` months, clamped to month end.
    pub fn minus_months(&self, n: u32) -> NaiveDate {
        self.date
            .checked_sub_months(Months::new(n))
            .unwrap_or(NaiveDate::MIN)
    }
}
