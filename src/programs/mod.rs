// src/programs/mod.rs

pub mod bnm_deposit;
pub mod ccris_collateral;
pub mod ccris_credit;
pub mod ident;
pub mod loan_arrears;
pub mod notes;
pub mod submission;

use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;

use crate::config::Config;
use crate::extract::{load_dataset, Row};
use crate::lookup::Formats;
use crate::period::ReportingPeriod;

/// Row and amount counters for one program run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub rows_read: u64,
    pub written: u64,
    /// Excluded by a business rule.
    pub skipped: u64,
    /// Failed a mandatory-field check.
    pub rejected: u64,
    /// Control total in cents, as carried on the trailer.
    pub hash_total: i64,
}

impl RunStats {
    pub const ZERO: Self = RunStats {
        rows_read: 0,
        written: 0,
        skipped: 0,
        rejected: 0,
        hash_total: 0,
    };

    pub fn add(&mut self, other: RunStats) {
        self.rows_read = self.rows_read.saturating_add(other.rows_read);
        self.written = self.written.saturating_add(other.written);
        self.skipped = self.skipped.saturating_add(other.skipped);
        self.rejected = self.rejected.saturating_add(other.rejected);
        self.hash_total = self.hash_total.saturating_add(other.hash_total);
    }
}

/// Everything a program needs from the surrounding run.
pub struct RunContext {
    pub config: Config,
    pub period: ReportingPeriod,
    pub formats: Formats,
}

impl RunContext {
    pub fn new(config: Config, period: ReportingPeriod) -> Result<Self> {
        let formats = Formats::load(config.formats.as_deref())?;
        Ok(Self {
            config,
            period,
            formats,
        })
    }

    pub fn load(&self, dataset: &str) -> Result<Vec<Row>> {
        let pattern = self.config.dataset_pattern(dataset);
        load_dataset(&self.config.input_dir, dataset, &pattern)
    }

    pub fn output_path(&self, program: &str, default_name: &str) -> PathBuf {
        self.config.output_path(program, default_name)
    }
}

/// One batch job: read extracts, apply rules, write one output file.
pub trait Program {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn datasets(&self) -> &'static [&'static str];
    fn default_output(&self) -> &'static str;
    fn run(&self, ctx: &RunContext) -> Result<RunStats>;
}

pub fn all() -> Vec<Box<dyn Program>> {
    vec![
        Box::new(ccris_credit::CcrisCredit),
        Box::new(ccris_collateral::CcrisCollateral),
        Box::new(bnm_deposit::BnmDeposit),
        Box::new(loan_arrears::LoanArrears),
    ]
}

pub fn find(name: &str) -> Option<Box<dyn Program>> {
    all().into_iter().find(|p| p.name() == name)
}

/// One line per program: name, output file, input datasets, description.
pub fn listing() -> Vec<String> {
    all()
        .iter()
        .map(|p| {
            format!(
                "{:<18} {:<22} {:<16} {}",
                p.name(),
                p.default_output(),
                p.datasets().join(","),
                p.description()
            )
        })
        .collect()
}
