// src/runner.rs

use anyhow::{bail, Result};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::history::{RunHistory, RunRecord};
use crate::programs::{self, Program, RunContext, RunStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Completed,
    /// Already in the run history for this reporting date.
    AlreadyDone,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    pub program: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<RunStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// What `regfeed run` prints as JSON when it is done.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub report_date: NaiveDate,
    pub outcomes: Vec<Outcome>,
    pub totals: RunStats,
}

impl RunSummary {
    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == Status::Failed)
            .count()
    }
}

/// Resolve requested names to programs, keeping the requested order.
/// No names means every program.
pub fn select(names: &[String]) -> Result<Vec<Box<dyn Program>>> {
    if names.is_empty() {
        return Ok(programs::all());
    }
    let mut out = Vec::with_capacity(names.len());
    for name in names {
        match programs::find(name) {
            Some(p) => out.push(p),
            None => bail!(
                "unknown program '{}' (known: {})",
                name,
                programs::all()
                    .iter()
                    .map(|p| p.name())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }
    Ok(out)
}

/// Run `selected` one after another. A failing program is logged and
/// reported; the rest still run.
pub fn run_programs(
    ctx: &RunContext,
    history: &RunHistory,
    selected: &[Box<dyn Program>],
    force: bool,
) -> Result<RunSummary> {
    let date = ctx.period.date;
    let done = history.completed(date)?;
    let mut summary = RunSummary {
        report_date: date,
        outcomes: Vec::with_capacity(selected.len()),
        totals: RunStats::ZERO,
    };

    for program in selected {
        let name = program.name();
        if !force && done.contains(name) {
            info!(program = name, %date, "already completed; skipping");
            summary.outcomes.push(Outcome {
                program: name.to_string(),
                status: Status::AlreadyDone,
                stats: None,
                output: None,
                error: None,
            });
            continue;
        }

        let output = ctx.output_path(name, program.default_output());
        let started = Utc::now();
        info!(program = name, %date, "starting");
        match program.run(ctx) {
            Ok(stats) => {
                let record = RunRecord {
                    program: name.to_string(),
                    report_date: date,
                    stats,
                    output: output.display().to_string(),
                    started,
                    finished: Utc::now(),
                };
                if let Err(e) = history.record(&record) {
                    warn!(program = name, "output written but history not recorded: {:#}", e);
                }
                summary.totals.add(stats);
                summary.outcomes.push(Outcome {
                    program: name.to_string(),
                    status: Status::Completed,
                    stats: Some(stats),
                    output: Some(record.output),
                    error: None,
                });
            }
            Err(e) => {
                error!(program = name, "failed: {:#}", e);
                summary.outcomes.push(Outcome {
                    program: name.to_string(),
                    status: Status::Failed,
                    stats: None,
                    output: None,
                    error: Some(format!("{:#}", e)),
                });
            }
        }
    }
    Ok(summary)
}
