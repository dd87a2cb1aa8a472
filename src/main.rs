// src/main.rs

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use regfeed::{
    config::Config,
    golden::compare_files,
    history::RunHistory,
    period::ReportingPeriod,
    programs::{self, RunContext},
    runner::{run_programs, select},
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "BNM and CCRIS regulatory file generation from core-banking extracts"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run programs (all of them when none are named).
    Run {
        programs: Vec<String>,
        #[arg(short, long, default_value = "regfeed.yaml")]
        config: PathBuf,
        /// Reporting date, YYYY-MM-DD; defaults to the config value or the
        /// previous month end.
        #[arg(long)]
        report_date: Option<NaiveDate>,
        /// Rerun programs already recorded as completed for the date.
        #[arg(long)]
        force: bool,
    },
    /// List the available programs.
    List,
    /// Compare a produced file with a reference file.
    Verify {
        actual: PathBuf,
        expected: PathBuf,
        #[arg(long, default_value_t = 20)]
        max_diffs: usize,
    },
    /// Show the recorded runs for a reporting date.
    History {
        #[arg(short, long, default_value = "regfeed.yaml")]
        config: PathBuf,
        #[arg(long)]
        report_date: Option<NaiveDate>,
    },
}

fn main() -> ExitCode {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    // ─── 2) dispatch ─────────────────────────────────────────────────
    let cli = Cli::parse();
    match dispatch(cli.command) {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn dispatch(command: Command) -> Result<ExitCode> {
    match command {
        Command::Run {
            programs,
            config,
            report_date,
            force,
        } => run(&config, report_date, &programs, force),
        Command::List => {
            for line in programs::listing() {
                println!("{}", line);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Verify {
            actual,
            expected,
            max_diffs,
        } => {
            let cmp = compare_files(&actual, &expected, max_diffs)?;
            println!("{}", cmp);
            Ok(if cmp.is_match() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::History {
            config,
            report_date,
        } => {
            let cfg = load_config(&config)?;
            let period = resolve_period(report_date, &cfg);
            let runs = RunHistory::new(&cfg.history_dir)?.runs(period.date)?;
            println!("{}", serde_json::to_string_pretty(&runs)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn run(
    config_path: &Path,
    report_date: Option<NaiveDate>,
    names: &[String],
    force: bool,
) -> Result<ExitCode> {
    // ─── 1) configuration ────────────────────────────────────────────
    let cfg = load_config(config_path)?;
    let period = resolve_period(report_date, &cfg);
    info!(
        institution = %cfg.institution_code,
        report_date = %period.date,
        "configuration loaded"
    );

    // ─── 2) programs and history ─────────────────────────────────────
    let selected = select(names)?;
    let history = RunHistory::new(&cfg.history_dir)?;
    let ctx = RunContext::new(cfg, period)?;

    // ─── 3) run ──────────────────────────────────────────────────────
    let summary = run_programs(&ctx, &history, &selected, force)?;
    println!(
        "{}",
        serde_json::to_string_pretty(&summary).context("serialising run summary")?
    );

    let failed = summary.failed();
    if failed > 0 {
        bail!("{} of {} programs failed", failed, summary.outcomes.len());
    }
    info!("all done");
    Ok(ExitCode::SUCCESS)
}

/// The config file when it exists, otherwise built-in defaults.
fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        Config::load(path)
    } else {
        warn!(path = %path.display(), "config file not found; using defaults");
        Ok(Config::default())
    }
}

fn resolve_period(flag: Option<NaiveDate>, cfg: &Config) -> ReportingPeriod {
    flag.or(cfg.report_date)
        .map(ReportingPeriod::new)
        .unwrap_or_else(ReportingPeriod::default_for_today)
}
