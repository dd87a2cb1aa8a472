// src/history/mod.rs

use anyhow::{Context, Result};
use arrow::array::{
    Array, ArrayRef, Date32Array, Int64Array, StringArray, TimestampMicrosecondArray,
    UInt64Array,
};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use glob::glob;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use serde::Serialize;
use std::{
    collections::HashSet,
    fs::{self, File},
    io::BufWriter,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::debug;

use crate::programs::RunStats;

const UNIX_EPOCH_DAYS_CE: i32 = 719_163;

/// One completed program run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunRecord {
    pub program: String,
    pub report_date: NaiveDate,
    #[serde(flatten)]
    pub stats: RunStats,
    pub output: String,
    pub started: DateTime<Utc>,
    pub finished: DateTime<Utc>,
}

impl RunRecord {
    fn schema() -> Schema {
        let ts = || DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into()));
        Schema::new(vec![
            Field::new("program", DataType::Utf8, false),
            Field::new("report_date", DataType::Date32, false),
            Field::new("rows_read", DataType::UInt64, false),
            Field::new("written", DataType::UInt64, false),
            Field::new("skipped", DataType::UInt64, false),
            Field::new("rejected", DataType::UInt64, false),
            Field::new("hash_total", DataType::Int64, false),
            Field::new("output", DataType::Utf8, false),
            Field::new("started", ts(), false),
            Field::new("finished", ts(), false),
        ])
    }

    fn to_arrays(&self) -> Vec<ArrayRef> {
        let ts = |t: DateTime<Utc>| {
            Arc::new(
                TimestampMicrosecondArray::from_iter_values([t.timestamp_micros()])
                    .with_timezone("UTC"),
            ) as ArrayRef
        };
        vec![
            Arc::new(StringArray::from(vec![self.program.clone()])),
            Arc::new(Date32Array::from(vec![epoch_days(self.report_date)])),
            Arc::new(UInt64Array::from(vec![self.stats.rows_read])),
            Arc::new(UInt64Array::from(vec![self.stats.written])),
            Arc::new(UInt64Array::from(vec![self.stats.skipped])),
            Arc::new(UInt64Array::from(vec![self.stats.rejected])),
            Arc::new(Int64Array::from(vec![self.stats.hash_total])),
            Arc::new(StringArray::from(vec![self.output.clone()])),
            ts(self.started),
            ts(self.finished),
        ]
    }

    fn from_batch(batch: &RecordBatch, row: usize) -> Result<Self> {
        let u64_at = |name: &str| -> Result<u64> {
            Ok(column::<UInt64Array>(batch, name)?.value(row))
        };
        let ts_at = |name: &str| -> Result<DateTime<Utc>> {
            let micros = column::<TimestampMicrosecondArray>(batch, name)?.value(row);
            DateTime::from_timestamp_micros(micros)
                .with_context(|| format!("history column {} out of range", name))
        };
        let days = column::<Date32Array>(batch, "report_date")?.value(row);
        Ok(Self {
            program: column::<StringArray>(batch, "program")?
                .value(row)
                .to_string(),
            report_date: NaiveDate::from_num_days_from_ce_opt(days + UNIX_EPOCH_DAYS_CE)
                .context("history report_date out of range")?,
            stats: RunStats {
                rows_read: u64_at("rows_read")?,
                written: u64_at("written")?,
                skipped: u64_at("skipped")?,
                rejected: u64_at("rejected")?,
                hash_total: column::<Int64Array>(batch, "hash_total")?.value(row),
            },
            output: column::<StringArray>(batch, "output")?.value(row).to_string(),
            started: ts_at("started")?,
            finished: ts_at("finished")?,
        })
    }
}

fn epoch_days(d: NaiveDate) -> i32 {
    d.num_days_from_ce() - UNIX_EPOCH_DAYS_CE
}

fn column<'a, A: Array + 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a A> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<A>())
        .with_context(|| format!("history column {} missing or mistyped", name))
}

/// Parquet ledger of completed runs, one single-row file per run under
/// `runs/date=YYYYMMDD/`.
pub struct RunHistory {
    runs_dir: PathBuf,
}

impl RunHistory {
    pub fn new(history_dir: impl AsRef<Path>) -> Result<Self> {
        let runs_dir = history_dir.as_ref().join("runs");
        fs::create_dir_all(&runs_dir)
            .with_context(|| format!("creating history directory {}", runs_dir.display()))?;
        Ok(Self { runs_dir })
    }

    fn partition(&self, date: NaiveDate) -> PathBuf {
        self.runs_dir.join(format!("date={}", date.format("%Y%m%d")))
    }

    /// Writes `<program>---<micros>.parquet` through a temp file.
    pub fn record(&self, run: &RunRecord) -> Result<PathBuf> {
        let dir = self.partition(run.report_date);
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating history partition {}", dir.display()))?;

        let fname = format!("{}---{}.parquet", run.program, run.finished.timestamp_micros());
        let tmp = dir.join(format!("{}.tmp", fname));
        let final_path = dir.join(&fname);

        let schema = Arc::new(RunRecord::schema());
        let batch = RecordBatch::try_new(schema.clone(), run.to_arrays())
            .context("building history record batch")?;
        let file =
            File::create(&tmp).with_context(|| format!("creating history file {}", tmp.display()))?;
        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build();
        let mut writer = ArrowWriter::try_new(BufWriter::new(file), schema, Some(props))
            .context("creating Arrow writer for history")?;
        writer.write(&batch).context("writing history batch")?;
        writer.close().context("closing history writer")?;
        fs::rename(&tmp, &final_path)
            .with_context(|| format!("renaming {} into place", tmp.display()))?;
        debug!(path = %final_path.display(), "run recorded");
        Ok(final_path)
    }

    fn files(&self, date: NaiveDate) -> Result<Vec<PathBuf>> {
        let pattern = format!("{}/*---*.parquet", self.partition(date).display());
        let mut files: Vec<PathBuf> = glob(&pattern)?.filter_map(Result::ok).collect();
        files.sort();
        Ok(files)
    }

    /// Programs recorded as completed for `date`, from file names alone.
    pub fn completed(&self, date: NaiveDate) -> Result<HashSet<String>> {
        let mut set = HashSet::new();
        for path in self.files(date)? {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                // stem = "<program>---<micros>"
                if let Some(idx) = stem.rfind("---") {
                    set.insert(stem[..idx].to_string());
                }
            }
        }
        Ok(set)
    }

    /// Every recorded run for `date`, oldest first.
    pub fn runs(&self, date: NaiveDate) -> Result<Vec<RunRecord>> {
        let mut out = Vec::new();
        for path in self.files(date)? {
            let file =
                File::open(&path).with_context(|| format!("opening {}", path.display()))?;
            let mut reader = ParquetRecordBatchReaderBuilder::try_new(file)?
                .with_batch_size(1024)
                .build()?;
            while let Some(batch) = reader.next().transpose()? {
                for i in 0..batch.num_rows() {
                    out.push(
                        RunRecord::from_batch(&batch, i)
                            .with_context(|| format!("in {}", path.display()))?,
                    );
                }
            }
        }
        out.sort_by_key(|r| r.finished);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn run(program: &str, date: NaiveDate, minute: u32) -> RunRecord {
        RunRecord {
            program: program.to_string(),
            report_date: date,
            stats: RunStats {
                rows_read: 10,
                written: 8,
                skipped: 1,
                rejected: 1,
                hash_total: 123_456,
            },
            output: format!("out/{}.txt", program),
            started: Utc.with_ymd_and_hms(2024, 7, 1, 9, minute, 0).unwrap(),
            finished: Utc.with_ymd_and_hms(2024, 7, 1, 9, minute, 30).unwrap(),
        }
    }

    #[test]
    fn records_and_reads_back() -> Result<()> {
        let dir = tempdir()?;
        let history = RunHistory::new(dir.path())?;
        let june = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        let may = NaiveDate::from_ymd_opt(2024, 5, 31).unwrap();

        assert!(history.completed(june)?.is_empty());

        let path = history.record(&run("ccris-credit", june, 1))?;
        assert!(path.starts_with(dir.path().join("runs/date=20240630")));
        history.record(&run("bnm-deposit", june, 2))?;
        history.record(&run("loan-arrears", may, 3))?;

        let done = history.completed(june)?;
        assert_eq!(done.len(), 2);
        assert!(done.contains("ccris-credit"));
        assert!(done.contains("bnm-deposit"));
        assert!(history.completed(may)?.contains("loan-arrears"));

        let runs = history.runs(june)?;
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0], run("ccris-credit", june, 1));
        assert_eq!(runs[1].program, "bnm-deposit");

        // no temp files left behind
        let leftovers = fs::read_dir(dir.path().join("runs/date=20240630"))?
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);
        Ok(())
    }
}
