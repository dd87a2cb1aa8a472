// src/extract/reader.rs

use anyhow::{bail, Context, Result};
use arrow::{
    array::{Array, AsArray},
    compute::cast,
    datatypes::{
        DataType, Date32Type, Date64Type, Decimal128Type, Float32Type, Float64Type, Int16Type,
        Int32Type, Int64Type, Int8Type, TimeUnit, TimestampMicrosecondType,
        TimestampMillisecondType, TimestampNanosecondType, TimestampSecondType, UInt16Type,
        UInt32Type, UInt64Type, UInt8Type,
    },
    record_batch::RecordBatch,
};
use chrono::{DateTime, NaiveDate, TimeDelta};
use glob::glob;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::{
    fs::File,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

use super::value::{Row, Value};

const BATCH_SIZE: usize = 1024;

/// Resolve `pattern` under `dir` and return every match in sorted order.
pub fn resolve_files(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let full = dir.join(pattern);
    let full = full.to_string_lossy();
    let mut paths: Vec<PathBuf> = glob(&full)
        .with_context(|| format!("bad glob pattern '{}'", full))?
        .filter_map(Result::ok)
        .filter(|p| p.is_file())
        .collect();
    paths.sort();
    Ok(paths)
}

/// Load a logical dataset: every parquet file matching `pattern`, in path
/// order, concatenated into one row list.
#[tracing::instrument(level = "info", skip(dir), fields(dir = %dir.display()))]
pub fn load_dataset(dir: &Path, name: &str, pattern: &str) -> Result<Vec<Row>> {
    let files = resolve_files(dir, pattern)?;
    if files.is_empty() {
        bail!(
            "dataset {} has no files matching '{}' under {}",
            name,
            pattern,
            dir.display()
        );
    }

    let mut rows = Vec::new();
    for path in &files {
        let before = rows.len();
        rows.extend(read_parquet_rows(path)?);
        debug!(file = %path.display(), rows = rows.len() - before, "read extract file");
    }
    info!(dataset = name, files = files.len(), rows = rows.len(), "dataset loaded");
    Ok(rows)
}

pub fn read_parquet_rows(path: &Path) -> Result<Vec<Row>> {
    let file =
        File::open(path).with_context(|| format!("opening parquet {}", path.display()))?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .with_context(|| format!("reading parquet footer of {}", path.display()))?
        .with_batch_size(BATCH_SIZE)
        .build()?;

    let mut rows = Vec::new();
    for batch in reader {
        let batch = batch.with_context(|| format!("decoding batch in {}", path.display()))?;
        rows.extend(batch_to_rows(&batch)?);
    }
    Ok(rows)
}

/// Transpose a columnar batch into rows.
pub fn batch_to_rows(batch: &RecordBatch) -> Result<Vec<Row>> {
    let schema = batch.schema();
    let mut rows = vec![Row::new(); batch.num_rows()];
    for (field, column) in schema.fields().iter().zip(batch.columns()) {
        let values = column_values(column.as_ref())
            .with_context(|| format!("converting column {}", field.name()))?;
        for (row, v) in rows.iter_mut().zip(values) {
            row.set(field.name(), v);
        }
    }
    Ok(rows)
}

macro_rules! primitive {
    ($array:expr, $t:ty, $conv:expr) => {{
        let arr = $array.as_primitive::<$t>();
        (0..arr.len())
            .map(|i| {
                if arr.is_null(i) {
                    Value::Null
                } else {
                    ($conv)(arr.value(i))
                }
            })
            .collect()
    }};
}

macro_rules! each {
    ($arr:expr, $conv:expr) => {{
        let arr = $arr;
        (0..arr.len())
            .map(|i| {
                if arr.is_null(i) {
                    Value::Null
                } else {
                    ($conv)(arr.value(i))
                }
            })
            .collect()
    }};
}

fn unix_date(secs: i64) -> Value {
    DateTime::from_timestamp(secs, 0)
        .map(|dt| Value::Date(dt.date_naive()))
        .unwrap_or(Value::Null)
}

fn epoch_days(days: i64) -> Value {
    NaiveDate::from_ymd_opt(1970, 1, 1)
        .and_then(|epoch| epoch.checked_add_signed(TimeDelta::try_days(days)?))
        .map(Value::Date)
        .unwrap_or(Value::Null)
}

fn column_values(array: &dyn Array) -> Result<Vec<Value>> {
    let values: Vec<Value> = match array.data_type() {
        DataType::Null => vec![Value::Null; array.len()],
        DataType::Boolean => each!(array.as_boolean(), |b: bool| Value::Int(b as i64)),
        DataType::Int8 => primitive!(array, Int8Type, |v: i8| Value::Int(v as i64)),
        DataType::Int16 => primitive!(array, Int16Type, |v: i16| Value::Int(v as i64)),
        DataType::Int32 => primitive!(array, Int32Type, |v: i32| Value::Int(v as i64)),
        DataType::Int64 => primitive!(array, Int64Type, Value::Int),
        DataType::UInt8 => primitive!(array, UInt8Type, |v: u8| Value::Int(v as i64)),
        DataType::UInt16 => primitive!(array, UInt16Type, |v: u16| Value::Int(v as i64)),
        DataType::UInt32 => primitive!(array, UInt32Type, |v: u32| Value::Int(v as i64)),
        DataType::UInt64 => primitive!(array, UInt64Type, |v: u64| Value::Int(v as i64)),
        DataType::Float32 => primitive!(array, Float32Type, |v: f32| Value::Float(v as f64)),
        DataType::Float64 => primitive!(array, Float64Type, Value::Float),
        DataType::Decimal128(_, scale) => {
            let div = 10f64.powi(*scale as i32);
            primitive!(array, Decimal128Type, |v: i128| Value::Float(v as f64 / div))
        }
        DataType::Date32 => primitive!(array, Date32Type, |v: i32| epoch_days(v as i64)),
        DataType::Date64 => {
            primitive!(array, Date64Type, |v: i64| unix_date(v.div_euclid(1_000)))
        }
        DataType::Timestamp(TimeUnit::Second, _) => {
            primitive!(array, TimestampSecondType, unix_date)
        }
        DataType::Timestamp(TimeUnit::Millisecond, _) => {
            primitive!(array, TimestampMillisecondType, |v: i64| unix_date(
                v.div_euclid(1_000)
            ))
        }
        DataType::Timestamp(TimeUnit::Microsecond, _) => {
            primitive!(array, TimestampMicrosecondType, |v: i64| unix_date(
                v.div_euclid(1_000_000)
            ))
        }
        DataType::Timestamp(TimeUnit::Nanosecond, _) => {
            primitive!(array, TimestampNanosecondType, |v: i64| unix_date(
                v.div_euclid(1_000_000_000)
            ))
        }
        DataType::Utf8 => each!(array.as_string::<i32>(), |s: &str| Value::Str(s.to_string())),
        DataType::LargeUtf8 => {
            each!(array.as_string::<i64>(), |s: &str| Value::Str(s.to_string()))
        }
        DataType::Utf8View => each!(array.as_string_view(), |s: &str| Value::Str(s.to_string())),
        DataType::Binary => each!(array.as_binary::<i32>(), |b: &[u8]| Value::Bytes(b.to_vec())),
        DataType::LargeBinary => {
            each!(array.as_binary::<i64>(), |b: &[u8]| Value::Bytes(b.to_vec()))
        }
        DataType::FixedSizeBinary(_) => {
            each!(array.as_fixed_size_binary(), |b: &[u8]| Value::Bytes(b.to_vec()))
        }
        DataType::Dictionary(_, _) => {
            let flat = cast(array, &DataType::Utf8).context("flattening dictionary column")?;
            return column_values(flat.as_ref());
        }
        other => {
            debug!(data_type = ?other, "unsupported column type; read as missing");
            vec![Value::Null; array.len()]
        }
    };
    Ok(values)
}
