// Parquet fixture helpers shared by the unit tests.

use anyhow::Result;
use arrow::{
    array::{ArrayRef, BinaryArray, Date32Array, Float64Array, Int64Array, StringArray},
    datatypes::{Field, Schema},
    record_batch::RecordBatch,
};
use chrono::NaiveDate;
use parquet::arrow::ArrowWriter;
use std::{fs::File, path::Path, sync::Arc};
use tracing_subscriber::{fmt, EnvFilter};

pub fn init_logging() {
    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

pub struct Col {
    name: String,
    array: ArrayRef,
}

impl Col {
    pub fn int(name: &str, values: Vec<Option<i64>>) -> Self {
        Self::new(name, Arc::new(Int64Array::from(values)))
    }

    pub fn float(name: &str, values: Vec<Option<f64>>) -> Self {
        Self::new(name, Arc::new(Float64Array::from(values)))
    }

    pub fn str(name: &str, values: Vec<Option<&str>>) -> Self {
        Self::new(name, Arc::new(StringArray::from(values)))
    }

    pub fn date(name: &str, values: Vec<Option<NaiveDate>>) -> Self {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        let days: Vec<Option<i32>> = values
            .into_iter()
            .map(|d| d.map(|d| d.signed_duration_since(epoch).num_days() as i32))
            .collect();
        Self::new(name, Arc::new(Date32Array::from(days)))
    }

    pub fn bytes(name: &str, values: Vec<Option<Vec<u8>>>) -> Self {
        let refs: Vec<Option<&[u8]>> = values.iter().map(|v| v.as_deref()).collect();
        Self::new(name, Arc::new(BinaryArray::from(refs)))
    }

    fn new(name: &str, array: ArrayRef) -> Self {
        Self {
            name: name.to_string(),
            array,
        }
    }
}

pub fn write_parquet(path: &Path, cols: Vec<Col>) -> Result<()> {
    let fields: Vec<Field> = cols
        .iter()
        .map(|c| Field::new(&c.name, c.array.data_type().clone(), true))
        .collect();
    let schema = Arc::new(Schema::new(fields));
    let arrays: Vec<ArrayRef> = cols.into_iter().map(|c| c.array).collect();
    let batch = RecordBatch::try_new(schema.clone(), arrays)?;

    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

/// Pack a non-negative integer as COMP-3 with a `C` sign nibble.
pub fn pack(n: u64, bytes: usize) -> Vec<u8> {
    let digits = format!("{:0>w$}C", n, w = bytes * 2 - 1);
    digits
        .as_bytes()
        .chunks(2)
        .map(|pair| {
            let hi = (pair[0] as char).to_digit(16).unwrap() as u8;
            let lo = (pair[1] as char).to_digit(16).unwrap() as u8;
            (hi << 4) | lo
        })
        .collect()
}
