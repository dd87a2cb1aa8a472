// src/output.rs

use anyhow::{bail, Context, Result};
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};
use tracing::debug;

/// Writes fixed-length `\n`-terminated records to a hidden temp file and
/// renames it over `path` on `finish`. Dropping the writer unfinished
/// removes the temp file, so a failed run never leaves a partial output.
pub struct FixedWidthWriter {
    path: PathBuf,
    tmp_path: PathBuf,
    lrecl: usize,
    out: Option<BufWriter<File>>,
    records: u64,
}

impl FixedWidthWriter {
    pub fn create(path: &Path, lrecl: usize) -> Result<Self> {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)
            .with_context(|| format!("creating output directory {}", dir.display()))?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("output path {} has no file name", path.display()))?;
        let tmp_path = dir.join(format!(".{}.tmp", file_name));
        let file = File::create(&tmp_path)
            .with_context(|| format!("creating {}", tmp_path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            tmp_path,
            lrecl,
            out: Some(BufWriter::new(file)),
            records: 0,
        })
    }

    pub fn lrecl(&self) -> usize {
        self.lrecl
    }

    /// Append one record. A record of the wrong length is a layout bug in
    /// the calling program, not a data problem, so it fails the run.
    pub fn write(&mut self, record: &str) -> Result<()> {
        if record.len() != self.lrecl {
            bail!(
                "record {} of {} is {} bytes, expected {}",
                self.records + 1,
                self.path.display(),
                record.len(),
                self.lrecl
            );
        }
        let out = self.out.as_mut().context("writer already finished")?;
        out.write_all(record.as_bytes())?;
        out.write_all(b"\n")?;
        self.records += 1;
        Ok(())
    }

    /// Flush and rename into place. On failure the temp file is removed
    /// and `path` is left as it was.
    pub fn finish(mut self) -> Result<u64> {
        let out = self.out.take();
        if let Err(e) = self.commit(out) {
            let _ = fs::remove_file(&self.tmp_path);
            return Err(e);
        }
        debug!(path = %self.path.display(), records = self.records, "output written");
        Ok(self.records)
    }

    fn commit(&self, out: Option<BufWriter<File>>) -> Result<()> {
        if let Some(mut out) = out {
            out.flush()
                .with_context(|| format!("flushing {}", self.tmp_path.display()))?;
        }
        fs::rename(&self.tmp_path, &self.path).with_context(|| {
            format!(
                "renaming {} -> {}",
                self.tmp_path.display(),
                self.path.display()
            )
        })
    }
}

impl Drop for FixedWidthWriter {
    fn drop(&mut self) {
        if self.out.take().is_some() {
            let _ = fs::remove_file(&self.tmp_path);
        }
    }
}
