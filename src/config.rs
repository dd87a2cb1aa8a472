// src/config.rs

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

/// Run configuration, read from YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Four-character reporting institution code carried on every record.
    pub institution_code: String,
    pub institution_name: String,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub history_dir: PathBuf,
    /// Fixed reporting date; defaults to the previous month end.
    pub report_date: Option<NaiveDate>,
    /// Optional YAML file of format tables that replace the built-ins.
    pub formats: Option<PathBuf>,
    /// Dataset name → glob (relative to `input_dir`).
    pub datasets: HashMap<String, String>,
    /// Program name → output file name (relative to `output_dir`).
    pub outputs: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            institution_code: "0000".to_string(),
            institution_name: "REPORTING INSTITUTION".to_string(),
            input_dir: PathBuf::from("input"),
            output_dir: PathBuf::from("output"),
            history_dir: PathBuf::from("history"),
            report_date: None,
            formats: None,
            datasets: HashMap::new(),
            outputs: HashMap::new(),
        }
    }
}

impl Config {
    pub fn from_yaml(text: &str) -> Result<Self> {
        let cfg: Config = serde_yaml::from_str(text).context("parsing config YAML")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from `path`. Relative directories in the file are taken
    /// relative to the file's own directory.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let mut cfg =
            Self::from_yaml(&text).with_context(|| format!("in config {}", path.display()))?;
        if let Some(base) = path.parent() {
            cfg.rebase(base);
        }
        Ok(cfg)
    }

    fn rebase(&mut self, base: &Path) {
        for dir in [
            &mut self.input_dir,
            &mut self.output_dir,
            &mut self.history_dir,
        ] {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
        if let Some(f) = self.formats.as_mut() {
            if f.is_relative() {
                *f = base.join(&*f);
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        let code = &self.institution_code;
        if code.len() != 4 || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            bail!(
                "institution_code must be 4 alphanumeric characters, got '{}'",
                code
            );
        }
        Ok(())
    }

    /// Glob for a dataset; `LNNOTE` defaults to `lnnote*.parquet`.
    pub fn dataset_pattern(&self, name: &str) -> String {
        self.datasets
            .get(name)
            .cloned()
            .unwrap_or_else(|| format!("{}*.parquet", name.to_ascii_lowercase()))
    }

    pub fn output_path(&self, program: &str, default_name: &str) -> PathBuf {
        let name = self
            .outputs
            .get(program)
            .map(String::as_str)
            .unwrap_or(default_name);
        self.output_dir.join(name)
    }
}
