// src/lookup/mod.rs

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fs, path::Path};
use tracing::{debug, info};

const DEFAULT_FORMATS: &str = include_str!("default_formats.yaml");

/// A lookup key as written in YAML: bare numbers or quoted codes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Key {
    Num(i64),
    Text(String),
}

impl Key {
    fn as_num(&self) -> Option<i64> {
        match self {
            Key::Num(n) => Some(*n),
            Key::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormatEntry {
    /// Inclusive numeric range.
    Range { low: i64, high: i64, label: String },
    Value { value: Key, label: String },
}

/// One code table. Entries are tried in order; `other` catches the rest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormatTable {
    #[serde(default)]
    pub other: Option<String>,
    #[serde(default)]
    pub entries: Vec<FormatEntry>,
}

impl FormatTable {
    pub fn num(&self, n: i64) -> Option<&str> {
        self.entries
            .iter()
            .find_map(|e| match e {
                FormatEntry::Range { low, high, label } if (*low..=*high).contains(&n) => {
                    Some(label.as_str())
                }
                FormatEntry::Value { value, label } if value.as_num() == Some(n) => {
                    Some(label.as_str())
                }
                _ => None,
            })
            .or(self.other.as_deref())
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        let key = key.trim();
        let as_num = key.parse::<i64>().ok();
        self.entries
            .iter()
            .find_map(|e| match e {
                FormatEntry::Value {
                    value: Key::Text(s),
                    label,
                } if s.trim() == key => Some(label.as_str()),
                FormatEntry::Value {
                    value: Key::Num(v),
                    label,
                } if Some(*v) == as_num => Some(label.as_str()),
                FormatEntry::Range { low, high, label }
                    if as_num.is_some_and(|n| (*low..=*high).contains(&n)) =>
                {
                    Some(label.as_str())
                }
                _ => None,
            })
            .or(self.other.as_deref())
    }

    fn validate(&self, name: &str) -> Result<()> {
        for e in &self.entries {
            if let FormatEntry::Range { low, high, .. } = e {
                if low > high {
                    bail!("format {}: range {}-{} is inverted", name, low, high);
                }
            }
        }
        Ok(())
    }
}

/// Named collection of code tables.
#[derive(Debug, Clone, Default)]
pub struct Formats {
    tables: BTreeMap<String, FormatTable>,
}

impl Formats {
    pub fn from_yaml(text: &str) -> Result<Self> {
        let tables: BTreeMap<String, FormatTable> =
            serde_yaml::from_str(text).context("parsing format tables")?;
        for (name, table) in &tables {
            table.validate(name)?;
        }
        Ok(Self { tables })
    }

    pub fn builtin() -> Result<Self> {
        Self::from_yaml(DEFAULT_FORMATS)
    }

    /// Built-in tables, with any tables in `overrides` replacing them by name.
    pub fn load(overrides: Option<&Path>) -> Result<Self> {
        let mut formats = Self::builtin()?;
        if let Some(path) = overrides {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading formats file {}", path.display()))?;
            let custom = Self::from_yaml(&text)
                .with_context(|| format!("in formats file {}", path.display()))?;
            info!(file = %path.display(), tables = custom.tables.len(), "format overrides loaded");
            formats.merge(custom);
        }
        Ok(formats)
    }

    pub fn merge(&mut self, other: Formats) {
        for (name, table) in other.tables {
            debug!(table = %name, "format table replaced");
            self.tables.insert(name, table);
        }
    }

    pub fn table(&self, name: &str) -> Result<&FormatTable> {
        self.tables
            .get(name)
            .ok_or_else(|| anyhow!("format table '{}' is not defined", name))
    }
}
