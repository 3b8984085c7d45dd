//! Merge configuration: YAML file loading, command-line overrides, and the
//! regex rules that derive values from file names.

use std::{collections::BTreeMap, fs, path::Path};

use anyhow::{Context, Result, anyhow};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    cli::{SchemaArgs, parse_delimiter},
    error::MergeError,
    io_utils::DEFAULT_CSV_DELIMITER,
};

/// On-disk configuration. Every key is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MergeConfig {
    pub delimiter: Option<String>,
    pub fixed_columns: Vec<String>,
    pub merge_columns: Vec<String>,
    pub ignore_columns: Vec<String>,
    pub expect_new_columns: bool,
    pub tag_pattern: Option<String>,
    pub extensions: Vec<String>,
    pub preprocess: PreprocessConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Cell values to blank out wherever they appear.
    pub remove_content: Vec<String>,
    pub remove_empty_columns: bool,
    pub trim_blank_rows: bool,
    pub expand_rows: bool,
    /// Header overrides by position; negative positions count from the end.
    pub custom_headers: BTreeMap<i64, String>,
    pub add_columns: Vec<AddColumnConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AddColumnConfig {
    pub header: String,
    pub pattern: String,
}

impl MergeConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).with_context(|| format!("Opening config {path:?}"))?;
        let config = serde_yaml::from_str(&raw)
            .with_context(|| format!("Parsing YAML config {path:?}"))?;
        Ok(config)
    }

    /// Loads the file named by `--config` (if any) and layers the remaining
    /// command-line flags on top of it.
    pub fn resolve(args: &SchemaArgs) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_overrides(args);
        Ok(config)
    }

    /// List flags replace the configured lists when given; boolean flags
    /// can only switch a setting on.
    pub fn apply_overrides(&mut self, args: &SchemaArgs) {
        let cleaned = |values: &[String]| {
            values
                .iter()
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        };
        let keys = cleaned(&args.keys);
        if !keys.is_empty() {
            self.fixed_columns = keys;
        }
        let merge = cleaned(&args.merge_columns);
        if !merge.is_empty() {
            self.merge_columns = merge;
        }
        let ignore = cleaned(&args.ignore_columns);
        if !ignore.is_empty() {
            self.ignore_columns = ignore;
        }
        if args.expect_new_columns {
            self.expect_new_columns = true;
        }
        if let Some(pattern) = &args.tag_pattern {
            self.tag_pattern = Some(pattern.clone());
        }
        if let Some(delimiter) = args.delimiter {
            self.delimiter = Some((delimiter as char).to_string());
        }
    }

    /// Delimiter set by the file or the command line, if any. Without one,
    /// each input's delimiter is resolved from its extension.
    pub fn explicit_delimiter(&self) -> Result<Option<u8>> {
        self.delimiter
            .as_deref()
            .map(|value| parse_delimiter(value).map_err(|err| anyhow!("Invalid delimiter: {err}")))
            .transpose()
    }

    pub fn delimiter(&self) -> Result<u8> {
        Ok(self.explicit_delimiter()?.unwrap_or(DEFAULT_CSV_DELIMITER))
    }

    pub fn merge_options(&self) -> Result<MergeOptions> {
        let tag_rule = self
            .tag_pattern
            .as_deref()
            .filter(|pattern| !pattern.is_empty())
            .map(TagRule::new)
            .transpose()?;
        Ok(MergeOptions {
            delimiter: self.delimiter()?,
            fixed_columns: self.fixed_columns.clone(),
            merge_columns: self.merge_columns.clone(),
            ignore_columns: self.ignore_columns.clone(),
            expect_new_columns: self.expect_new_columns,
            tag_rule,
        })
    }
}

/// Runtime settings of a merge run.
#[derive(Debug, Clone)]
pub struct MergeOptions {
    pub delimiter: u8,
    pub fixed_columns: Vec<String>,
    pub merge_columns: Vec<String>,
    pub ignore_columns: Vec<String>,
    pub expect_new_columns: bool,
    pub tag_rule: Option<TagRule>,
}

impl MergeOptions {
    pub fn new(fixed_columns: &[&str]) -> Self {
        Self {
            delimiter: DEFAULT_CSV_DELIMITER,
            fixed_columns: fixed_columns.iter().map(|c| c.to_string()).collect(),
            merge_columns: Vec::new(),
            ignore_columns: Vec::new(),
            expect_new_columns: true,
            tag_rule: None,
        }
    }

    pub fn with_merge_columns(mut self, columns: &[&str]) -> Self {
        self.merge_columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn with_ignore_columns(mut self, columns: &[&str]) -> Self {
        self.ignore_columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn with_tag_rule(mut self, rule: TagRule) -> Self {
        self.tag_rule = Some(rule);
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn expecting_new_columns(mut self, expect: bool) -> Self {
        self.expect_new_columns = expect;
        self
    }
}

/// Derives a per-file tag from the file name.
#[derive(Debug, Clone)]
pub struct TagRule {
    regex: Regex,
}

impl TagRule {
    pub fn new(pattern: &str) -> Result<Self, MergeError> {
        Ok(Self {
            regex: compile_pattern(pattern)?,
        })
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    pub fn tag_for(&self, file_name: &str) -> Option<String> {
        extract_from_name(&self.regex, file_name)
    }
}

pub fn compile_pattern(pattern: &str) -> Result<Regex, MergeError> {
    Regex::new(pattern).map_err(|source| MergeError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Capture group 1 when the pattern has one and it participated, otherwise
/// the whole match.
pub fn extract_from_name(regex: &Regex, file_name: &str) -> Option<String> {
    let captures = regex.captures(file_name)?;
    captures
        .get(1)
        .or_else(|| captures.get(0))
        .map(|m| m.as_str().to_string())
}
