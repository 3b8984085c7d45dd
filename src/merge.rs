//! Identifier-keyed union merge of heterogeneous tables.
//!
//! Tables are ingested strictly in the order given. Each one has its header
//! collapsed, its columns mapped onto the shared [`CanonicalSchema`] (which
//! may grow), and its data rows folded into one row per identifier. A cell
//! is only ever overwritten by a later non-empty value, so blanks never erase
//! data and later tables win conflicts.
//!
//! An identifier is the tuple of fixed-key values in canonical order. Two
//! rows share an identifier only when every key value is exactly equal.

use anyhow::Result;
use indexmap::IndexMap;
use itertools::Itertools;
use log::{debug, info, warn};
use serde::Serialize;

use crate::{
    collapse::collapse_headers,
    columns::{ColumnIndexMap, build_index_map},
    config::MergeOptions,
    error::MergeError,
    schema::CanonicalSchema,
};

/// One input table, fully read into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceTable {
    /// File name; also the subject of tag and column patterns.
    pub name: String,
    pub rows: Vec<Vec<String>>,
}

impl SourceTable {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// Builds a table from borrowed cells; mostly useful in tests.
    pub fn from_rows(name: &str, rows: &[&[&str]]) -> Self {
        Self::new(
            name,
            rows.iter()
                .map(|row| row.iter().map(|cell| cell.to_string()).collect())
                .collect(),
        )
    }

    /// Width of the widest row.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }
}

/// What happened to a single table during a merge.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct FileSummary {
    pub name: String,
    pub tag: Option<String>,
    pub header_rows: usize,
    pub data_rows: usize,
    pub skipped_rows: usize,
    pub padded_rows: usize,
    pub new_columns: Vec<String>,
    pub unresolved_keys: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MergeReport {
    pub files: Vec<FileSummary>,
    pub identifiers: usize,
    pub columns: Vec<String>,
}

/// Result of a merge run: canonical headers plus one row per identifier, in
/// first-seen order. Every row has exactly `headers.len()` cells.
#[derive(Debug, Clone)]
pub struct MergedTable {
    pub headers: Vec<String>,
    /// Key tuple → row.
    pub rows: IndexMap<Vec<String>, Vec<String>>,
    pub files: Vec<FileSummary>,
}

impl MergedTable {
    /// Row whose fixed-key values are exactly `key`, in canonical order.
    pub fn row(&self, key: &[&str]) -> Option<&[String]> {
        let key: Vec<String> = key.iter().map(|value| value.to_string()).collect();
        self.rows.get(&key).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows in output order, without their identifiers.
    pub fn ordered_rows(&self) -> Vec<Vec<String>> {
        self.rows.values().cloned().collect()
    }

    pub fn report(&self) -> MergeReport {
        MergeReport {
            files: self.files.clone(),
            identifiers: self.rows.len(),
            columns: self.headers.clone(),
        }
    }
}

/// Owns the canonical schema and the identifier table for one merge run.
#[derive(Debug)]
pub struct MergeEngine {
    options: MergeOptions,
    schema: CanonicalSchema,
    rows: IndexMap<Vec<String>, Vec<String>>,
    files: Vec<FileSummary>,
}

impl MergeEngine {
    pub fn new(options: MergeOptions) -> Result<Self> {
        if options.fixed_columns.is_empty() {
            return Err(MergeError::NoFixedColumns.into());
        }
        let schema = CanonicalSchema::new(&options.fixed_columns, &options.merge_columns);
        Ok(Self {
            options,
            schema,
            rows: IndexMap::new(),
            files: Vec::new(),
        })
    }

    pub fn schema(&self) -> &CanonicalSchema {
        &self.schema
    }

    /// Collapses, maps and folds one table into the identifier table.
    pub fn ingest(&mut self, source: &SourceTable) -> Result<FileSummary> {
        let width = source.width();
        let padded_rows = source.rows.iter().filter(|row| row.len() < width).count();
        let collapsed = collapse_headers(
            &source.name,
            &source.rows,
            &self.options.fixed_columns,
            &self.options.merge_columns,
            &self.options.ignore_columns,
        )?;
        let tag = self.tag_for(&source.name);
        let index_map = build_index_map(
            &collapsed.headers,
            &mut self.schema,
            &self.options.ignore_columns,
            tag.as_deref(),
        );
        debug!(
            "'{}' header [{}] -> {:?}",
            source.name,
            collapsed.headers.iter().join(" | "),
            index_map.positions()
        );
        if !index_map.discovered().is_empty() && !self.options.expect_new_columns {
            warn!(
                "'{}' introduced {} undeclared column(s): {}",
                source.name,
                index_map.discovered().len(),
                index_map.discovered().iter().join(", ")
            );
        }

        let mut summary = FileSummary {
            name: source.name.clone(),
            tag,
            header_rows: collapsed.consumed,
            padded_rows,
            new_columns: index_map.discovered().to_vec(),
            unresolved_keys: collapsed.unresolved,
            ..FileSummary::default()
        };

        for row in &source.rows[collapsed.consumed..] {
            if row.iter().all(String::is_empty) {
                summary.skipped_rows += 1;
                continue;
            }
            self.fold_row(row, &index_map);
            summary.data_rows += 1;
        }

        info!(
            "Merged '{}': {} row(s), {} header row(s), {} new column(s)",
            summary.name,
            summary.data_rows,
            summary.header_rows,
            summary.new_columns.len()
        );
        self.files.push(summary.clone());
        Ok(summary)
    }

    fn tag_for(&self, name: &str) -> Option<String> {
        let rule = self.options.tag_rule.as_ref()?;
        let tag = rule.tag_for(name);
        if tag.is_none() {
            warn!(
                "Tag pattern '{}' does not match '{name}'; new columns keep their bare names",
                rule.pattern()
            );
        }
        tag
    }

    fn fold_row(&mut self, row: &[String], index_map: &ColumnIndexMap) {
        let width = self.schema.len();
        let mut projected = vec![String::new(); width];
        for (local, canonical) in index_map.mapped() {
            let value = row.get(local).map(String::as_str).unwrap_or("");
            if !value.is_empty() {
                projected[canonical] = value.to_string();
            }
        }

        let key = projected[self.schema.fixed_range()].to_vec();
        let merged = self.rows.entry(key).or_default();
        if merged.len() < width {
            merged.resize(width, String::new());
        }
        for (cell, value) in merged.iter_mut().zip(projected) {
            if !value.is_empty() {
                *cell = value;
            }
        }
    }

    /// Ends the run, padding every row to the final schema width.
    pub fn finish(self) -> MergedTable {
        let width = self.schema.len();
        let mut rows = self.rows;
        for row in rows.values_mut() {
            row.resize(width, String::new());
        }
        info!(
            "Merged {} file(s) into {} identifier(s) across {} column(s)",
            self.files.len(),
            rows.len(),
            width
        );
        MergedTable {
            headers: self.schema.into_columns(),
            rows,
            files: self.files,
        }
    }
}

/// Merges `sources` in order.
pub fn merge_sources(sources: &[SourceTable], options: &MergeOptions) -> Result<MergedTable> {
    if sources.is_empty() {
        return Err(MergeError::NoInputs.into());
    }
    let mut engine = MergeEngine::new(options.clone())?;
    for source in sources {
        engine.ingest(source)?;
    }
    Ok(engine.finish())
}
