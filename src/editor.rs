//! Preprocessing applied to each table before it is merged.
//!
//! Source tables exported from spreadsheets carry legends, notes, empty
//! spacer columns and values that only make sense in the file name. An
//! [`Editor`] runs an ordered list of [`EditStep`]s over a table's rows to
//! clean that up.

use std::collections::{BTreeMap, HashSet};

use anyhow::Result;
use log::{debug, warn};
use regex::Regex;

use crate::{
    config::{PreprocessConfig, compile_pattern, extract_from_name},
    matcher::match_header,
    merge::SourceTable,
};

#[derive(Debug, Clone)]
pub enum EditStep {
    /// Blank every cell that header-matches one of these values.
    RemoveContent(Vec<String>),
    /// Drop columns without a single non-whitespace cell.
    RemoveEmptyColumns,
    /// Drop rows whose cells are all empty.
    TrimBlankRows,
    /// Pad every row to the widest row.
    ExpandRows,
    /// Overwrite first-row cells by position; negative positions count from
    /// the end.
    SetHeaders(BTreeMap<i64, String>),
    /// Append a column whose value is extracted from the file name.
    AddColumn { header: String, pattern: Regex },
}

#[derive(Debug, Clone, Default)]
pub struct Editor {
    steps: Vec<EditStep>,
}

impl Editor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_step(mut self, step: EditStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Builds the pipeline in its canonical order: content removal, empty
    /// column removal, blank row trimming, row expansion, header overrides,
    /// then file-name columns.
    pub fn from_config(config: &PreprocessConfig) -> Result<Self> {
        let mut editor = Self::new();
        if !config.remove_content.is_empty() {
            editor = editor.with_step(EditStep::RemoveContent(config.remove_content.clone()));
        }
        if config.remove_empty_columns {
            editor = editor.with_step(EditStep::RemoveEmptyColumns);
        }
        if config.trim_blank_rows {
            editor = editor.with_step(EditStep::TrimBlankRows);
        }
        if config.expand_rows {
            editor = editor.with_step(EditStep::ExpandRows);
        }
        if !config.custom_headers.is_empty() {
            editor = editor.with_step(EditStep::SetHeaders(config.custom_headers.clone()));
        }
        for column in &config.add_columns {
            editor = editor.with_step(EditStep::AddColumn {
                header: column.header.clone(),
                pattern: compile_pattern(&column.pattern)?,
            });
        }
        Ok(editor)
    }

    pub fn steps(&self) -> &[EditStep] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn apply(&self, table: &mut SourceTable) {
        for step in &self.steps {
            match step {
                EditStep::RemoveContent(values) => remove_content(&mut table.rows, values),
                EditStep::RemoveEmptyColumns => remove_empty_columns(&mut table.rows),
                EditStep::TrimBlankRows => table.rows.retain(|row| !is_blank(row)),
                EditStep::ExpandRows => {
                    let width = table.width();
                    for row in &mut table.rows {
                        row.resize(width, String::new());
                    }
                }
                EditStep::SetHeaders(headers) => set_headers(&mut table.rows, headers),
                EditStep::AddColumn { header, pattern } => {
                    let value = extract_from_name(pattern, &table.name).unwrap_or_else(|| {
                        warn!(
                            "Pattern '{}' does not match '{}'; column '{header}' left empty",
                            pattern.as_str(),
                            table.name
                        );
                        String::new()
                    });
                    add_column(&mut table.rows, header, &value);
                }
            }
        }
        debug!(
            "Applied {} edit step(s) to '{}' ({} row(s) remain)",
            self.steps.len(),
            table.name,
            table.rows.len()
        );
    }
}

fn is_blank(row: &[String]) -> bool {
    row.iter().all(String::is_empty)
}

fn remove_content(rows: &mut [Vec<String>], unwanted: &[String]) {
    for cell in rows.iter_mut().flatten() {
        if match_header(cell.as_str(), unwanted).is_some() {
            cell.clear();
        }
    }
}

fn remove_empty_columns(rows: &mut [Vec<String>]) {
    let has_content: HashSet<usize> = rows
        .iter()
        .flat_map(|row| {
            row.iter()
                .enumerate()
                .filter(|(_, cell)| !cell.trim().is_empty())
                .map(|(idx, _)| idx)
        })
        .collect();
    for row in rows.iter_mut() {
        let mut idx = 0usize;
        row.retain(|_| {
            let keep = has_content.contains(&idx);
            idx += 1;
            keep
        });
    }
}

fn set_headers(rows: &mut [Vec<String>], headers: &BTreeMap<i64, String>) {
    let Some(first) = rows.first_mut() else {
        return;
    };
    let len = first.len() as i64;
    for (&position, name) in headers {
        let idx = if position < 0 { len + position } else { position };
        if (0..len).contains(&idx) {
            first[idx as usize] = name.clone();
        }
    }
}

fn add_column(rows: &mut [Vec<String>], header: &str, value: &str) {
    let Some((first, rest)) = rows.split_first_mut() else {
        return;
    };
    first.push(header.to_string());
    for row in rest.iter_mut().filter(|row| !is_blank(row)) {
        row.push(value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[&[&str]]) -> SourceTable {
        SourceTable::from_rows("ICO12019 - 3.csv", rows)
    }

    #[test]
    fn remove_content_blanks_fuzzy_matches() {
        let mut source = table(&[&["RUT", "Observaciones:"], &["1", "NOTAS"]]);
        Editor::new()
            .with_step(EditStep::RemoveContent(vec![
                "observaciones:".into(),
                "nota".into(),
            ]))
            .apply(&mut source);
        assert_eq!(source.rows, vec![vec!["RUT", ""], vec!["1", ""]]);
    }

    #[test]
    fn remove_empty_columns_drops_whitespace_only_columns() {
        let mut source = table(&[&["RUT", " ", "Nombre"], &["1", "", "Ana"], &["2"]]);
        Editor::new()
            .with_step(EditStep::RemoveEmptyColumns)
            .apply(&mut source);
        assert_eq!(
            source.rows,
            vec![vec!["RUT", "Nombre"], vec!["1", "Ana"], vec!["2"]]
        );
    }

    #[test]
    fn trim_and_expand_rows() {
        let mut source = table(&[&["RUT", "Nombre"], &["", ""], &["1"]]);
        Editor::new()
            .with_step(EditStep::TrimBlankRows)
            .with_step(EditStep::ExpandRows)
            .apply(&mut source);
        assert_eq!(source.rows, vec![vec!["RUT", "Nombre"], vec!["1", ""]]);
    }

    #[test]
    fn set_headers_supports_negative_positions() {
        let mut source = table(&[&["a", "b", "c"], &["1", "2", "3"]]);
        let headers = BTreeMap::from([(0, "N".to_string()), (-1, "?".to_string()), (9, "x".to_string())]);
        Editor::new()
            .with_step(EditStep::SetHeaders(headers))
            .apply(&mut source);
        assert_eq!(source.rows[0], vec!["N", "b", "?"]);
        assert_eq!(source.rows[1], vec!["1", "2", "3"]);
    }

    #[test]
    fn add_column_extracts_value_from_file_name() {
        let mut source = table(&[&["RUT"], &["1"], &[""], &["2"]]);
        Editor::new()
            .with_step(EditStep::AddColumn {
                header: "YEAR".into(),
                pattern: Regex::new(r"[A-Za-z]{3}\d(\d{4})").unwrap(),
            })
            .apply(&mut source);
        assert_eq!(
            source.rows,
            vec![vec!["RUT", "YEAR"], vec!["1", "2019"], vec![""], vec!["2", "2019"]]
        );
    }

    #[test]
    fn add_column_without_match_leaves_values_empty() {
        let mut source = table(&[&["RUT"], &["1"]]);
        Editor::new()
            .with_step(EditStep::AddColumn {
                header: "SHEET".into(),
                pattern: Regex::new(r"sheet(\d+)").unwrap(),
            })
            .apply(&mut source);
        assert_eq!(source.rows, vec![vec!["RUT", "SHEET"], vec!["1", ""]]);
    }

    #[test]
    fn from_config_orders_steps_canonically() {
        let config = PreprocessConfig {
            remove_content: vec!["x".into()],
            remove_empty_columns: true,
            trim_blank_rows: true,
            expand_rows: true,
            custom_headers: BTreeMap::from([(0, "N".to_string())]),
            add_columns: vec![crate::config::AddColumnConfig {
                header: "YEAR".into(),
                pattern: r"\d{4}".into(),
            }],
        };
        let editor = Editor::from_config(&config).unwrap();
        let kinds: Vec<&str> = editor
            .steps()
            .iter()
            .map(|step| match step {
                EditStep::RemoveContent(_) => "content",
                EditStep::RemoveEmptyColumns => "columns",
                EditStep::TrimBlankRows => "trim",
                EditStep::ExpandRows => "expand",
                EditStep::SetHeaders(_) => "headers",
                EditStep::AddColumn { .. } => "add",
            })
            .collect();
        assert_eq!(kinds, vec!["content", "columns", "trim", "expand", "headers", "add"]);
    }

    #[test]
    fn from_config_rejects_invalid_patterns() {
        let config = PreprocessConfig {
            add_columns: vec![crate::config::AddColumnConfig {
                header: "YEAR".into(),
                pattern: "(".into(),
            }],
            ..PreprocessConfig::default()
        };
        assert!(Editor::from_config(&config).is_err());
    }
}
