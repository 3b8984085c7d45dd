//! The `inspect` command: shows how one file's header collapses and where
//! each of its columns lands in the canonical schema.

use std::fmt;

use anyhow::Result;
use log::info;

use crate::{
    cli::InspectArgs,
    collapse::collapse_headers,
    columns::build_index_map,
    config::{MergeConfig, MergeOptions},
    editor::Editor,
    error::MergeError,
    io_utils,
    merge::SourceTable,
    schema::{CanonicalSchema, ColumnBand},
    table,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnStatus {
    Key,
    Merge,
    New,
    Ignored,
}

impl fmt::Display for ColumnStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ColumnStatus::Key => "key",
            ColumnStatus::Merge => "merge",
            ColumnStatus::New => "new",
            ColumnStatus::Ignored => "ignored",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    pub position: usize,
    pub header: String,
    pub canonical: Option<String>,
    pub status: ColumnStatus,
}

#[derive(Debug, Clone)]
pub struct Inspection {
    pub header_rows: usize,
    pub unresolved_keys: Vec<String>,
    pub columns: Vec<ColumnMapping>,
}

pub fn execute(args: &InspectArgs) -> Result<()> {
    let config = MergeConfig::resolve(&args.schema)?;
    let options = config.merge_options()?;
    let editor = Editor::from_config(&config.preprocess)?;
    let encoding = io_utils::resolve_encoding(args.schema.input_encoding.as_deref())?;
    let delimiter = io_utils::resolve_input_delimiter(&args.input, config.explicit_delimiter()?);

    let mut source = io_utils::read_table(&args.input, delimiter, encoding)?;
    editor.apply(&mut source);
    let inspection = inspect_source(&source, &options)?;

    let headers = ["#", "header", "canonical", "status"];
    let rows = inspection
        .columns
        .iter()
        .map(|column| {
            vec![
                (column.position + 1).to_string(),
                column.header.clone(),
                column.canonical.clone().unwrap_or_default(),
                column.status.to_string(),
            ]
        })
        .collect::<Vec<_>>();
    table::print_table(&headers, &rows);
    info!(
        "'{}': {} header row(s), {} column(s)",
        source.name,
        inspection.header_rows,
        inspection.columns.len()
    );
    if !inspection.unresolved_keys.is_empty() {
        info!(
            "Key column(s) not found: {}",
            inspection.unresolved_keys.join(", ")
        );
    }
    Ok(())
}

/// Collapses and maps a single table against a fresh schema.
pub fn inspect_source(source: &SourceTable, options: &MergeOptions) -> Result<Inspection> {
    if options.fixed_columns.is_empty() {
        return Err(MergeError::NoFixedColumns.into());
    }
    let collapsed = collapse_headers(
        &source.name,
        &source.rows,
        &options.fixed_columns,
        &options.merge_columns,
        &options.ignore_columns,
    )?;
    let tag = options
        .tag_rule
        .as_ref()
        .and_then(|rule| rule.tag_for(&source.name));
    let mut schema = CanonicalSchema::new(&options.fixed_columns, &options.merge_columns);
    let index_map = build_index_map(
        &collapsed.headers,
        &mut schema,
        &options.ignore_columns,
        tag.as_deref(),
    );

    let columns = collapsed
        .headers
        .iter()
        .enumerate()
        .map(|(position, header)| {
            let canonical = index_map.get(position);
            let status = match canonical.and_then(|c| schema.band_of(c)) {
                Some(ColumnBand::Fixed) => ColumnStatus::Key,
                Some(ColumnBand::Merge) => ColumnStatus::Merge,
                Some(ColumnBand::Free) => ColumnStatus::New,
                None => ColumnStatus::Ignored,
            };
            ColumnMapping {
                position,
                header: header.clone(),
                canonical: canonical.map(|c| schema.columns()[c].clone()),
                status,
            }
        })
        .collect();

    Ok(Inspection {
        header_rows: collapsed.consumed,
        unresolved_keys: collapsed.unresolved,
        columns,
    })
}
