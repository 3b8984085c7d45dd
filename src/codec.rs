//! Quote-aware tokenizing and quoting of delimited text.
//!
//! Everything here sits on top of the `csv` crate. Output always quotes every
//! field so that a serialized table re-parses to exactly the same cells.

use std::io::Write;

use anyhow::{Context, Result};
use csv::{QuoteStyle, ReaderBuilder, Terminator, Writer, WriterBuilder};

fn reader_builder(delimiter: u8) -> ReaderBuilder {
    let mut builder = ReaderBuilder::new();
    builder
        .has_headers(false)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true);
    builder
}

/// Parses a whole table into rows of unquoted values.
///
/// Records may have differing widths; blank lines are skipped by the reader.
pub fn parse_rows(text: &str, delimiter: u8) -> Result<Vec<Vec<String>>> {
    let mut reader = reader_builder(delimiter).from_reader(text.as_bytes());
    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Parsing line {}", idx + 1))?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

/// Splits a single delimited line into its unquoted values.
pub fn split_line(line: &str, delimiter: u8) -> Result<Vec<String>> {
    let mut rows = parse_rows(line, delimiter)?;
    Ok(if rows.is_empty() {
        Vec::new()
    } else {
        rows.swap_remove(0)
    })
}

/// CSV writer used for every serialized table: every field quoted, embedded
/// quotes doubled, records terminated by `\n`.
pub fn quoting_writer<W: Write>(inner: W, delimiter: u8) -> Writer<W> {
    WriterBuilder::new()
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Always)
        .double_quote(true)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(inner)
}

/// Serializes values into one delimited line, quoting every field.
pub fn join_quoted<S: AsRef<str>>(values: &[S], delimiter: u8) -> Result<String> {
    let mut writer = quoting_writer(Vec::new(), delimiter);
    writer
        .write_record(values.iter().map(|value| value.as_ref()))
        .context("Quoting record")?;
    let mut bytes = writer.into_inner().context("Finishing quoted record")?;
    if bytes.last() == Some(&b'\n') {
        bytes.pop();
    }
    String::from_utf8(bytes).context("Quoted record is not valid UTF-8")
}
