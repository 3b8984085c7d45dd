//! Rendering of a merged table back to delimited text.
//!
//! [`write_table`] is the only serializer. The `merge` command streams it
//! into the output file; [`render_csv`] runs it into memory for library
//! callers that want the whole table as one string.

use std::io::Write;

use anyhow::{Context, Result};

use crate::{codec::quoting_writer, merge::MergedTable};

/// Renders the header line followed by one line per identifier, every field
/// quoted, lines joined with `\n` and no trailing newline.
pub fn render_csv(table: &MergedTable, delimiter: u8) -> Result<String> {
    let mut writer = quoting_writer(Vec::new(), delimiter);
    write_table(table, &mut writer)?;
    let mut bytes = writer.into_inner().context("Finishing CSV output")?;
    if bytes.last() == Some(&b'\n') {
        bytes.pop();
    }
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

/// Streams the table through `writer`, returning the number of data rows.
pub fn write_table<W: Write>(table: &MergedTable, writer: &mut csv::Writer<W>) -> Result<usize> {
    writer
        .write_record(table.headers.iter())
        .context("Writing output headers")?;
    for (written, (key, row)) in table.rows.iter().enumerate() {
        writer
            .write_record(row.iter())
            .with_context(|| format!("Writing row {} (key {key:?})", written + 1))?;
    }
    writer.flush().context("Flushing output")?;
    Ok(table.rows.len())
}
