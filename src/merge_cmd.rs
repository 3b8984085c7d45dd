//! The `merge` command: discover, read, edit and merge every input, then
//! write the unified table.

use std::{fs::File, io::BufWriter};

use anyhow::{Context, Result};
use itertools::Itertools;
use log::{debug, info};

use crate::{
    cli::MergeArgs,
    config::MergeConfig,
    editor::Editor,
    error::MergeError,
    io_utils,
    merge::{MergeEngine, MergedTable},
    output, table,
};

pub fn execute(args: &MergeArgs) -> Result<()> {
    let config = MergeConfig::resolve(&args.schema)?;
    let options = config.merge_options()?;
    let editor = Editor::from_config(&config.preprocess)?;
    let input_encoding = io_utils::resolve_encoding(args.schema.input_encoding.as_deref())?;
    let output_encoding = io_utils::resolve_encoding(args.output_encoding.as_deref())?;
    let explicit_delimiter = config.explicit_delimiter()?;
    let output_path = args.output.as_deref();
    let writing_to_stdout = output_path.is_none_or(io_utils::is_dash);

    let extensions = if args.extensions.is_empty() {
        &config.extensions
    } else {
        &args.extensions
    };
    let inputs = io_utils::discover_inputs(&args.inputs, extensions, output_path)?;
    if inputs.is_empty() {
        return Err(MergeError::NoInputs.into());
    }

    info!(
        "Merging {} file(s) on key column(s) [{}] -> {}",
        inputs.len(),
        options.fixed_columns.iter().join(", "),
        output_path
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "stdout".into()),
    );
    if !editor.is_empty() {
        debug!("Preprocessing with {} edit step(s)", editor.steps().len());
    }

    let output_delimiter =
        io_utils::resolve_output_delimiter(output_path, args.output_delimiter, options.delimiter);
    let mut engine = MergeEngine::new(options)?;
    for path in &inputs {
        let delimiter = io_utils::resolve_input_delimiter(path, explicit_delimiter);
        let mut source = io_utils::read_table(path, delimiter, input_encoding)?;
        editor.apply(&mut source);
        engine
            .ingest(&source)
            .with_context(|| format!("Merging {path:?}"))?;
    }
    let merged = engine.finish();

    if args.table && writing_to_stdout {
        print!("{}", table::render_merged(&merged));
    } else {
        if args.table {
            debug!("--table requested but output will remain CSV because a file path was provided");
        }
        let mut writer = io_utils::open_csv_writer(output_path, output_delimiter, output_encoding)?;
        let rows = output::write_table(&merged, &mut writer)?;
        info!(
            "Wrote {rows} row(s) across {} column(s) (delimiter '{}')",
            merged.headers.len(),
            crate::printable_delimiter(output_delimiter)
        );
    }

    if let Some(path) = &args.report {
        write_report(&merged, path)?;
    }
    Ok(())
}

fn write_report(merged: &MergedTable, path: &std::path::Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Creating report file {path:?}"))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &merged.report())
        .context("Writing merge report JSON")?;
    info!("Merge report for {} file(s) written to {path:?}", merged.files.len());
    Ok(())
}
