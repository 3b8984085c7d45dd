use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Unify inconsistent CSV tables into one canonical table",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Merge CSV files (or folders of them) into one table keyed by the fixed columns
    Merge(MergeArgs),
    /// Show how a single file's header collapses and maps onto the canonical columns
    Inspect(InspectArgs),
}

/// Options shared by every command that needs to know the canonical columns.
#[derive(Debug, Args, Default)]
pub struct SchemaArgs {
    /// YAML configuration file; command-line flags take precedence
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,
    /// Comma-separated key columns that define row identity, in order
    #[arg(short = 'k', long = "key", value_delimiter = ',', action = clap::ArgAction::Append)]
    pub keys: Vec<String>,
    /// Comma-separated optional columns that follow the keys in the output
    #[arg(long = "merge-columns", value_delimiter = ',', action = clap::ArgAction::Append)]
    pub merge_columns: Vec<String>,
    /// Comma-separated columns to drop from every input
    #[arg(long = "ignore", value_delimiter = ',', action = clap::ArgAction::Append)]
    pub ignore_columns: Vec<String>,
    /// Do not warn when inputs introduce columns that are not declared
    #[arg(long = "expect-new-columns")]
    pub expect_new_columns: bool,
    /// Regex applied to each file name; the match (or first capture group) prefixes new columns
    #[arg(long = "tag-pattern")]
    pub tag_pattern: Option<String>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct MergeArgs {
    /// Input CSV files or folders, processed in the order given
    #[arg(short = 'i', long = "input", required = true, action = clap::ArgAction::Append)]
    pub inputs: Vec<PathBuf>,
    /// Output CSV file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    #[command(flatten)]
    pub schema: SchemaArgs,
    /// File extensions picked up when walking folders (defaults to csv)
    #[arg(long = "extension", action = clap::ArgAction::Append)]
    pub extensions: Vec<String>,
    /// Delimiter to use for output (defaults to input delimiter)
    #[arg(long = "output-delimiter", value_parser = parse_delimiter)]
    pub output_delimiter: Option<u8>,
    /// Character encoding for the output file/stdout (defaults to utf-8)
    #[arg(long = "output-encoding")]
    pub output_encoding: Option<String>,
    /// Render output as an elastic table to stdout
    #[arg(long = "table")]
    pub table: bool,
    /// Write a JSON summary of every ingested file to this path
    #[arg(long = "report")]
    pub report: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Input CSV file to inspect
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    #[command(flatten)]
    pub schema: SchemaArgs,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
