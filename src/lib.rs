pub mod cli;
pub mod codec;
pub mod collapse;
pub mod columns;
pub mod config;
pub mod editor;
pub mod error;
pub mod inspect;
pub mod io_utils;
pub mod matcher;
pub mod merge;
pub mod merge_cmd;
pub mod output;
pub mod schema;
pub mod table;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

use crate::cli::{Cli, Commands};

pub use crate::{
    config::{MergeConfig, MergeOptions, TagRule},
    error::MergeError,
    matcher::match_header,
    merge::{MergeEngine, MergedTable, SourceTable, merge_sources},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_unify", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Merge(args) => merge_cmd::execute(&args),
        Commands::Inspect(args) => inspect::execute(&args),
    }
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
