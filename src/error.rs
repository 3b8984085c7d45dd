//! Fatal error conditions of a merge run.
//!
//! Recoverable anomalies (short rows, unresolved header keys, unexpected
//! columns) are logged and never reach this type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MergeError {
    /// No input tables were supplied or discovered.
    #[error("no input tables to merge")]
    NoInputs,

    /// A table without a single row cannot provide a header.
    #[error("table '{source_name}' has no header rows")]
    MissingHeader { source_name: String },

    /// At least one fixed key column is required to build identifiers.
    #[error("at least one fixed key column must be configured")]
    NoFixedColumns,

    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}
