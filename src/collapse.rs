//! Collapsing of multi-row headers into a single logical header row.
//!
//! Some tables stack a short "group" row above the real "field" row, e.g.
//! `1,,2,` over `NOTA,% ASISTENCIA,NOTA,% ASISTENCIA`. Rows are consumed one
//! at a time and concatenated per column until every fixed key column has
//! been located. A column stops accumulating as soon as its name matches a
//! known fixed or merge column, or an ignored one.

use anyhow::Result;
use log::warn;

use crate::{error::MergeError, matcher::match_header};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollapsedHeader {
    /// One name per physical column.
    pub headers: Vec<String>,
    /// Number of leading rows that were folded into `headers`.
    pub consumed: usize,
    /// Fixed key columns that were never located.
    pub unresolved: Vec<String>,
}

/// Collapses the leading rows of `rows` into one header row.
///
/// The header spans the widest row of the table; cells missing from shorter
/// rows read as empty. At least one row is always consumed. Stops once all `fixed` columns have
/// been matched, or when the table runs out of rows; the latter is logged and
/// the partially resolved header is returned.
pub fn collapse_headers(
    source_name: &str,
    rows: &[Vec<String>],
    fixed: &[String],
    merge: &[String],
    ignore: &[String],
) -> Result<CollapsedHeader> {
    let width = rows
        .iter()
        .map(Vec::len)
        .max()
        .ok_or_else(|| MergeError::MissingHeader {
            source_name: source_name.to_string(),
        })?;

    let targets: Vec<&str> = fixed
        .iter()
        .chain(merge.iter())
        .map(String::as_str)
        .collect();
    let mut current_headers = vec![String::new(); width];
    let mut column_lock = vec![false; width];
    let mut resolved: Vec<bool> = fixed
        .iter()
        .map(|_| false)
        .chain(merge.iter().map(|_| true))
        .collect();

    let mut consumed = 0usize;
    for candidate_headers in rows {
        consumed += 1;
        for (idx, locked) in column_lock.iter_mut().enumerate() {
            if *locked {
                continue;
            }
            let candidate = candidate_headers.get(idx).map(String::as_str).unwrap_or("");

            if let Some(found) = match_header(candidate, &targets) {
                current_headers[idx] = candidate.to_string();
                resolved[found] = true;
                *locked = true;
            } else if match_header(&current_headers[idx], ignore).is_some() {
                *locked = true;
            } else {
                let joined = format!("{} {}", current_headers[idx], candidate);
                current_headers[idx] = joined.trim().to_string();
                if let Some(found) = match_header(&current_headers[idx], &targets) {
                    resolved[found] = true;
                    *locked = true;
                }
                if match_header(&current_headers[idx], ignore).is_some() {
                    *locked = true;
                }
            }
        }
        if resolved.iter().all(|done| *done) {
            break;
        }
    }

    let unresolved: Vec<String> = fixed
        .iter()
        .zip(resolved.iter())
        .filter(|(_, done)| !**done)
        .map(|(name, _)| name.clone())
        .collect();
    if !unresolved.is_empty() {
        warn!(
            "Header of '{source_name}' exhausted after {consumed} row(s) without locating key column(s): {}",
            unresolved.join(", ")
        );
    }

    Ok(CollapsedHeader {
        headers: current_headers,
        consumed,
        unresolved,
    })
}
