//! Mapping of a table's local column positions onto the canonical schema.
//!
//! Each header is resolved against the canonical list with the fuzzy header
//! matcher. Headers that match nothing and are not ignored become new free
//! columns, optionally prefixed with a per-file tag so that two files using
//! the same name for different data stay apart.

use log::debug;

use crate::{matcher::match_header, schema::CanonicalSchema};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnIndexMap {
    positions: Vec<Option<usize>>,
    discovered: Vec<String>,
}

impl ColumnIndexMap {
    /// Canonical position for a file-local column, `None` when ignored.
    pub fn get(&self, local: usize) -> Option<usize> {
        self.positions.get(local).copied().flatten()
    }

    pub fn positions(&self) -> &[Option<usize>] {
        &self.positions
    }

    /// Names appended to the schema while building this map.
    pub fn discovered(&self) -> &[String] {
        &self.discovered
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Iterates `(local, canonical)` pairs for every mapped column.
    pub fn mapped(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.positions
            .iter()
            .enumerate()
            .filter_map(|(local, canonical)| canonical.map(|c| (local, c)))
    }
}

/// Name given to a column whose collapsed header is blank.
pub fn synthetic_name(local: usize) -> String {
    format!("column_{}", local + 1)
}

/// Name under which an unknown header is added to the schema.
pub fn tagged_name(tag: Option<&str>, header: &str) -> String {
    match tag {
        Some(tag) if !tag.is_empty() => format!("{tag} - {header}"),
        _ => header.to_string(),
    }
}

/// Builds the local → canonical map for one table, appending any header the
/// schema does not know yet. Existing schema entries are never moved.
pub fn build_index_map(
    headers: &[String],
    schema: &mut CanonicalSchema,
    ignore: &[String],
    tag: Option<&str>,
) -> ColumnIndexMap {
    let mut map = ColumnIndexMap {
        positions: Vec::with_capacity(headers.len()),
        discovered: Vec::new(),
    };

    for (local, raw) in headers.iter().enumerate() {
        let header = if raw.trim().is_empty() {
            synthetic_name(local)
        } else {
            raw.trim().to_string()
        };

        if let Some(position) = schema.find(&header) {
            map.positions.push(Some(position));
            continue;
        }
        if match_header(&header, ignore).is_some() {
            debug!("Ignoring column {local} ('{header}')");
            map.positions.push(None);
            continue;
        }

        let name = tagged_name(tag, &header);
        let position = match schema.find(&name) {
            Some(position) => position,
            None => {
                map.discovered.push(name.clone());
                schema.push_free(name)
            }
        };
        map.positions.push(Some(position));
    }

    map
}
