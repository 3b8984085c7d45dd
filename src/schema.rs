//! The canonical column list shared by every table in a merge run.
//!
//! Columns live in three bands, always in this order:
//!
//! - **fixed** key columns, which together define a row's identifier;
//! - **merge** columns, declared up front but not part of the identity;
//! - **free** columns, discovered from input headers as files are ingested.
//!
//! The fixed and merge bands never change after construction. Free columns
//! are only ever appended, so a position handed out once stays valid for the
//! whole run.

use std::ops::Range;

use crate::matcher::match_header;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnBand {
    Fixed,
    Merge,
    Free,
}

#[derive(Debug, Clone, Default)]
pub struct CanonicalSchema {
    columns: Vec<String>,
    fixed_len: usize,
    merge_len: usize,
}

impl CanonicalSchema {
    pub fn new(fixed_columns: &[String], merge_columns: &[String]) -> Self {
        let mut columns = Vec::with_capacity(fixed_columns.len() + merge_columns.len());
        columns.extend(fixed_columns.iter().cloned());
        columns.extend(merge_columns.iter().cloned());
        Self {
            columns,
            fixed_len: fixed_columns.len(),
            merge_len: merge_columns.len(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn fixed_columns(&self) -> &[String] {
        &self.columns[self.fixed_range()]
    }

    pub fn merge_columns(&self) -> &[String] {
        &self.columns[self.fixed_len..self.fixed_len + self.merge_len]
    }

    pub fn free_columns(&self) -> &[String] {
        &self.columns[self.fixed_len + self.merge_len..]
    }

    /// Canonical positions of the key columns, in identifier order.
    pub fn fixed_range(&self) -> Range<usize> {
        0..self.fixed_len
    }

    pub fn band_of(&self, position: usize) -> Option<ColumnBand> {
        if position < self.fixed_len {
            Some(ColumnBand::Fixed)
        } else if position < self.fixed_len + self.merge_len {
            Some(ColumnBand::Merge)
        } else if position < self.columns.len() {
            Some(ColumnBand::Free)
        } else {
            None
        }
    }

    /// Position of the first column whose name header-matches `name`.
    pub fn find(&self, name: &str) -> Option<usize> {
        match_header(name, &self.columns)
    }

    /// Appends a free column and returns its position. Callers are expected
    /// to have checked [`CanonicalSchema::find`] first.
    pub fn push_free(&mut self, name: impl Into<String>) -> usize {
        self.columns.push(name.into());
        self.columns.len() - 1
    }

    pub fn into_columns(self) -> Vec<String> {
        self.columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn bands_follow_declaration_order() {
        let mut schema = CanonicalSchema::new(&names(&["RUT", "DV"]), &names(&["JORNADA"]));
        let position = schema.push_free("1 - NOTA");

        assert_eq!(position, 3);
        assert_eq!(schema.fixed_columns(), names(&["RUT", "DV"]).as_slice());
        assert_eq!(schema.merge_columns(), names(&["JORNADA"]).as_slice());
        assert_eq!(schema.free_columns(), names(&["1 - NOTA"]).as_slice());
        assert_eq!(schema.band_of(0), Some(ColumnBand::Fixed));
        assert_eq!(schema.band_of(2), Some(ColumnBand::Merge));
        assert_eq!(schema.band_of(3), Some(ColumnBand::Free));
        assert_eq!(schema.band_of(4), None);
    }

    #[test]
    fn find_uses_fuzzy_header_matching() {
        let schema = CanonicalSchema::new(&names(&["Nombre"]), &names(&["Seccion"]));
        assert_eq!(schema.find("NOMBRES"), Some(0));
        assert_eq!(schema.find(" seccion "), Some(1));
        assert_eq!(schema.find("Carrera"), None);
    }
}
