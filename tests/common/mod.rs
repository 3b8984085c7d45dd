#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use csv_unify::SourceTable;
use tempfile::{TempDir, tempdir};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` under the workspace (creating parent folders) and
    /// returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, contents).expect("write temp file contents");
        path
    }

    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.temp_dir.path().join(name)).expect("read workspace file")
    }
}

/// Builds an in-memory table from literal rows.
pub fn table(name: &str, rows: &[&[&str]]) -> SourceTable {
    SourceTable::from_rows(name, rows)
}

/// Lines of CSV output with surrounding quotes stripped from every field,
/// for compact assertions on simple values.
pub fn unquoted_lines(output: &str) -> Vec<String> {
    output
        .lines()
        .map(|line| line.replace('"', ""))
        .collect()
}
