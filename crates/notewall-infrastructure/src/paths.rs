//! Path layout of the board's data directory.
//!
//! # Directory Structure
//!
//! ```text
//! <data_dir>/                  # ./data by default
//! ├── notes.json               # The board
//! ├── .notes.json.lock         # Writer lock (kept between writes)
//! └── .notes.json.tmp          # Only exists mid-write
//! ```

use std::path::PathBuf;

/// Data directory used when nothing else is configured.
pub const DEFAULT_DATA_DIR: &str = "data";

/// File name of the board document.
pub const NOTES_FILENAME: &str = "notes.json";

/// Resolves storage paths under one data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotewallPaths {
    data_dir: PathBuf,
}

impl NotewallPaths {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Returns `<data_dir>/notes.json`.
    pub fn notes_file(&self) -> PathBuf {
        self.data_dir.join(NOTES_FILENAME)
    }
}

impl Default for NotewallPaths {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_DIR)
    }
}
