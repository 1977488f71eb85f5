//! JSON file note repository.
//!
//! Stores the whole board in one pretty-printed document:
//!
//! ```text
//! {
//!   "notes": [
//!     { "id": "<16 hex>", "ts": <unix seconds>, "text": "..." }
//!   ]
//! }
//! ```
//!
//! File location: `{data_dir}/notes.json`

use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;

use notewall_core::NotewallError;
use notewall_core::error::Result;
use notewall_core::note::{Note, NoteCollection, NoteRepository};

use crate::storage::AtomicJsonFile;

/// File-backed [`NoteRepository`].
///
/// Blocking file I/O runs on tokio's blocking pool.
#[derive(Clone)]
pub struct JsonNoteRepository {
    file: Arc<AtomicJsonFile<NoteCollection>>,
}

impl JsonNoteRepository {
    /// Creates a repository for the document at `path`. Nothing is touched on disk.
    pub fn new(path: PathBuf) -> Self {
        Self {
            file: Arc::new(AtomicJsonFile::new(path)),
        }
    }

    /// Path of the backing document.
    pub fn path(&self) -> PathBuf {
        self.file.path().to_path_buf()
    }

    async fn run_blocking<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&AtomicJsonFile<NoteCollection>) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let file = Arc::clone(&self.file);
        tokio::task::spawn_blocking(move || f(&file))
            .await
            .map_err(|e| NotewallError::internal(format!("Storage task failed: {}", e)))?
    }
}

/// On-disk shape with entries left undecoded, so one bad entry cannot
/// discard its neighbours.
#[derive(Deserialize)]
struct RawBoard {
    notes: Vec<serde_json::Value>,
}

/// Parses a stored document, falling back to an empty board.
///
/// Blank content, invalid JSON and a missing or non-array `notes` field read
/// as empty. Inside a well-formed `notes` array, entries that do not decode
/// as a note are skipped and the rest are kept. The raw file is left
/// untouched until the next save replaces it.
fn parse_or_empty(raw: &str, path: &std::path::Path) -> NoteCollection {
    if raw.trim().is_empty() {
        tracing::warn!("Notes file {:?} is empty; treating as an empty board", path);
        return NoteCollection::new();
    }

    let board = match serde_json::from_str::<RawBoard>(raw) {
        Ok(board) => board,
        Err(e) => {
            tracing::warn!(
                "Notes file {:?} is not a valid board ({}); treating as an empty board",
                path,
                e
            );
            return NoteCollection::new();
        }
    };

    let total = board.notes.len();
    let notes: Vec<Note> = board
        .notes
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value::<Note>(entry) {
            Ok(note) => Some(note),
            Err(e) => {
                tracing::warn!("Skipping malformed note #{} in {:?}: {}", index, path, e);
                None
            }
        })
        .collect();

    if notes.len() < total {
        tracing::warn!(
            "Kept {} of {} entries from notes file {:?}",
            notes.len(),
            total,
            path
        );
    }
    NoteCollection { notes }
}

#[async_trait]
impl NoteRepository for JsonNoteRepository {
    async fn ensure_initialized(&self) -> Result<()> {
        let created = self
            .run_blocking(|file| Ok(file.create_if_missing(&NoteCollection::new())?))
            .await?;

        if created {
            tracing::info!("Created empty notes file at {:?}", self.file.path());
        }
        Ok(())
    }

    async fn load(&self) -> Result<NoteCollection> {
        let collection = self
            .run_blocking(|file| {
                let raw = file.read_raw().map_err(|e| {
                    NotewallError::io(format!("Failed to read notes file: {}", e))
                })?;
                Ok(match raw {
                    Some(raw) => parse_or_empty(&raw, file.path()),
                    None => NoteCollection::new(),
                })
            })
            .await?;

        tracing::debug!("Loaded {} notes", collection.len());
        Ok(collection)
    }

    async fn save(&self, collection: &NoteCollection) -> Result<()> {
        let collection = collection.clone();
        let count = collection.len();

        self.run_blocking(move |file| {
            file.save(&collection).map_err(|e| {
                tracing::error!("Failed to save notes file {:?}: {}", file.path(), e);
                NotewallError::from(e)
            })
        })
        .await?;

        tracing::debug!("Saved {} notes", count);
        Ok(())
    }
}
