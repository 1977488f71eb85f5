//! Note domain models.

use chrono::Utc;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Number of random bytes behind a note id (rendered as twice as many hex chars).
pub const NOTE_ID_BYTES: usize = 8;

/// A single free-text note on the board.
///
/// Every field is fixed at creation; there is no edit operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Opaque lowercase hex id drawn from the OS random source.
    pub id: String,
    /// Creation time in unix seconds.
    #[serde(rename = "ts")]
    pub created_at: i64,
    /// Trimmed, non-empty note body.
    pub text: String,
}

impl Note {
    /// Creates a note with a fresh id and the current timestamp.
    ///
    /// Returns `None` when `text` is empty after trimming.
    pub fn new(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        Some(Self {
            id: generate_note_id(),
            created_at: Utc::now().timestamp(),
            text: text.to_string(),
        })
    }

    /// Case-insensitive substring match against an already lowercased needle.
    fn matches_lowercase(&self, needle: &str) -> bool {
        self.text.to_lowercase().contains(needle)
    }
}

fn generate_note_id() -> String {
    let mut bytes = [0u8; NOTE_ID_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// The whole persisted board: `{"notes": [...]}`.
///
/// Array order is display order. Nothing here sorts; order is whatever the
/// mutation history produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteCollection {
    pub notes: Vec<Note>,
}

impl NoteCollection {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Note> {
        self.notes.iter()
    }

    /// Looks up a note by id.
    pub fn get(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    /// Prepends a new note built from `text`.
    ///
    /// Blank text is a no-op and returns `None`.
    pub fn add(&mut self, text: &str) -> Option<&Note> {
        let note = Note::new(text)?;
        self.notes.insert(0, note);
        self.notes.first()
    }

    /// Removes every note with the given id and returns how many were removed.
    pub fn delete(&mut self, id: &str) -> usize {
        let before = self.notes.len();
        self.notes.retain(|n| n.id != id);
        before - self.notes.len()
    }

    /// Filters notes by case-insensitive substring, preserving order.
    ///
    /// An empty query returns every note.
    pub fn search(&self, query: &str) -> Vec<&Note> {
        if query.is_empty() {
            return self.notes.iter().collect();
        }

        let needle = query.to_lowercase();
        self.notes
            .iter()
            .filter(|n| n.matches_lowercase(&needle))
            .collect()
    }
}
