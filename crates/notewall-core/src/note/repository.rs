//! Note repository trait.

use async_trait::async_trait;

use super::model::NoteCollection;
use crate::error::Result;

/// Persistence boundary for the board.
///
/// `load` and `save` are the only operations that read or write the notes
/// document, so an implementation backed by an embedded database can replace
/// the JSON file without touching the gate or the request layer.
///
/// # Implementation Notes
///
/// - `load` must fail open: an empty, unparseable or structurally wrong
///   document reads as an empty collection. This hides corruption as well,
///   which is an accepted trade-off.
/// - `save` replaces the whole document and must never expose a half-written
///   file to a concurrent reader. Concurrent saves must not interleave.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// Creates the backing storage with an empty collection if it is missing.
    ///
    /// Never alters existing content; safe to call on every startup.
    async fn ensure_initialized(&self) -> Result<()>;

    /// Loads the full collection.
    ///
    /// # Returns
    ///
    /// - `Ok(NoteCollection)`: Stored notes, or an empty collection when the
    ///   document is missing or unreadable as a board
    /// - `Err(_)`: The storage itself could not be read
    async fn load(&self) -> Result<NoteCollection>;

    /// Replaces the stored collection with `collection`.
    async fn save(&self, collection: &NoteCollection) -> Result<()>;
}
