//! Note domain models and the repository trait.
//!
//! A board is one ordered [`NoteCollection`], newest note first. The collection
//! is always loaded and saved as a whole document.

mod model;
mod repository;

pub use model::{Note, NoteCollection, NOTE_ID_BYTES};
pub use repository::NoteRepository;
