pub mod config;
pub mod json_note_repository;
pub mod memory_session_store;
pub mod paths;
pub mod storage;

pub use crate::config::{AppConfig, ConfigFile, ConfigOverrides};
pub use crate::json_note_repository::JsonNoteRepository;
pub use crate::memory_session_store::MemorySessionStore;
pub use crate::paths::NotewallPaths;
