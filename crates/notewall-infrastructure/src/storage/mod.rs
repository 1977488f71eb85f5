//! Storage layer for atomic, lock-protected file operations.

mod atomic_json;

pub use atomic_json::{AtomicJsonError, AtomicJsonFile};
