//! Atomic JSON file operations.
//!
//! Writers serialize on an exclusive advisory lock held on a sidecar
//! `<file>.lock`, and every write lands through a temp file + rename so a
//! reader sees either the previous document or the new one, never a mix.

use notewall_core::NotewallError;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// Errors that can occur during atomic JSON operations.
#[derive(Debug)]
pub enum AtomicJsonError {
    /// File I/O error.
    IoError(std::io::Error),
    /// JSON serialization/deserialization error.
    JsonError(serde_json::Error),
    /// File locking error.
    LockError(String),
}

impl std::fmt::Display for AtomicJsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AtomicJsonError::IoError(e) => write!(f, "I/O error: {}", e),
            AtomicJsonError::JsonError(e) => write!(f, "JSON error: {}", e),
            AtomicJsonError::LockError(e) => write!(f, "Lock error: {}", e),
        }
    }
}

impl std::error::Error for AtomicJsonError {}

impl From<std::io::Error> for AtomicJsonError {
    fn from(e: std::io::Error) -> Self {
        AtomicJsonError::IoError(e)
    }
}

impl From<serde_json::Error> for AtomicJsonError {
    fn from(e: serde_json::Error) -> Self {
        AtomicJsonError::JsonError(e)
    }
}

impl From<AtomicJsonError> for NotewallError {
    fn from(e: AtomicJsonError) -> Self {
        match e {
            AtomicJsonError::IoError(e) => e.into(),
            AtomicJsonError::JsonError(e) => e.into(),
            AtomicJsonError::LockError(msg) => NotewallError::lock(msg),
        }
    }
}

/// A handle to a JSON document on disk.
///
/// Provides:
/// - **Atomicity**: whole-document replace via tmp file + atomic rename
/// - **Isolation**: writers hold an exclusive `fs2` lock for the full write
/// - **Durability**: `sync_all` on the tmp file before the rename
///
/// Reads take no lock; the rename guarantees they never see a torn file.
pub struct AtomicJsonFile<T> {
    path: PathBuf,
    _phantom: PhantomData<T>,
}

impl<T> AtomicJsonFile<T>
where
    T: Serialize,
{
    /// Creates a new handle. Nothing is touched on disk.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _phantom: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the raw file content.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(String))`: File content (possibly empty)
    /// - `Ok(None)`: File doesn't exist
    /// - `Err`: Any other read failure
    pub fn read_raw(&self) -> Result<Option<String>, AtomicJsonError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Replaces the file with `data` as pretty-printed JSON.
    ///
    /// The exclusive lock is held from before the temp file is written until
    /// after the rename.
    pub fn save(&self, data: &T) -> Result<(), AtomicJsonError> {
        let json = serde_json::to_string_pretty(data)?;

        self.ensure_parent_dir()?;
        let _lock = self.acquire_lock()?;
        self.write_replace(json.as_bytes())
    }

    /// Writes `default_value` only if the file does not exist yet.
    ///
    /// Returns `true` when the file was created. Existing content, valid or
    /// not, is left alone.
    pub fn create_if_missing(&self, default_value: &T) -> Result<bool, AtomicJsonError> {
        self.ensure_parent_dir()?;
        if self.path.exists() {
            return Ok(false);
        }

        let json = serde_json::to_string_pretty(default_value)?;
        let _lock = self.acquire_lock()?;

        // Another writer may have won the race while we waited for the lock.
        if self.path.exists() {
            return Ok(false);
        }

        self.write_replace(json.as_bytes())?;
        Ok(true)
    }

    fn ensure_parent_dir(&self) -> Result<(), AtomicJsonError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }

    /// Writes `bytes` to the temp file, fsyncs it and renames it over the target.
    ///
    /// Caller must hold the lock.
    fn write_replace(&self, bytes: &[u8]) -> Result<(), AtomicJsonError> {
        let tmp_path = self.sidecar_path("tmp")?;
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(bytes)?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        if let Err(e) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        self.sync_parent_dir();
        Ok(())
    }

    #[cfg(unix)]
    fn sync_parent_dir(&self) {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Ok(dir) = File::open(parent) {
                let _ = dir.sync_all();
            }
        }
    }

    #[cfg(not(unix))]
    fn sync_parent_dir(&self) {}

    /// Builds `.<file name>.<suffix>` next to the target file.
    fn sidecar_path(&self, suffix: &str) -> Result<PathBuf, AtomicJsonError> {
        let file_name = self.path.file_name().ok_or_else(|| {
            AtomicJsonError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Path has no file name",
            ))
        })?;

        let name = format!(".{}.{}", file_name.to_string_lossy(), suffix);
        Ok(match self.path.parent() {
            Some(parent) => parent.join(name),
            None => PathBuf::from(name),
        })
    }

    fn acquire_lock(&self) -> Result<FileLock, AtomicJsonError> {
        FileLock::acquire(&self.sidecar_path("lock")?)
    }
}

/// An exclusive lock guard; the lock is released when dropped.
///
/// The lock file itself is never removed: deleting it while another process
/// waits on the old inode would let two writers in at once.
struct FileLock {
    file: File,
}

impl FileLock {
    /// Blocks until the exclusive lock on `lock_path` is held.
    fn acquire(lock_path: &Path) -> Result<Self, AtomicJsonError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(lock_path)?;

        fs2::FileExt::lock_exclusive(&file)
            .map_err(|e| AtomicJsonError::LockError(format!("Failed to acquire lock: {}", e)))?;

        Ok(FileLock { file })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
    }
}
