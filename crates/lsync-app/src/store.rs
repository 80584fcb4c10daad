//! Launch file storage
//!
//! The patcher only talks to a [`LaunchStore`], so tests can run passes
//! against a mock and the real store can stay focused on atomic writes.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;

use lsync_core::prelude::*;

/// Reads and writes launch files
#[cfg_attr(test, mockall::automock)]
pub trait LaunchStore: Send + Sync {
    /// File content, or `None` when the file does not exist
    fn read(&self, path: &Path) -> Result<Option<String>>;

    /// Replace the file content; readers never observe a partial file
    fn write(&self, path: &Path, content: &str) -> Result<()>;
}

/// Store backed by the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLaunchStore;

impl FsLaunchStore {
    pub fn new() -> Self {
        Self
    }

    /// Sibling path the new content is staged in before the rename
    fn temp_path(path: &Path) -> Result<PathBuf> {
        let file_name = path
            .file_name()
            .ok_or_else(|| Error::write(path, "path has no file name"))?;
        let parent = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(parent.join(format!(".{}.lsync-tmp", file_name.to_string_lossy())))
    }

    fn write_staged(temp_path: &Path, path: &Path, content: &str) -> std::io::Result<()> {
        // Not truncated on open: a concurrent writer may hold the lock
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(temp_path)?;
        file.lock_exclusive()?;
        file.set_len(0)?;
        file.write_all(content.as_bytes())?;
        file.flush()?;
        file.sync_all()?;

        // Lock is held until the file is dropped, after the rename
        std::fs::rename(temp_path, path)
    }
}

impl LaunchStore for FsLaunchStore {
    fn read(&self, path: &Path) -> Result<Option<String>> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, path: &Path, content: &str) -> Result<()> {
        let temp_path = Self::temp_path(path)?;

        if let Err(e) = Self::write_staged(&temp_path, path, content) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(Error::write(path, e.to_string()));
        }

        debug!("Wrote {} bytes to {}", content.len(), path.display());
        Ok(())
    }
}
