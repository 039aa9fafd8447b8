use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

/// Sentinel file marking a media folder whose files are currently renamed.
pub const LOCK_FILE_NAME: &str = "anki-media-volume.lock";

#[derive(Error, Debug)]
pub enum LockError {
    #[error("Failed to create lock file {path}: {source}")]
    Acquire {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to remove lock file {path}: {source}")]
    Release {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Advisory lock backed by a zero-byte file inside the target folder.
///
/// Both `acquire` and `release` are idempotent.
#[derive(Debug, Clone)]
pub struct LockGuard {
    path: PathBuf,
}

impl LockGuard {
    pub fn for_folder(folder: &Path) -> Self {
        Self {
            path: folder.join(LOCK_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_locked(&self) -> bool {
        self.path.exists()
    }

    pub fn acquire(&self) -> Result<(), LockError> {
        if self.is_locked() {
            debug!(path = ?self.path, "Lock file already present");
            return Ok(());
        }

        let to_error = |source| LockError::Acquire {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(to_error)?;
        }

        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .map_err(to_error)?;

        info!("Lock file created: {:?}", self.path);
        Ok(())
    }

    pub fn release(&self) -> Result<(), LockError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!("Lock file removed: {:?}", self.path);
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(LockError::Release {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_acquire_creates_empty_file() {
        let dir = tempdir().unwrap();
        let lock = LockGuard::for_folder(dir.path());

        assert!(!lock.is_locked());
        lock.acquire().unwrap();

        assert!(lock.is_locked());
        assert_eq!(fs::metadata(lock.path()).unwrap().len(), 0);
        assert_eq!(lock.path(), dir.path().join(LOCK_FILE_NAME));
    }

    #[test]
    fn test_acquire_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let folder = dir.path().join("profile").join("collection.media");
        let lock = LockGuard::for_folder(&folder);

        lock.acquire().unwrap();

        assert!(folder.join(LOCK_FILE_NAME).exists());
    }

    #[test]
    fn test_acquire_twice_is_noop() {
        let dir = tempdir().unwrap();
        let lock = LockGuard::for_folder(dir.path());

        lock.acquire().unwrap();
        lock.acquire().unwrap();

        assert!(lock.is_locked());
    }

    #[test]
    fn test_release_is_idempotent() {
        let dir = tempdir().unwrap();
        let lock = LockGuard::for_folder(dir.path());

        lock.release().unwrap();
        lock.acquire().unwrap();
        lock.release().unwrap();
        lock.release().unwrap();

        assert!(!lock.is_locked());
    }
}
