//! Plain-file backend
//!
//! One file per object under a root directory. No locking: concurrent
//! writers from different sessions race and the last writer wins.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::backend::{StorageBackend, WriteOutcome};
use crate::error::StorageError;

/// Files under a root directory
#[derive(Debug, Clone)]
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    /// Backend rooted at `root` (created lazily on first write)
    #[inline]
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a named object
    #[inline]
    #[must_use]
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

impl StorageBackend for FileBackend {
    fn exists(&self, name: &str) -> Result<bool, StorageError> {
        Ok(self.path_of(name).is_file())
    }

    fn read(&self, name: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let path = self.path_of(name);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::io(path, e)),
        }
    }

    fn write(&self, name: &str, bytes: &[u8], description: &str) -> Result<WriteOutcome, StorageError> {
        fs::create_dir_all(&self.root).map_err(|e| StorageError::io(&self.root, e))?;

        // Stage in a uniquely named file beside the target, then rename, so
        // readers never see a torn file and concurrent writers never share
        // a staging file
        let path = self.path_of(name);
        let mut staging = tempfile::Builder::new()
            .prefix(&format!(".{name}."))
            .suffix(".tmp")
            .tempfile_in(&self.root)
            .map_err(|e| StorageError::io(&self.root, e))?;
        staging
            .write_all(bytes)
            .and_then(|()| staging.as_file().sync_all())
            .map_err(|e| StorageError::io(staging.path(), e))?;
        persist(staging, &path)?;

        debug!(name, bytes = bytes.len(), description, "file object written");
        Ok(WriteOutcome::Written)
    }

    fn kind(&self) -> &'static str {
        "file"
    }
}

fn persist(staging: NamedTempFile, path: &Path) -> Result<(), StorageError> {
    staging
        .persist(path)
        .map(|_| ())
        .map_err(|e| StorageError::io(path, e.error))
}
