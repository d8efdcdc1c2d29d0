//! Storage errors
//!
//! A version-token mismatch is not an error: it is reported as
//! [`WriteOutcome::Conflict`](crate::WriteOutcome::Conflict).

use std::path::PathBuf;

use hidropal_record::RecordError;

/// Errors raised by storage backends and dataset stores
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Local filesystem failure
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Remote content API failure (transport, auth, malformed response)
    #[error("remote content api error: {0}")]
    Remote(String),

    /// Persisted table could not be decoded or encoded
    #[error("record codec error: {0}")]
    Record(#[from] RecordError),
}

impl StorageError {
    /// Wrap an I/O error with the path it concerns
    #[inline]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
