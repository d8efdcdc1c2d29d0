//! Storage backend capability
//!
//! Byte-level access to named objects. Dataset stores depend only on this
//! trait; which implementation sits behind it is decided at configuration
//! time.

use std::fmt::Debug;
use std::sync::Arc;

use crate::error::StorageError;

/// Result of a write attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Bytes were persisted
    Written,
    /// Rejected: the object changed since its version was last observed
    Conflict,
}

impl WriteOutcome {
    /// Whether the bytes were persisted
    #[inline]
    #[must_use]
    pub const fn is_written(self) -> bool {
        matches!(self, Self::Written)
    }
}

/// Read/write access to named byte objects
pub trait StorageBackend: Send + Sync + Debug {
    /// Whether an object with this name exists
    ///
    /// # Errors
    /// Returns error if the backend cannot be reached
    fn exists(&self, name: &str) -> Result<bool, StorageError>;

    /// Object contents, `None` when the object does not exist
    ///
    /// # Errors
    /// Returns error if the backend cannot be reached or read
    fn read(&self, name: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Replace an object's contents
    ///
    /// Optimistic-concurrency backends obtain the version token themselves
    /// and return [`WriteOutcome::Conflict`] on mismatch; they never retry.
    ///
    /// # Errors
    /// Returns error if the backend cannot be reached or written
    fn write(&self, name: &str, bytes: &[u8], description: &str) -> Result<WriteOutcome, StorageError>;

    /// Short backend label for logs
    fn kind(&self) -> &'static str;
}

impl<T: StorageBackend + ?Sized> StorageBackend for Box<T> {
    fn exists(&self, name: &str) -> Result<bool, StorageError> {
        (**self).exists(name)
    }

    fn read(&self, name: &str) -> Result<Option<Vec<u8>>, StorageError> {
        (**self).read(name)
    }

    fn write(&self, name: &str, bytes: &[u8], description: &str) -> Result<WriteOutcome, StorageError> {
        (**self).write(name, bytes, description)
    }

    fn kind(&self) -> &'static str {
        (**self).kind()
    }
}

impl<T: StorageBackend + ?Sized> StorageBackend for Arc<T> {
    fn exists(&self, name: &str) -> Result<bool, StorageError> {
        (**self).exists(name)
    }

    fn read(&self, name: &str) -> Result<Option<Vec<u8>>, StorageError> {
        (**self).read(name)
    }

    fn write(&self, name: &str, bytes: &[u8], description: &str) -> Result<WriteOutcome, StorageError> {
        (**self).write(name, bytes, description)
    }

    fn kind(&self) -> &'static str {
        (**self).kind()
    }
}
