//! In-memory content API
//!
//! Behaves like a hosted repository contents endpoint: every object carries a
//! SHA-1 version of its bytes and every accepted put is recorded as a commit.

use std::collections::HashMap;

use parking_lot::Mutex;
use sha1::{Digest, Sha1};

use crate::error::StorageError;
use crate::remote::{ContentApi, PutResponse, RemoteContent, VersionToken};

/// One accepted put
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub name: String,
    pub message: String,
    pub version: VersionToken,
}

#[derive(Debug, Default)]
struct Inner {
    objects: HashMap<String, RemoteContent>,
    history: Vec<Commit>,
}

/// Thread-safe in-process [`ContentApi`]
#[derive(Debug, Default)]
pub struct InMemoryContentApi {
    inner: Mutex<Inner>,
}

impl InMemoryContentApi {
    /// Empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepted puts, oldest first
    #[must_use]
    pub fn history(&self) -> Vec<Commit> {
        self.inner.lock().history.clone()
    }

    /// Number of stored objects
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().objects.len()
    }

    /// Whether no object is stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().objects.is_empty()
    }
}

/// Version of a byte payload
fn version_of(bytes: &[u8]) -> VersionToken {
    VersionToken::new(hex::encode(Sha1::digest(bytes)))
}

impl ContentApi for InMemoryContentApi {
    fn fetch(&self, name: &str) -> Result<Option<RemoteContent>, StorageError> {
        Ok(self.inner.lock().objects.get(name).cloned())
    }

    fn put(
        &self,
        name: &str,
        bytes: &[u8],
        message: &str,
        expected: Option<&VersionToken>,
    ) -> Result<PutResponse, StorageError> {
        let mut inner = self.inner.lock();
        let current = inner.objects.get(name).map(|c| &c.version);
        if current != expected {
            return Ok(PutResponse::VersionMismatch);
        }

        let version = version_of(bytes);
        inner.objects.insert(
            name.to_string(),
            RemoteContent {
                bytes: bytes.to_vec(),
                version: version.clone(),
            },
        );
        inner.history.push(Commit {
            name: name.to_string(),
            message: message.to_string(),
            version: version.clone(),
        });
        Ok(PutResponse::Stored(version))
    }
}
