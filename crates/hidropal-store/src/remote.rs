//! Optimistic-concurrency remote backend
//!
//! Wraps a [`ContentApi`]: a remote object store whose reads return a version
//! token and whose writes must present the current token. The transport is
//! out of scope; [`InMemoryContentApi`](crate::InMemoryContentApi) is the
//! bundled implementation.

use std::collections::HashMap;
use std::fmt::{self, Debug, Display, Formatter};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::backend::{StorageBackend, WriteOutcome};
use crate::error::StorageError;

/// Opaque version of a remote object
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionToken(String);

impl VersionToken {
    /// Wrap a token string
    #[inline]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Borrow the token string
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for VersionToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Object contents with the version they were read at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteContent {
    pub bytes: Vec<u8>,
    pub version: VersionToken,
}

/// Response to a conditional put
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PutResponse {
    /// Stored; the object now has this version
    Stored(VersionToken),
    /// The expected version did not match the current one
    VersionMismatch,
}

/// Remote content store with version-checked writes
pub trait ContentApi: Send + Sync + Debug {
    /// Current contents and version, `None` when absent
    ///
    /// # Errors
    /// Returns error on transport failure
    fn fetch(&self, name: &str) -> Result<Option<RemoteContent>, StorageError>;

    /// Conditional write
    ///
    /// `expected` is `None` to create an object that must not exist yet.
    ///
    /// # Errors
    /// Returns error on transport failure
    fn put(
        &self,
        name: &str,
        bytes: &[u8],
        message: &str,
        expected: Option<&VersionToken>,
    ) -> Result<PutResponse, StorageError>;
}

impl<T: ContentApi + ?Sized> ContentApi for Arc<T> {
    fn fetch(&self, name: &str) -> Result<Option<RemoteContent>, StorageError> {
        (**self).fetch(name)
    }

    fn put(
        &self,
        name: &str,
        bytes: &[u8],
        message: &str,
        expected: Option<&VersionToken>,
    ) -> Result<PutResponse, StorageError> {
        (**self).put(name, bytes, message, expected)
    }
}

/// Where a write takes its expected version from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPolicy {
    /// The version last observed by this backend (read or write); falls back
    /// to a fresh read when nothing was observed. Stricter than
    /// [`TokenPolicy::ReadBeforeWrite`]: also detects changes made between a
    /// load and the following save.
    #[default]
    LastObserved,
    /// Always read the current version immediately before writing, the plain
    /// read-before-write contract of a remote content API. Only detects
    /// changes racing the write itself.
    ReadBeforeWrite,
}

/// Storage backend over a [`ContentApi`]
pub struct RemoteBackend<A> {
    api: A,
    policy: TokenPolicy,
    /// Name -> last observed version (`None`: observed absent)
    observed: Mutex<HashMap<String, Option<VersionToken>>>,
}

impl<A: ContentApi> RemoteBackend<A> {
    /// Backend with the default [`TokenPolicy`]
    #[inline]
    #[must_use]
    pub fn new(api: A) -> Self {
        Self::with_policy(api, TokenPolicy::default())
    }

    /// Backend with an explicit token policy
    #[inline]
    #[must_use]
    pub fn with_policy(api: A, policy: TokenPolicy) -> Self {
        Self {
            api,
            policy,
            observed: Mutex::new(HashMap::new()),
        }
    }

    /// Underlying API
    #[inline]
    #[must_use]
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Token policy in effect
    #[inline]
    #[must_use]
    pub fn policy(&self) -> TokenPolicy {
        self.policy
    }

    /// Forget every observed version
    pub fn forget_versions(&self) {
        self.observed.lock().clear();
    }

    fn fetch_and_observe(&self, name: &str) -> Result<Option<RemoteContent>, StorageError> {
        let content = self.api.fetch(name)?;
        self.observed
            .lock()
            .insert(name.to_string(), content.as_ref().map(|c| c.version.clone()));
        Ok(content)
    }

    fn expected_version(&self, name: &str) -> Result<Option<VersionToken>, StorageError> {
        if self.policy == TokenPolicy::LastObserved {
            if let Some(known) = self.observed.lock().get(name) {
                return Ok(known.clone());
            }
        }
        Ok(self.fetch_and_observe(name)?.map(|c| c.version))
    }
}

impl<A: ContentApi> StorageBackend for RemoteBackend<A> {
    fn exists(&self, name: &str) -> Result<bool, StorageError> {
        Ok(self.fetch_and_observe(name)?.is_some())
    }

    fn read(&self, name: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.fetch_and_observe(name)?.map(|c| c.bytes))
    }

    fn write(&self, name: &str, bytes: &[u8], description: &str) -> Result<WriteOutcome, StorageError> {
        let expected = self.expected_version(name)?;
        match self.api.put(name, bytes, description, expected.as_ref())? {
            PutResponse::Stored(version) => {
                debug!(name, %version, description, "remote object written");
                self.observed.lock().insert(name.to_string(), Some(version));
                Ok(WriteOutcome::Written)
            }
            PutResponse::VersionMismatch => {
                warn!(
                    name,
                    expected = expected.as_ref().map_or("<absent>", VersionToken::as_str),
                    "remote write rejected: version changed since last read"
                );
                self.observed.lock().remove(name);
                Ok(WriteOutcome::Conflict)
            }
        }
    }

    fn kind(&self) -> &'static str {
        "remote"
    }
}

impl<A: Debug> Debug for RemoteBackend<A> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteBackend")
            .field("api", &self.api)
            .field("policy", &self.policy)
            .field("observed", &self.observed.lock().len())
            .finish()
    }
}
