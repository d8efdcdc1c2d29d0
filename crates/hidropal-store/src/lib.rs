//! HidroPal Storage
//!
//! Persistence for the primary and trash measurement collections.
//!
//! # Core Concepts
//!
//! - [`StorageBackend`]: byte-level capability (exists / read / write)
//! - [`FileBackend`]: plain files, last writer wins
//! - [`RemoteBackend`]: optimistic concurrency over a [`ContentApi`];
//!   mismatches surface as [`WriteOutcome::Conflict`]
//! - [`DatasetStore`]: typed load/save of [`Collection::Primary`] and
//!   [`Collection::Trash`]
//!
//! # Example
//!
//! ```rust
//! use hidropal_store::{Collection, DatasetStore, InMemoryContentApi, RemoteBackend};
//!
//! let store = DatasetStore::with_default_names(Box::new(RemoteBackend::new(InMemoryContentApi::new())));
//! assert!(store.load(Collection::Primary).unwrap().is_empty());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
mod backend;
mod dataset;
mod error;
mod file;
mod memory;
mod remote;

// Re-exports
pub use backend::{StorageBackend, WriteOutcome};
pub use dataset::{Collection, DatasetStore, DEFAULT_PRIMARY_NAME, DEFAULT_TRASH_NAME};
pub use error::StorageError;
pub use file::FileBackend;
pub use memory::{Commit, InMemoryContentApi};
pub use remote::{ContentApi, PutResponse, RemoteBackend, RemoteContent, TokenPolicy, VersionToken};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
