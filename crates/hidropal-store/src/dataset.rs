//! Dataset store
//!
//! Owns the two named collections (primary and trash) and moves them between
//! typed rows and backend bytes. Both collections share one schema and one
//! normalisation path.

use std::fmt::{self, Display, Formatter};

use hidropal_record::{decode_measurements, encode_table, ensure_ids, Measurement};
use tracing::{debug, info, warn};

use crate::backend::{StorageBackend, WriteOutcome};
use crate::error::StorageError;

/// Default object name of the primary collection
pub const DEFAULT_PRIMARY_NAME: &str = "datos_pozo.csv";

/// Default object name of the trash collection
pub const DEFAULT_TRASH_NAME: &str = "datos_pozo_borrados.csv";

/// Which collection an operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Live measurements
    Primary,
    /// Soft-deleted measurements
    Trash,
}

impl Display for Collection {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => f.write_str("primary"),
            Self::Trash => f.write_str("trash"),
        }
    }
}

/// Typed load/save of the primary and trash collections
#[derive(Debug)]
pub struct DatasetStore {
    backend: Box<dyn StorageBackend>,
    primary_name: String,
    trash_name: String,
}

impl DatasetStore {
    /// Store over `backend` with explicit object names
    #[must_use]
    pub fn new(
        backend: Box<dyn StorageBackend>,
        primary_name: impl Into<String>,
        trash_name: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            primary_name: primary_name.into(),
            trash_name: trash_name.into(),
        }
    }

    /// Store over `backend` with the default object names
    #[must_use]
    pub fn with_default_names(backend: Box<dyn StorageBackend>) -> Self {
        Self::new(backend, DEFAULT_PRIMARY_NAME, DEFAULT_TRASH_NAME)
    }

    /// Backend object name of a collection
    #[inline]
    #[must_use]
    pub fn object_name(&self, collection: Collection) -> &str {
        match collection {
            Collection::Primary => &self.primary_name,
            Collection::Trash => &self.trash_name,
        }
    }

    /// Underlying backend
    #[inline]
    #[must_use]
    pub fn backend(&self) -> &dyn StorageBackend {
        self.backend.as_ref()
    }

    /// Whether the backing object of a collection exists
    ///
    /// # Errors
    /// Returns error if the backend fails
    pub fn exists(&self, collection: Collection) -> Result<bool, StorageError> {
        self.backend.exists(self.object_name(collection))
    }

    /// Load a collection
    ///
    /// A missing backing object is an empty collection, not an error.
    ///
    /// # Errors
    /// Returns error if the backend fails or the table is not valid CSV
    pub fn load(&self, collection: Collection) -> Result<Vec<Measurement>, StorageError> {
        let name = self.object_name(collection);
        let Some(bytes) = self.backend.read(name)? else {
            debug!(%collection, name, "collection absent, loading empty");
            return Ok(Vec::new());
        };
        let rows = decode_measurements(&bytes)?;
        debug!(%collection, name, rows = rows.len(), "collection loaded");
        Ok(rows)
    }

    /// Save a full collection
    ///
    /// Rows are re-normalised (ids recomputed, duplicates dropped keeping the
    /// first) before encoding, so the persisted copy is always consistent.
    /// A version conflict is returned as [`WriteOutcome::Conflict`].
    ///
    /// # Errors
    /// Returns error if encoding or the backend fails
    pub fn save(
        &self,
        collection: Collection,
        rows: Vec<Measurement>,
        description: &str,
    ) -> Result<WriteOutcome, StorageError> {
        let rows = ensure_ids(rows);
        let bytes = encode_table(&rows)?;
        let name = self.object_name(collection);
        let outcome = self.backend.write(name, &bytes, description)?;
        match outcome {
            WriteOutcome::Written => {
                info!(%collection, name, rows = rows.len(), backend = self.backend.kind(), description, "collection saved");
            }
            WriteOutcome::Conflict => {
                warn!(%collection, name, backend = self.backend.kind(), description, "collection save conflicted");
            }
        }
        Ok(outcome)
    }

    /// Replace a collection with an empty, correctly-shaped one
    ///
    /// # Errors
    /// Returns error if encoding or the backend fails
    pub fn clear(&self, collection: Collection, description: &str) -> Result<WriteOutcome, StorageError> {
        self.save(collection, Vec::new(), description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryContentApi;
    use crate::remote::RemoteBackend;
    use chrono::NaiveDate;

    fn store() -> DatasetStore {
        DatasetStore::with_default_names(Box::new(RemoteBackend::new(InMemoryContentApi::new())))
    }

    fn row(day: u32, level: f64) -> Measurement {
        Measurement::new(NaiveDate::from_ymd_opt(2024, 4, day), Some(level), Some(0.0), Some(0.0))
    }

    #[test]
    fn absent_collection_loads_empty() {
        let store = store();
        assert!(!store.exists(Collection::Primary).unwrap());
        assert!(store.load(Collection::Primary).unwrap().is_empty());
        assert!(store.load(Collection::Trash).unwrap().is_empty());
    }

    #[test]
    fn save_renormalises_rows() {
        let store = store();
        let mut stale = row(1, 5.0);
        stale.level = Some(4.0);
        let duplicate = row(2, 3.0);

        store
            .save(Collection::Primary, vec![stale.clone(), duplicate.clone(), duplicate], "seed")
            .unwrap();

        let loaded = store.load(Collection::Primary).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id, stale.expected_id());
    }

    #[test]
    fn collections_are_independent() {
        let store = store();
        store.save(Collection::Primary, vec![row(1, 5.0)], "primary").unwrap();
        store.save(Collection::Trash, vec![row(2, 4.0), row(3, 3.0)], "trash").unwrap();
        assert_eq!(store.load(Collection::Primary).unwrap().len(), 1);
        assert_eq!(store.load(Collection::Trash).unwrap().len(), 2);
    }

    #[test]
    fn clear_writes_empty_shaped_collection() {
        let store = store();
        store.clear(Collection::Trash, "purge").unwrap();
        assert!(store.exists(Collection::Trash).unwrap());
        let bytes = store.backend().read(DEFAULT_TRASH_NAME).unwrap().unwrap();
        assert_eq!(bytes, b"date,level,rainfall,extraction,id\n");
    }
}
