//! Testing utilities for the HidroPal workspace
//!
//! Shared engine fixtures, entry builders and a fault-injecting backend.

#![allow(missing_docs)]

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use hidropal_core::{EntryConfig, EntryInput, Reading, ReconciliationEngine};
use hidropal_record::RecordId;
use hidropal_store::{
    DatasetStore, FileBackend, InMemoryContentApi, RemoteBackend, StorageBackend, StorageError,
    WriteOutcome,
};
use parking_lot::Mutex;

/// "Today" used by every fixture engine
pub fn fixed_today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 4, 30).unwrap()
}

/// A day in April 2024
pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 4, d).unwrap()
}

pub fn entry(date: NaiveDate, level: f64, rainfall: f64, extraction: f64) -> EntryInput {
    EntryInput::new(date, Reading::new(level, rainfall, extraction))
}

pub fn engine_over(backend: Box<dyn StorageBackend>) -> ReconciliationEngine {
    ReconciliationEngine::new(DatasetStore::with_default_names(backend), EntryConfig::default())
        .with_fixed_today(fixed_today())
}

/// Engine over a fresh in-memory remote backend
pub fn memory_engine() -> ReconciliationEngine {
    engine_over(Box::new(RemoteBackend::new(InMemoryContentApi::new())))
}

/// Engine over plain files in `dir`
pub fn file_engine(dir: &Path) -> ReconciliationEngine {
    engine_over(Box::new(FileBackend::new(dir)))
}

/// Engine whose remote backend shares `api` with other engines
///
/// Each engine keeps its own version cache, like separate sessions.
pub fn shared_engine(api: &Arc<InMemoryContentApi>) -> ReconciliationEngine {
    engine_over(Box::new(RemoteBackend::new(Arc::clone(api))))
}

/// Engine over a [`FlakyBackend`] the test keeps a handle to
pub fn flaky_engine() -> (ReconciliationEngine, Arc<FlakyBackend>) {
    let backend = Arc::new(FlakyBackend::new(RemoteBackend::new(InMemoryContentApi::new())));
    (engine_over(Box::new(Arc::clone(&backend))), backend)
}

/// Ids present in both primary and trash
pub fn overlap(engine: &ReconciliationEngine) -> HashSet<RecordId> {
    let ids = |rows: Option<Vec<hidropal_record::Measurement>>| -> HashSet<RecordId> {
        rows.unwrap_or_default().into_iter().map(|row| row.id).collect()
    };
    let primary = ids(engine.list_primary().into_value());
    let trash = ids(engine.list_trash().into_value());
    primary.intersection(&trash).cloned().collect()
}

/// Injected write behaviour for one object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Write returns a storage error
    Fail,
    /// Write reports a version conflict
    Conflict,
}

/// Backend wrapper that fails writes to chosen objects on demand
#[derive(Debug)]
pub struct FlakyBackend {
    inner: Box<dyn StorageBackend>,
    faults: Mutex<HashMap<String, Fault>>,
    writes: Mutex<Vec<String>>,
}

impl FlakyBackend {
    pub fn new(inner: impl StorageBackend + 'static) -> Self {
        Self {
            inner: Box::new(inner),
            faults: Mutex::new(HashMap::new()),
            writes: Mutex::new(Vec::new()),
        }
    }

    /// Every later write to `name` misbehaves until healed
    pub fn arm(&self, name: &str, fault: Fault) {
        self.faults.lock().insert(name.to_string(), fault);
    }

    pub fn heal(&self) {
        self.faults.lock().clear();
    }

    /// Object names of the writes that reached the inner backend
    pub fn successful_writes(&self) -> Vec<String> {
        self.writes.lock().clone()
    }
}

impl StorageBackend for FlakyBackend {
    fn exists(&self, name: &str) -> Result<bool, StorageError> {
        self.inner.exists(name)
    }

    fn read(&self, name: &str) -> Result<Option<Vec<u8>>, StorageError> {
        self.inner.read(name)
    }

    fn write(&self, name: &str, bytes: &[u8], description: &str) -> Result<WriteOutcome, StorageError> {
        let fault = self.faults.lock().get(name).copied();
        match fault {
            Some(Fault::Fail) => Err(StorageError::Remote(format!("injected failure writing {name}"))),
            Some(Fault::Conflict) => Ok(WriteOutcome::Conflict),
            None => {
                let outcome = self.inner.write(name, bytes, description)?;
                if outcome.is_written() {
                    self.writes.lock().push(name.to_string());
                }
                Ok(outcome)
            }
        }
    }

    fn kind(&self) -> &'static str {
        "flaky"
    }
}
