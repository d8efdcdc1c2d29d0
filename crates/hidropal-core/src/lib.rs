//! HidroPal Core - measurement reconciliation
//!
//! The engine behind the well-monitoring data entry screens:
//! - Validates user entries before anything is persisted
//! - Inserts, edits and soft-deletes measurements by content-derived id
//! - Undoes the last delete from session memory, restores from trash
//! - Keeps primary and trash disjoint across non-transactional storage
//! - Derives the depth, variation and rolling rainfall series
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use hidropal_core::{EntryInput, HidropalConfig, Reading, ReconciliationEngine, Session, StorageConfig};
//!
//! let config = HidropalConfig::new().with_storage(StorageConfig::memory_remote());
//! let engine = ReconciliationEngine::from_config(&config);
//! let mut session = Session::new();
//!
//! let date = NaiveDate::from_ymd_opt(2024, 4, 3).unwrap();
//! let saved = engine.insert(&EntryInput::new(date, Reading::new(5.20, 12.0, 300.0)));
//! assert_eq!(saved.value().unwrap().id.as_str(), "5fee6c2346a79467");
//!
//! let id = saved.into_value().unwrap().id;
//! assert!(engine.delete(&mut session, &id).is_success());
//! assert!(engine.undo_last_delete(&mut session).is_success());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod analysis;
pub mod config;
pub mod engine;
pub mod error;
pub mod outcome;
pub mod session;
pub mod telemetry;
pub mod validation;

// Re-exports for convenience
pub use analysis::{min_max_normalize, AnalysisSeries, SeriesPoint};
pub use config::{
    BackendKind, EntryConfig, HidropalConfig, LoggingConfig, StorageConfig, DEFAULT_LEVEL_OFFSET,
    DEFAULT_REFERENCE_DEPTH,
};
pub use engine::ReconciliationEngine;
pub use error::{ConfigError, TelemetryError, ValidationErrors, ValidationIssue};
pub use outcome::Outcome;
pub use session::{LastDeletedBuffer, Session};
pub use validation::{validate_entry, validate_reading, EntryInput, Reading};

pub use hidropal_record::{Measurement, RecordId};
pub use hidropal_store::{Collection, DatasetStore, StorageBackend, TokenPolicy, WriteOutcome};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving the engine
    pub use crate::{
        EntryInput, HidropalConfig, Measurement, Outcome, Reading, ReconciliationEngine, RecordId,
        Session,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
