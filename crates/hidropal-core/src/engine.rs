//! Reconciliation Engine
//!
//! Insert, edit, soft-delete, undo, restore and purge across the primary and
//! trash collections. Every operation is one load-mutate-save cycle and
//! returns an [`Outcome`]; expected conditions (not found, empty trash,
//! already restored, write conflicts) are reported there, never as errors.
//!
//! The engine never branches on the storage backend kind. A conflicting
//! write from the optimistic-concurrency backend surfaces as a failed
//! outcome asking the caller to reload; there is no automatic retry.

use std::collections::HashSet;

use chrono::{Local, NaiveDate};
use hidropal_record::{compare_by_date, decode_measurements, format_date, Measurement, RecordId};
use hidropal_store::{Collection, DatasetStore, StorageError, WriteOutcome};
use tracing::{debug, error, info, warn};

use crate::analysis::AnalysisSeries;
use crate::config::{EntryConfig, HidropalConfig};
use crate::outcome::Outcome;
use crate::session::Session;
use crate::validation::{validate_entry, validate_reading, EntryInput, Reading};

/// Why a persistence step did not complete
#[derive(Debug, thiserror::Error)]
enum StepError {
    #[error("the {0} data changed since it was loaded; reload and try again")]
    Conflict(Collection),

    #[error("could not access the {0} data: {1}")]
    Storage(Collection, #[source] StorageError),
}

impl StepError {
    fn into_outcome<T>(self, operation: &str) -> Outcome<T> {
        match &self {
            Self::Conflict(collection) => {
                warn!(operation, %collection, "write conflict, nothing retried");
            }
            Self::Storage(collection, err) => {
                error!(operation, %collection, error = %err, "storage failure");
            }
        }
        Outcome::failed(format!("{operation} failed: {self}"))
    }
}

/// Coordinates the primary and trash collections of one dataset store
#[derive(Debug)]
pub struct ReconciliationEngine {
    store: DatasetStore,
    entry: EntryConfig,
    today: Option<NaiveDate>,
}

impl ReconciliationEngine {
    /// Engine over a store
    #[must_use]
    pub fn new(store: DatasetStore, entry: EntryConfig) -> Self {
        Self {
            store,
            entry,
            today: None,
        }
    }

    /// Engine over the store and entry settings of a configuration
    #[must_use]
    pub fn from_config(config: &HidropalConfig) -> Self {
        Self::new(config.storage.build_store(), config.entry.clone())
    }

    /// Pin "today" for future-date validation instead of the local clock
    #[must_use]
    pub fn with_fixed_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// Underlying dataset store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &DatasetStore {
        &self.store
    }

    /// Entry settings
    #[inline]
    #[must_use]
    pub fn entry_config(&self) -> &EntryConfig {
        &self.entry
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// All live measurements, in stored order
    pub fn list_primary(&self) -> Outcome<Vec<Measurement>> {
        self.list(Collection::Primary)
    }

    /// All soft-deleted measurements, in stored order
    pub fn list_trash(&self) -> Outcome<Vec<Measurement>> {
        self.list(Collection::Trash)
    }

    fn list(&self, collection: Collection) -> Outcome<Vec<Measurement>> {
        match self.load(collection) {
            Ok(rows) => Outcome::ok(format!("{} {collection} records", rows.len()), rows),
            Err(err) => err.into_outcome("Listing"),
        }
    }

    /// Whether the primary object exists yet
    pub fn has_primary(&self) -> Outcome<bool> {
        match self.store.exists(Collection::Primary) {
            Ok(true) => Outcome::ok("Primary data exists", true),
            Ok(false) => Outcome::ok("No primary data yet", false),
            Err(err) => StepError::Storage(Collection::Primary, err).into_outcome("Lookup"),
        }
    }

    /// The live row for a date, if any
    ///
    /// Finding nothing is a successful lookup without a value.
    pub fn find_by_date(&self, date: NaiveDate) -> Outcome<Measurement> {
        let rows = match self.load(Collection::Primary) {
            Ok(rows) => rows,
            Err(err) => return err.into_outcome("Lookup"),
        };
        match rows.into_iter().find(|row| row.date == Some(date)) {
            Some(row) => Outcome::ok(format!("Record found for {}", format_date(date)), row),
            None => Outcome::info(format!("No record for {}", format_date(date))),
        }
    }

    /// Most recent dated rows, newest first
    ///
    /// `None` uses the configured `recent_limit`.
    pub fn recent(&self, limit: Option<usize>) -> Outcome<Vec<Measurement>> {
        let limit = limit.unwrap_or(self.entry.recent_limit);
        let mut rows = match self.load(Collection::Primary) {
            Ok(rows) => rows,
            Err(err) => return err.into_outcome("Listing"),
        };
        rows.retain(|row| row.date.is_some());
        rows.sort_by(|a, b| compare_by_date(b, a));
        rows.truncate(limit);
        Outcome::ok(format!("{} most recent records", rows.len()), rows)
    }

    /// Derived series over the live rows
    pub fn analysis(&self) -> Outcome<AnalysisSeries> {
        match self.load(Collection::Primary) {
            Ok(rows) => {
                let series = AnalysisSeries::build(&rows, &self.entry);
                Outcome::ok(format!("{} points", series.len()), series)
            }
            Err(err) => err.into_outcome("Analysis"),
        }
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// Seed the primary collection from an uploaded table
    ///
    /// Only allowed while the primary object does not exist. The value is the
    /// number of rows kept after normalisation and dedup.
    pub fn import_initial(&self, bytes: &[u8]) -> Outcome<usize> {
        match self.store.exists(Collection::Primary) {
            Ok(false) => {}
            Ok(true) => return Outcome::failed("Primary data already exists; import skipped"),
            Err(err) => return StepError::Storage(Collection::Primary, err).into_outcome("Import"),
        }

        let rows = match decode_measurements(bytes) {
            Ok(rows) => rows,
            Err(err) => {
                warn!(error = %err, "uploaded table rejected");
                return Outcome::failed(format!("Import failed: the uploaded file could not be read: {err}"));
            }
        };

        let count = rows.len();
        if let Err(err) = self.save(Collection::Primary, rows, "initial import") {
            return err.into_outcome("Import");
        }
        info!(rows = count, "primary seeded from upload");
        Outcome::ok(format!("Imported {count} records"), count)
    }

    /// Add a new measurement
    ///
    /// The entered level is reduced by the configured offset before the id is
    /// computed. Fails if the date already has a live row.
    pub fn insert(&self, input: &EntryInput) -> Outcome<Measurement> {
        let date = match self.checked_date(input) {
            Ok(date) => date,
            Err(outcome) => return outcome,
        };

        let mut rows = match self.load(Collection::Primary) {
            Ok(rows) => rows,
            Err(err) => return err.into_outcome("Insert"),
        };
        if rows.iter().any(|row| row.date == Some(date)) {
            return Outcome::failed(format!(
                "A record for {} already exists; edit or delete it first",
                format_date(date)
            ));
        }

        let record = self.stored_measurement(date, &input.reading);
        rows.push(record.clone());
        if let Err(err) = self.save(Collection::Primary, rows, &format!("insert {}", format_date(date))) {
            return err.into_outcome("Insert");
        }

        info!(id = %record.id, date = %record.date_str(), "record inserted");
        Outcome::ok(
            format!("Record for {} saved (id {})", format_date(date), record.id),
            record,
        )
    }

    /// Save the entry for a date, replacing the live row for that date if any
    ///
    /// One load-mutate-save cycle: the old row is removed by id and the new,
    /// offset-adjusted row appended.
    pub fn submit_for_date(&self, input: &EntryInput) -> Outcome<Measurement> {
        let date = match self.checked_date(input) {
            Ok(date) => date,
            Err(outcome) => return outcome,
        };

        let mut rows = match self.load(Collection::Primary) {
            Ok(rows) => rows,
            Err(err) => return err.into_outcome("Save"),
        };
        let replaced: HashSet<RecordId> = rows
            .iter()
            .filter(|row| row.date == Some(date))
            .map(|row| row.id.clone())
            .collect();
        rows.retain(|row| !replaced.contains(&row.id));

        let record = self.stored_measurement(date, &input.reading);
        rows.push(record.clone());
        if let Err(err) = self.save(Collection::Primary, rows, &format!("save {}", format_date(date))) {
            return err.into_outcome("Save");
        }

        info!(id = %record.id, replaced = replaced.len(), "record submitted for date");
        let message = if replaced.is_empty() {
            format!("Record for {} saved (id {})", format_date(date), record.id)
        } else {
            format!("Record for {} updated (id {})", format_date(date), record.id)
        };
        Outcome::ok(message, record)
    }

    /// Change the numbers of a live row
    ///
    /// The id is content-derived, so the returned row carries a new id;
    /// callers holding the old one must re-resolve it.
    pub fn edit(&self, id: &RecordId, reading: &Reading) -> Outcome<Measurement> {
        if let Err(errors) = validate_reading(reading) {
            return Outcome::failed("Invalid entry").with_details(errors.messages());
        }

        let mut rows = match self.load(Collection::Primary) {
            Ok(rows) => rows,
            Err(err) => return err.into_outcome("Edit"),
        };
        let Some(row) = rows.iter_mut().find(|row| &row.id == id) else {
            return Outcome::failed(format!("No record with id {id}"));
        };

        let (level, rainfall, extraction) = self.stored_values(reading);
        row.level = level;
        row.rainfall = rainfall;
        row.extraction = extraction;
        row.refresh_id();
        let updated = row.clone();

        if let Err(err) = self.save(Collection::Primary, rows, &format!("edit {id}")) {
            return err.into_outcome("Edit");
        }

        info!(old_id = %id, new_id = %updated.id, "record edited");
        Outcome::ok(format!("Record {id} updated; new id {}", updated.id), updated)
    }

    /// Soft-delete the live rows with an id
    ///
    /// Remembers the rows in the session buffer, appends them to trash, then
    /// saves primary without them. If the trash append fails primary is left
    /// untouched; if the primary save fails the rows just appended to trash
    /// are removed again.
    pub fn delete(&self, session: &mut Session, id: &RecordId) -> Outcome<Vec<Measurement>> {
        let mut primary = match self.load(Collection::Primary) {
            Ok(rows) => rows,
            Err(err) => return err.into_outcome("Delete"),
        };
        let removed: Vec<Measurement> = primary.iter().filter(|row| &row.id == id).cloned().collect();
        if removed.is_empty() {
            return Outcome::failed(format!("No record with id {id}"));
        }

        session.last_deleted_mut().replace(removed.clone());

        let mut trash = match self.load(Collection::Trash) {
            Ok(rows) => rows,
            Err(err) => return err.into_outcome("Delete"),
        };
        let appended = append_new(&mut trash, &removed);
        if let Err(err) = self.save(Collection::Trash, trash, &format!("trash {id}")) {
            return err.into_outcome("Delete");
        }

        primary.retain(|row| &row.id != id);
        if let Err(err) = self.save(Collection::Primary, primary, &format!("delete {id}")) {
            self.withdraw_from_trash(&appended);
            return err.into_outcome("Delete");
        }

        info!(%id, rows = removed.len(), "record moved to trash");
        Outcome::ok(format!("Record {id} moved to trash"), removed)
    }

    /// Put back the rows of the last delete, bypassing the trash collection
    ///
    /// Clears the session buffer whatever happens. Rows whose id is already
    /// live are skipped, so a repeated undo is a no-op. Only the ids actually
    /// put back are removed from trash; when nothing is put back nothing is
    /// written.
    pub fn undo_last_delete(&self, session: &mut Session) -> Outcome<Vec<Measurement>> {
        let Some(rows) = session.last_deleted_mut().take() else {
            return Outcome::info("Nothing to undo");
        };

        let mut primary = match self.load(Collection::Primary) {
            Ok(rows) => rows,
            Err(err) => return err.into_outcome("Undo"),
        };
        let added = append_new(&mut primary, &rows);
        if added.is_empty() {
            debug!(rows = rows.len(), "undo found every row already live");
            return Outcome::info("Nothing to undo: the deleted records are already present");
        }
        if let Err(err) = self.save(Collection::Primary, primary, "undo delete") {
            return err.into_outcome("Undo");
        }

        let undone: HashSet<RecordId> = added.iter().map(|row| row.id.clone()).collect();
        if let Err(err) = self.remove_from_trash(&undone) {
            warn!(rows = added.len(), error = %err, "undo saved primary but trash cleanup failed");
            return Outcome::failed(format!(
                "Undo restored {} record(s) but trash cleanup failed: {err}; restore them from trash to finish",
                added.len()
            ));
        }

        info!(rows = added.len(), "last delete undone");
        Outcome::ok(format!("Restored {} record(s)", added.len()), added)
    }

    /// Move a row from trash back to primary
    ///
    /// If the id is already live the trash copy is dropped and the operation
    /// succeeds without creating a duplicate.
    pub fn restore(&self, id: &RecordId) -> Outcome<Measurement> {
        let trash = match self.load(Collection::Trash) {
            Ok(rows) => rows,
            Err(err) => return err.into_outcome("Restore"),
        };
        if trash.is_empty() {
            return Outcome::failed("Trash is empty");
        }
        let Some(row) = trash.iter().find(|row| &row.id == id).cloned() else {
            return Outcome::failed(format!("No record with id {id} in trash"));
        };

        let mut primary = match self.load(Collection::Primary) {
            Ok(rows) => rows,
            Err(err) => return err.into_outcome("Restore"),
        };
        let already_live = primary.iter().any(|live| &live.id == id);
        if !already_live {
            primary.push(row.clone());
            if let Err(err) = self.save(Collection::Primary, primary, &format!("restore {id}")) {
                return err.into_outcome("Restore");
            }
        }

        let ids = HashSet::from([id.clone()]);
        if let Err(err) = self.remove_from_trash(&ids) {
            return err.into_outcome("Restore");
        }

        if already_live {
            info!(%id, "record already live, trash copy dropped");
            Outcome::ok(format!("Record {id} was already present; removed from trash"), row)
        } else {
            info!(%id, "record restored from trash");
            Outcome::ok(format!("Record {id} restored"), row)
        }
    }

    /// Empty the trash in one write
    ///
    /// The value is the number of rows purged. Irreversible.
    pub fn purge_trash(&self) -> Outcome<usize> {
        let count = match self.load(Collection::Trash) {
            Ok(rows) => rows.len(),
            Err(err) => {
                warn!(error = %err, "could not count trash before purge");
                0
            }
        };
        match self.store.clear(Collection::Trash, "purge trash") {
            Ok(WriteOutcome::Written) => {}
            Ok(WriteOutcome::Conflict) => return StepError::Conflict(Collection::Trash).into_outcome("Purge"),
            Err(err) => return StepError::Storage(Collection::Trash, err).into_outcome("Purge"),
        }

        info!(rows = count, "trash purged");
        if count == 0 {
            Outcome::ok("Trash was already empty", 0)
        } else {
            Outcome::ok(format!("Trash purged ({count} records removed)"), count)
        }
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn checked_date(&self, input: &EntryInput) -> Result<NaiveDate, Outcome<Measurement>> {
        if let Err(errors) = validate_entry(input, self.today()) {
            return Err(Outcome::failed("Invalid entry").with_details(errors.messages()));
        }
        input
            .date
            .ok_or_else(|| Outcome::failed("Invalid entry").with_details(vec!["date is required".to_string()]))
    }

    fn stored_values(&self, reading: &Reading) -> (Option<f64>, Option<f64>, Option<f64>) {
        (
            reading.level.map(|level| level - self.entry.level_offset),
            Some(reading.rainfall.unwrap_or(0.0)),
            Some(reading.extraction.unwrap_or(0.0)),
        )
    }

    fn stored_measurement(&self, date: NaiveDate, reading: &Reading) -> Measurement {
        let (level, rainfall, extraction) = self.stored_values(reading);
        Measurement::new(Some(date), level, rainfall, extraction)
    }

    fn load(&self, collection: Collection) -> Result<Vec<Measurement>, StepError> {
        self.store
            .load(collection)
            .map_err(|err| StepError::Storage(collection, err))
    }

    fn save(&self, collection: Collection, rows: Vec<Measurement>, description: &str) -> Result<(), StepError> {
        match self.store.save(collection, rows, description) {
            Ok(WriteOutcome::Written) => Ok(()),
            Ok(WriteOutcome::Conflict) => Err(StepError::Conflict(collection)),
            Err(err) => Err(StepError::Storage(collection, err)),
        }
    }

    fn remove_from_trash(&self, ids: &HashSet<RecordId>) -> Result<(), StepError> {
        let mut trash = self.load(Collection::Trash)?;
        let before = trash.len();
        trash.retain(|row| !ids.contains(&row.id));
        if trash.len() == before {
            return Ok(());
        }
        self.save(Collection::Trash, trash, "remove restored records")
    }

    fn withdraw_from_trash(&self, appended: &[Measurement]) {
        if appended.is_empty() {
            return;
        }
        let ids: HashSet<RecordId> = appended.iter().map(|row| row.id.clone()).collect();
        match self.remove_from_trash(&ids) {
            Ok(()) => warn!(rows = ids.len(), "primary save failed, trash append withdrawn"),
            Err(err) => error!(rows = ids.len(), error = %err, "primary save failed and trash append could not be withdrawn"),
        }
    }
}

/// Append rows whose id is not yet in `target`; returns what was appended
fn append_new(target: &mut Vec<Measurement>, rows: &[Measurement]) -> Vec<Measurement> {
    let mut known: HashSet<RecordId> = target.iter().map(|row| row.id.clone()).collect();
    let mut appended = Vec::new();
    for row in rows {
        if known.insert(row.id.clone()) {
            target.push(row.clone());
            appended.push(row.clone());
        }
    }
    appended
}
