//! Entry validation
//!
//! Runs on raw user input before any offset or normalisation is applied.
//! Collects every distinct problem instead of stopping at the first.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{ValidationErrors, ValidationIssue};

/// Numbers of one reading as entered by the user
///
/// `level` is the raw gauge value, before the instrument offset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub level: Option<f64>,
    pub rainfall: Option<f64>,
    pub extraction: Option<f64>,
}

impl Reading {
    /// Reading with all three values present
    #[inline]
    #[must_use]
    pub fn new(level: f64, rainfall: f64, extraction: f64) -> Self {
        Self {
            level: Some(level),
            rainfall: Some(rainfall),
            extraction: Some(extraction),
        }
    }

    /// Only a level; rainfall and extraction default to zero when stored
    #[inline]
    #[must_use]
    pub fn level_only(level: f64) -> Self {
        Self {
            level: Some(level),
            ..Self::default()
        }
    }
}

/// A new measurement as entered by the user
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryInput {
    pub date: Option<NaiveDate>,
    pub reading: Reading,
}

impl EntryInput {
    /// Entry for a date
    #[inline]
    #[must_use]
    pub fn new(date: NaiveDate, reading: Reading) -> Self {
        Self {
            date: Some(date),
            reading,
        }
    }
}

/// Validate a reading (used for edits)
///
/// # Errors
/// Returns every distinct issue found
pub fn validate_reading(reading: &Reading) -> Result<(), ValidationErrors> {
    finish(reading_issues(reading))
}

/// Validate a full entry against `today`
///
/// # Errors
/// Returns every distinct issue found
pub fn validate_entry(input: &EntryInput, today: NaiveDate) -> Result<(), ValidationErrors> {
    let mut issues = Vec::new();
    match input.date {
        None => issues.push(ValidationIssue::MissingDate),
        Some(date) if date > today => issues.push(ValidationIssue::FutureDate { date, today }),
        Some(_) => {}
    }
    issues.extend(reading_issues(&input.reading));
    finish(issues)
}

fn reading_issues(reading: &Reading) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    match reading.level {
        None => issues.push(ValidationIssue::MissingLevel),
        Some(v) if !v.is_finite() => issues.push(ValidationIssue::NotFinite("water level")),
        Some(v) if v <= 0.0 => issues.push(ValidationIssue::NonPositiveLevel(v)),
        Some(_) => {}
    }

    match reading.rainfall {
        Some(v) if !v.is_finite() => issues.push(ValidationIssue::NotFinite("rainfall")),
        Some(v) if v < 0.0 => issues.push(ValidationIssue::NegativeRainfall(v)),
        _ => {}
    }

    match reading.extraction {
        Some(v) if !v.is_finite() => issues.push(ValidationIssue::NotFinite("extraction")),
        Some(v) if v < 0.0 => issues.push(ValidationIssue::NegativeExtraction(v)),
        _ => {}
    }

    issues
}

fn finish(mut issues: Vec<ValidationIssue>) -> Result<(), ValidationErrors> {
    let mut distinct: Vec<ValidationIssue> = Vec::with_capacity(issues.len());
    for issue in issues.drain(..) {
        if !distinct.contains(&issue) {
            distinct.push(issue);
        }
    }
    if distinct.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(distinct))
    }
}
