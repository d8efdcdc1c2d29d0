//! The measurement record
//!
//! One observation for one calendar date: water level (meters), rainfall
//! (millimeters) and extraction volume (liters).

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::date::format_date;
use crate::id::{fingerprint, RecordId, MISSING_TOKEN};

/// A single well measurement
///
/// `date` is `None` when the source value could not be parsed. The numeric
/// fields are `None` when missing or non-numeric. `id` is derived from the
/// other four fields; call [`Measurement::refresh_id`] after mutating them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub date: Option<NaiveDate>,
    pub level: Option<f64>,
    pub rainfall: Option<f64>,
    pub extraction: Option<f64>,
    pub id: RecordId,
}

impl Measurement {
    /// Create a measurement and derive its id
    #[must_use]
    pub fn new(
        date: Option<NaiveDate>,
        level: Option<f64>,
        rainfall: Option<f64>,
        extraction: Option<f64>,
    ) -> Self {
        let id = compute_id(date, level, rainfall, extraction);
        Self {
            date,
            level,
            rainfall,
            extraction,
            id,
        }
    }

    /// Date as persisted (`dd/mm/YYYY`), empty when missing
    #[must_use]
    pub fn date_str(&self) -> String {
        self.date.map(format_date).unwrap_or_default()
    }

    /// Id the current field values would produce
    #[must_use]
    pub fn expected_id(&self) -> RecordId {
        compute_id(self.date, self.level, self.rainfall, self.extraction)
    }

    /// Recompute `id` from the current field values
    pub fn refresh_id(&mut self) {
        self.id = self.expected_id();
    }

    /// Builder-style variant of [`Measurement::refresh_id`]
    #[must_use]
    pub fn with_refreshed_id(mut self) -> Self {
        self.refresh_id();
        self
    }
}

fn compute_id(
    date: Option<NaiveDate>,
    level: Option<f64>,
    rainfall: Option<f64>,
    extraction: Option<f64>,
) -> RecordId {
    let date_str = date.map_or_else(|| MISSING_TOKEN.to_string(), format_date);
    fingerprint(&date_str, level, rainfall, extraction)
}

/// Order by date ascending, missing dates last
#[must_use]
pub fn compare_by_date(a: &Measurement, b: &Measurement) -> Ordering {
    match (a.date, b.date) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Stable sort by date ascending, missing dates last
pub fn sort_by_date(rows: &mut [Measurement]) {
    rows.sort_by(compare_by_date);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn new_derives_id_from_fields() {
        let m = Measurement::new(ymd(2024, 4, 3), Some(5.03), Some(12.0), Some(300.0));
        assert_eq!(m.id.as_str(), "5fee6c2346a79467");
        assert_eq!(m.date_str(), "03/04/2024");
    }

    #[test]
    fn mutation_changes_expected_id() {
        let mut m = Measurement::new(ymd(2024, 4, 3), Some(5.03), Some(12.0), Some(300.0));
        let old = m.id.clone();
        m.level = Some(4.5);
        assert_eq!(m.id, old);
        m.refresh_id();
        assert_ne!(m.id, old);
    }

    #[test]
    fn missing_date_sorts_last() {
        let mut rows = vec![
            Measurement::new(None, Some(1.0), None, None),
            Measurement::new(ymd(2024, 1, 2), Some(2.0), None, None),
            Measurement::new(ymd(2024, 1, 1), Some(3.0), None, None),
        ];
        sort_by_date(&mut rows);
        assert_eq!(rows[0].level, Some(3.0));
        assert_eq!(rows[1].level, Some(2.0));
        assert_eq!(rows[2].date, None);
    }
}
