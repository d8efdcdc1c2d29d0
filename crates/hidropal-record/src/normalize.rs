//! Record normalisation
//!
//! Canonicalises loosely-typed input rows before identity computation or
//! persistence:
//! - header labels are matched case- and whitespace-insensitively through a
//!   fixed synonym table
//! - dates are parsed day-first, numbers are coerced
//! - malformed values degrade to `None` instead of failing
//! - ids are recomputed and duplicates dropped, first occurrence wins

use std::collections::HashSet;

use crate::date::parse_date;
use crate::measurement::Measurement;

/// A canonical column of the persisted table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Date,
    Level,
    Rainfall,
    Extraction,
    Id,
}

impl Column {
    /// Persisted column order
    pub const PERSISTED: [Self; 5] = [
        Self::Date,
        Self::Level,
        Self::Rainfall,
        Self::Extraction,
        Self::Id,
    ];

    /// Canonical header name
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Level => "level",
            Self::Rainfall => "rainfall",
            Self::Extraction => "extraction",
            Self::Id => "id",
        }
    }

    /// Resolve a header label through the synonym table
    ///
    /// Unknown labels return `None` and their column is dropped.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        let key = label.trim().to_uppercase();
        SYNONYMS
            .iter()
            .find(|(synonym, _)| *synonym == key)
            .map(|(_, column)| *column)
    }
}

/// Upper-cased labels and the column each one names
const SYNONYMS: &[(&str, Column)] = &[
    ("DATE", Column::Date),
    ("FECHA", Column::Date),
    ("LEVEL", Column::Level),
    ("WATER LEVEL (M)", Column::Level),
    ("NIVEL", Column::Level),
    ("NIVEL DE AGUA (MTS.)", Column::Level),
    ("RAINFALL", Column::Rainfall),
    ("RAINFALL (MM)", Column::Rainfall),
    ("LLUVIA", Column::Rainfall),
    ("LLUVIA CAIDA (MM)", Column::Rainfall),
    ("EXTRACTION", Column::Extraction),
    ("EXTRACTION (L)", Column::Extraction),
    ("EXTRACCION", Column::Extraction),
    ("VOLUMEN EXTRAIDO (LTS.)", Column::Extraction),
    ("ID", Column::Id),
];

/// One input row before coercion
///
/// Absent columns stay `None`; the `id` column is never carried because ids
/// are always recomputed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    pub date: Option<String>,
    pub level: Option<String>,
    pub rainfall: Option<String>,
    pub extraction: Option<String>,
}

impl RawRow {
    /// Assign a cell to its column; the first assignment wins
    pub fn set(&mut self, column: Column, value: impl Into<String>) {
        let slot = match column {
            Column::Date => &mut self.date,
            Column::Level => &mut self.level,
            Column::Rainfall => &mut self.rainfall,
            Column::Extraction => &mut self.extraction,
            Column::Id => return,
        };
        if slot.is_none() {
            *slot = Some(value.into());
        }
    }

    /// Coerce into a typed measurement
    #[must_use]
    pub fn into_measurement(self) -> Measurement {
        Measurement::new(
            self.date.as_deref().and_then(parse_date),
            self.level.as_deref().and_then(coerce_number),
            self.rainfall.as_deref().and_then(coerce_number),
            self.extraction.as_deref().and_then(coerce_number),
        )
    }
}

/// Parse a numeric cell; empty, non-numeric and `NaN` become `None`
#[must_use]
pub fn coerce_number(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// Normalise raw rows into well-formed measurements
#[must_use]
pub fn normalize<I>(raw_rows: I) -> Vec<Measurement>
where
    I: IntoIterator<Item = RawRow>,
{
    ensure_ids(raw_rows.into_iter().map(RawRow::into_measurement))
}

/// Recompute every id and drop later rows that repeat an id
#[must_use]
pub fn ensure_ids<I>(rows: I) -> Vec<Measurement>
where
    I: IntoIterator<Item = Measurement>,
{
    let mut seen = HashSet::new();
    rows.into_iter()
        .map(Measurement::with_refreshed_id)
        .filter(|row| seen.insert(row.id.clone()))
        .collect()
}
