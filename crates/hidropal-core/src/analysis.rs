//! Derived time series
//!
//! Numbers behind the charts: depth, day-over-day level variation and
//! trailing rainfall sums. No rendering happens here.

use chrono::NaiveDate;
use hidropal_record::{sort_by_date, Measurement};
use serde::Serialize;

use crate::config::EntryConfig;

/// One dated point of the derived series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub level: Option<f64>,
    /// `reference_depth - level`
    pub depth: Option<f64>,
    pub rainfall: Option<f64>,
    pub extraction: Option<f64>,
    /// Change of `-level` since the previous point
    pub level_variation: Option<f64>,
    /// Sum of the trailing rainfall window, once full
    pub rainfall_rolling: Option<f64>,
}

/// Date-ordered derived series over a set of measurements
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalysisSeries {
    points: Vec<SeriesPoint>,
}

impl AnalysisSeries {
    /// Build from rows in any order; rows without a date are left out
    #[must_use]
    pub fn build(rows: &[Measurement], config: &EntryConfig) -> Self {
        let mut dated: Vec<Measurement> = rows.iter().filter(|row| row.date.is_some()).cloned().collect();
        sort_by_date(&mut dated);

        let window = config.rolling_window_days.max(1);
        let rainfall: Vec<Option<f64>> = dated.iter().map(|row| row.rainfall).collect();

        let mut points = Vec::with_capacity(dated.len());
        let mut previous_level: Option<f64> = None;
        for (index, row) in dated.iter().enumerate() {
            let Some(date) = row.date else { continue };
            let level_variation = if index == 0 {
                None
            } else {
                previous_level.zip(row.level).map(|(prev, cur)| prev - cur)
            };
            previous_level = row.level;

            points.push(SeriesPoint {
                date,
                level: row.level,
                depth: row.level.map(|level| config.reference_depth - level),
                rainfall: row.rainfall,
                extraction: row.extraction,
                level_variation,
                rainfall_rolling: trailing_sum(&rainfall, index, window),
            });
        }
        Self { points }
    }

    #[inline]
    #[must_use]
    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[must_use]
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    #[must_use]
    pub fn depths(&self) -> Vec<Option<f64>> {
        self.points.iter().map(|p| p.depth).collect()
    }

    #[must_use]
    pub fn level_variations(&self) -> Vec<Option<f64>> {
        self.points.iter().map(|p| p.level_variation).collect()
    }

    #[must_use]
    pub fn rolling_rainfall(&self) -> Vec<Option<f64>> {
        self.points.iter().map(|p| p.rainfall_rolling).collect()
    }

    #[must_use]
    pub fn extractions(&self) -> Vec<Option<f64>> {
        self.points.iter().map(|p| p.extraction).collect()
    }
}

fn trailing_sum(values: &[Option<f64>], index: usize, window: usize) -> Option<f64> {
    if index + 1 < window {
        return None;
    }
    values[index + 1 - window..=index].iter().copied().sum()
}

/// Map a series onto `[0, 1]`
///
/// Missing values stay missing. A series with no spread (constant or with
/// fewer than one finite value) maps to all `None`.
#[must_use]
pub fn min_max_normalize(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let finite = values.iter().flatten().copied().filter(|v| v.is_finite());
    let (min, max) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let span = max - min;
    if !span.is_finite() || span <= 0.0 {
        return vec![None; values.len()];
    }
    values
        .iter()
        .map(|v| v.filter(|v| v.is_finite()).map(|v| (v - min) / span))
        .collect()
}
