//! Property tests for record identity and normalisation.
//!
//! These pin down the guarantees the stores rely on:
//! - the fingerprint is a pure function of the rendered fields
//! - normalising an already-normalised collection changes nothing
//! - deduplication keeps the first row carrying a given id

use chrono::NaiveDate;
use hidropal_record::{
    decode_measurements, encode_table, ensure_ids, fingerprint, format_date, normalize, Measurement,
    RawRow, ID_LEN,
};
use proptest::prelude::*;

fn day() -> impl Strategy<Value = Option<NaiveDate>> {
    prop::option::of((2000i32..2030, 1u32..=12, 1u32..=28))
        .prop_map(|ymd| ymd.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)))
}

fn amount() -> impl Strategy<Value = Option<f64>> {
    prop::option::of(0.0f64..10_000.0)
}

fn measurement() -> impl Strategy<Value = Measurement> {
    (day(), amount(), amount(), amount())
        .prop_map(|(date, level, rainfall, extraction)| Measurement::new(date, level, rainfall, extraction))
}

fn raw_cell() -> impl Strategy<Value = Option<String>> {
    prop::option::of(prop_oneof![
        Just(String::new()),
        Just("nan".to_string()),
        Just("n/a".to_string()),
        (0.0f64..500.0).prop_map(|v| format!("{v:.2}")),
        (1u32..=28, 1u32..=12, 2000u32..2030).prop_map(|(d, m, y)| format!("{d}/{m}/{y}")),
        (2000u32..2030, 1u32..=12, 1u32..=28).prop_map(|(y, m, d)| format!("{y}-{m:02}-{d:02}")),
    ])
}

fn raw_row() -> impl Strategy<Value = RawRow> {
    (raw_cell(), raw_cell(), raw_cell(), raw_cell()).prop_map(|(date, level, rainfall, extraction)| RawRow {
        date,
        level,
        rainfall,
        extraction,
    })
}

proptest! {
    #[test]
    fn prop_fingerprint_is_deterministic(
        date in day(),
        level in amount(),
        rainfall in amount(),
        extraction in amount(),
    ) {
        let date_str = date.map_or_else(|| "nan".to_string(), format_date);
        let a = fingerprint(&date_str, level, rainfall, extraction);
        let b = fingerprint(&date_str, level, rainfall, extraction);
        prop_assert_eq!(a.as_str().len(), ID_LEN);
        prop_assert!(a.as_str().bytes().all(|c| c.is_ascii_hexdigit()));
        prop_assert_eq!(a, b);
    }

    #[test]
    fn prop_normalize_is_idempotent(rows in prop::collection::vec(raw_row(), 0..20)) {
        let once = normalize(rows);
        let twice = ensure_ids(once.clone());
        prop_assert_eq!(&once, &twice);

        let reloaded = decode_measurements(&encode_table(&once).unwrap()).unwrap();
        prop_assert_eq!(&once, &reloaded);
    }

    #[test]
    fn prop_ensure_ids_keeps_first(rows in prop::collection::vec(measurement(), 1..10)) {
        let mut doubled = rows.clone();
        doubled.extend(rows.iter().cloned());
        let deduped = ensure_ids(doubled);
        let expected = ensure_ids(rows);
        prop_assert_eq!(deduped, expected);
    }
}

#[test]
fn distinct_inputs_yield_distinct_ids() {
    let base = ("03/04/2024", Some(5.03), Some(12.0), Some(300.0));
    let variants = [
        ("04/04/2024", Some(5.03), Some(12.0), Some(300.0)),
        ("03/04/2024", Some(5.04), Some(12.0), Some(300.0)),
        ("03/04/2024", Some(5.03), Some(12.5), Some(300.0)),
        ("03/04/2024", Some(5.03), Some(12.0), Some(301.0)),
        ("03/04/2024", Some(5.03), Some(12.0), None),
        ("03/04/2024", Some(5.030_001), Some(12.0), Some(300.0)),
    ];
    let base_id = fingerprint(base.0, base.1, base.2, base.3);
    let mut seen = vec![base_id];
    for (date, level, rainfall, extraction) in variants {
        let id = fingerprint(date, level, rainfall, extraction);
        assert!(!seen.contains(&id), "collision for {date} {level:?} {rainfall:?} {extraction:?}");
        seen.push(id);
    }
}

#[test]
fn dedup_keeps_first_encountered_row_object() {
    let date = NaiveDate::from_ymd_opt(2024, 4, 3);
    let first = Measurement::new(date, Some(5.03), Some(12.0), Some(300.0));
    // Same content, stale id: still collapses onto the first row
    let mut second = first.clone();
    second.id = "ffffffffffffffff".parse().unwrap();
    let other = Measurement::new(date, Some(5.0), Some(0.0), Some(0.0));

    let out = ensure_ids(vec![first.clone(), other.clone(), second]);
    assert_eq!(out, vec![first, other]);
}
