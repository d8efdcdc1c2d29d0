//! Engines built from TOML configuration

use std::fs;

use hidropal_core::{EntryInput, HidropalConfig, Reading, ReconciliationEngine, Session};
use hidropal_test_utils::{day, fixed_today};
use pretty_assertions::assert_eq;

#[test]
fn file_backend_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hidropal.toml");
    let text = format!(
        "[storage]\nbackend = \"file\"\ndata_dir = {:?}\nprimary_name = \"well.csv\"\ntrash_name = \"well_trash.csv\"\n\n[entry]\nlevel_offset = 0.0\n",
        dir.path().display().to_string()
    );
    fs::write(&path, text).unwrap();

    let config = HidropalConfig::load(&path).unwrap();
    let engine = ReconciliationEngine::from_config(&config).with_fixed_today(fixed_today());
    let mut session = Session::new();

    let row = engine
        .insert(&EntryInput::new(day(3), Reading::new(5.03, 12.0, 300.0)))
        .into_value()
        .unwrap();
    assert_eq!(row.id.as_str(), "5fee6c2346a79467");
    assert!(dir.path().join("well.csv").exists());

    engine.delete(&mut session, &row.id);
    let trash = fs::read_to_string(dir.path().join("well_trash.csv")).unwrap();
    assert_eq!(trash.lines().count(), 2);
}

#[test]
fn recent_limit_comes_from_config() {
    let config = HidropalConfig::from_toml_str(
        "[storage]\nbackend = \"memory_remote\"\n\n[entry]\nrecent_limit = 2\n",
    )
    .unwrap();
    let engine = ReconciliationEngine::from_config(&config).with_fixed_today(fixed_today());
    for d in 1..=4 {
        engine.insert(&EntryInput::new(day(d), Reading::level_only(5.0)));
    }
    let recent = engine.recent(None).into_value().unwrap();
    let dates: Vec<_> = recent.iter().map(|row| row.date.unwrap()).collect();
    assert_eq!(dates, vec![day(4), day(3)]);
}
