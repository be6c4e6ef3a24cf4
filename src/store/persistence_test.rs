use tempfile::TempDir;

use crate::db::{Diff, Journal, JournalCache, Properties, StoreState, Timestamp};
use crate::store::persistence::*;

fn props(pairs: &[(&str, &str)]) -> Properties {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_save_plan_union() {
    let cache_only = SavePlan {
        journal_cache: true,
        state: false,
    };
    let state_only = SavePlan {
        journal_cache: false,
        state: true,
    };

    assert_eq!(cache_only.union(state_only), SavePlan::all());
    assert_eq!(SavePlan::default().union(cache_only), cache_only);
    assert!(SavePlan::default().is_empty());
    assert!(!cache_only.is_empty());
}

#[test]
fn test_load_from_empty_dir() {
    let temp = TempDir::new().unwrap();

    let (cache, state) = FilePersistence::in_dir(temp.path()).load().unwrap();

    assert!(cache.is_empty());
    assert_eq!(state, StoreState::default());
}

#[test]
fn test_saved_structures_load_back() {
    let temp = TempDir::new().unwrap();
    let mut persistence = FilePersistence::in_dir(temp.path());
    let at = Timestamp::from_unix(1_500_000_000).unwrap();
    let diff = Diff::new("apple", at, props(&[("color", "red")]));
    let mut cache = JournalCache::new();
    cache.insert("phone".to_string(), Journal::new("phone", vec![diff.clone()]));
    let mut state = StoreState::default();
    state.record(diff);

    persistence.save_journal_cache(&cache).unwrap();
    persistence.save_state(&state).unwrap();

    assert!(temp.path().join("journal_cache.json").exists());
    assert!(temp.path().join("state.json").exists());
    let (loaded_cache, loaded_state) = persistence.load().unwrap();
    assert_eq!(loaded_cache, cache);
    assert_eq!(loaded_state, state);
}

#[test]
fn test_save_into_missing_dir_fails() {
    let temp = TempDir::new().unwrap();
    let mut persistence = FilePersistence::in_dir(&temp.path().join("missing"));

    let err = persistence.save_state(&StoreState::default()).unwrap_err();

    assert!(matches!(err, StoreError::SaveFailed { target: "state", .. }));
}
