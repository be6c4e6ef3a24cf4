use crate::db::{Diff, Journal, JournalCache, Properties, Timestamp};
use crate::merge::demux::*;

fn ts(seconds: i64) -> Timestamp {
    Timestamp::from_unix(1_500_000_000 + seconds).unwrap()
}

fn props(pairs: &[(&str, &str)]) -> Properties {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn diff(entity: &str, at: i64, pairs: &[(&str, &str)]) -> Diff {
    Diff::new(entity, ts(at), props(pairs))
}

#[test]
fn test_empty_input_yields_empty_patch() {
    let mut cache = JournalCache::new();
    cache.insert(
        "device-a".to_string(),
        Journal::new("device-a", vec![diff("x", 1, &[("a", "1")])]),
    );

    let result = demux_journals(&[], &cache);

    assert!(result.patch.is_empty());
    assert_eq!(result.cache, cache);
    assert!(!result.cache_changed);
}

#[test]
fn test_new_journal_is_split_by_entity() {
    let journal = Journal::new(
        "device-a",
        vec![
            diff("x", 1, &[("a", "1")]),
            diff("y", 2, &[("b", "1")]),
            diff("x", 3, &[("a", "2")]),
        ],
    );

    let result = demux_journals(std::slice::from_ref(&journal), &JournalCache::new());

    assert!(result.cache_changed);
    assert_eq!(result.patch.len(), 2);
    assert_eq!(result.patch["x"].identifier, "x");
    assert_eq!(result.patch["x"].len(), 2);
    assert_eq!(result.patch["y"].len(), 1);
    assert_eq!(result.cache["device-a"], journal);
}

#[test]
fn test_extended_journal_yields_only_appended_diffs() {
    let old = Journal::new(
        "device-a",
        vec![diff("x", 1, &[("a", "1")]), diff("y", 2, &[("b", "1")])],
    );
    let mut cache = JournalCache::new();
    cache.insert("device-a".to_string(), old.clone());

    let mut extended = old.clone();
    extended.diffs.push(diff("y", 3, &[("b", "2")]));
    extended.diffs.push(diff("z", 4, &[("c", "1")]));
    extended.diffs.push(diff("y", 5, &[("b", "3")]));

    let result = demux_journals(std::slice::from_ref(&extended), &cache);

    assert!(result.cache_changed);
    assert!(!result.patch.contains_key("x"));
    assert_eq!(
        result.patch["y"].diffs,
        vec![diff("y", 3, &[("b", "2")]), diff("y", 5, &[("b", "3")])]
    );
    assert_eq!(result.patch["z"].len(), 1);
    let total: usize = result.patch.values().map(|j| j.len()).sum();
    assert_eq!(total, 3);
    assert_eq!(result.cache["device-a"], extended);
}

#[test]
fn test_unchanged_journal_does_not_mark_cache_changed() {
    let journal = Journal::new("device-a", vec![diff("x", 1, &[("a", "1")])]);
    let mut cache = JournalCache::new();
    cache.insert("device-a".to_string(), journal.clone());

    let result = demux_journals(&[journal], &cache);

    assert!(result.patch.is_empty());
    assert!(!result.cache_changed);
}

#[test]
fn test_diffs_from_several_devices_are_sorted_by_timestamp() {
    let a = Journal::new(
        "device-a",
        vec![diff("x", 5, &[("a", "late")]), diff("x", 1, &[("a", "early")])],
    );
    let b = Journal::new("device-b", vec![diff("x", 3, &[("a", "middle")])]);

    let result = demux_journals(&[a, b], &JournalCache::new());

    let order: Vec<Timestamp> = result.patch["x"].diffs.iter().map(|d| d.timestamp).collect();
    assert_eq!(order, vec![ts(1), ts(3), ts(5)]);
    assert_eq!(result.cache.len(), 2);
}

#[test]
fn test_equal_timestamps_keep_arrival_order() {
    let a = Journal::new(
        "device-a",
        vec![diff("x", 1, &[("a", "first")]), diff("x", 1, &[("a", "second")])],
    );

    let result = demux_journals(&[a], &JournalCache::new());

    let values: Vec<&str> = result.patch["x"]
        .diffs
        .iter()
        .map(|d| d.properties["a"].as_str())
        .collect();
    assert_eq!(values, vec!["first", "second"]);
}

#[test]
fn test_cache_entries_for_other_devices_are_kept() {
    let mut cache = JournalCache::new();
    cache.insert(
        "device-b".to_string(),
        Journal::new("device-b", vec![diff("y", 1, &[("b", "1")])]),
    );
    let a = Journal::new("device-a", vec![diff("x", 2, &[("a", "1")])]);

    let result = demux_journals(&[a], &cache);

    assert_eq!(result.cache.len(), 2);
    assert_eq!(result.cache["device-b"], cache["device-b"]);
}

#[test]
fn test_shorter_journal_contributes_nothing_but_replaces_cache() {
    let long = Journal::new(
        "device-a",
        vec![diff("x", 1, &[("a", "1")]), diff("x", 2, &[("a", "2")])],
    );
    let mut cache = JournalCache::new();
    cache.insert("device-a".to_string(), long);
    let short = Journal::new("device-a", vec![diff("x", 1, &[("a", "1")])]);

    let result = demux_journals(std::slice::from_ref(&short), &cache);

    assert!(result.patch.is_empty());
    assert!(!result.cache_changed);
    assert_eq!(result.cache["device-a"], short);
}
