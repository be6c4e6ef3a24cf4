//! Fold per-entity diff patches into a store state.
//!
//! Conflicts are resolved per property by diff timestamp: the latest diff
//! setting a key wins, whatever order or grouping the diffs arrive in.

use tracing::debug;

use crate::db::{
    Deltas, Diff, EntityObject, EntityPatch, Journal, Properties, StoreState, Timestamp,
};

/// New state and the observable changes that produced it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedState {
    pub state: StoreState,
    pub deltas: Deltas,
}

/// Fold every diff of `diffs` into one property overlay, later diffs winning.
pub fn fold_diffs<'a>(diffs: impl IntoIterator<Item = &'a Diff>) -> Properties {
    let mut overlay = Properties::new();
    for diff in diffs {
        for (key, value) in &diff.properties {
            overlay.insert(key.clone(), value.clone());
        }
    }
    overlay
}

/// Property-level difference between `candidate` and `previous`.
///
/// Only keys whose value is new or changed are kept. The delta carries the
/// previous creation date and the candidate's modification date.
pub fn object_delta(candidate: &EntityObject, previous: &EntityObject) -> EntityObject {
    EntityObject {
        identifier: previous.identifier.clone(),
        creation_date: previous.creation_date,
        last_modified_date: candidate.last_modified_date.max(previous.last_modified_date),
        properties: previous.changed_properties(&candidate.properties),
    }
}

/// Apply `patch` to `old`, returning the new state and non-empty deltas.
///
/// `now` stamps entities that have no snapshot entry yet.
///
/// When every new diff of an entity is later than its recorded history the
/// diffs are appended and only they are folded over the current object.
/// Otherwise the history is re-sorted and the entity is rebuilt from all of
/// its diffs.
pub fn generate_state(old: StoreState, patch: &EntityPatch, now: Timestamp) -> GeneratedState {
    let mut state = old;
    let mut deltas = Deltas::new();

    for (entity_id, entity_journal) in patch {
        let new_diffs = &entity_journal.diffs;
        let Some(first_new) = new_diffs.first() else {
            continue;
        };

        let old_diffs = state
            .histories
            .remove(entity_id)
            .map(|journal| journal.diffs)
            .unwrap_or_default();
        let existing = state.snapshot.remove(entity_id);
        let had_object = existing.is_some();
        let old_object = existing.unwrap_or_else(|| EntityObject::empty(entity_id.clone(), now));

        let append_only = old_diffs
            .last()
            .is_none_or(|last| last.timestamp < first_new.timestamp);

        let (merged, candidate) = if append_only {
            let overlay = fold_diffs(new_diffs);
            let mut candidate = old_object.clone();
            if !overlay.is_empty()
                && let Some(last) = new_diffs.last()
            {
                candidate.last_modified_date = last.timestamp;
            }
            candidate.apply(&overlay);

            let mut merged = old_diffs;
            merged.extend(new_diffs.iter().cloned());
            (merged, candidate)
        } else {
            let mut merged = old_diffs;
            merged.extend(new_diffs.iter().cloned());
            merged.sort_by_key(|diff| diff.timestamp);

            let creation_date = if had_object {
                old_object.creation_date
            } else {
                merged.first().map_or(now, |diff| diff.timestamp)
            };
            let last_modified = merged.last().map_or(now, |diff| diff.timestamp);
            let candidate = EntityObject {
                identifier: entity_id.clone(),
                creation_date,
                last_modified_date: last_modified,
                properties: fold_diffs(&merged),
            };
            debug!(entity = %entity_id, diffs = merged.len(), "rebuilt entity from history");
            (merged, candidate)
        };

        let delta = object_delta(&candidate, &old_object);
        if !delta.properties.is_empty() {
            deltas.insert(entity_id.clone(), delta);
        }

        state
            .histories
            .insert(entity_id.clone(), Journal::new(entity_id.clone(), merged));
        state.snapshot.insert(entity_id.clone(), candidate);
    }

    GeneratedState { state, deltas }
}
