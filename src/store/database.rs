//! Store orchestrator.
//!
//! `Database` owns the journal cache, snapshot and histories of one device and
//! is the only thing that mutates them. It is synchronous and holds no locks:
//! a single owner (task, actor or serialized queue) must drive it.

use tracing::{debug, info, instrument, warn};

use crate::db::{
    Deltas, Diff, EntityObject, EntityPatch, Journal, JournalCache, JournalId, Properties,
    StoreState, Timestamp, is_reserved_key, strip_reserved, utils::generate_entity_id,
};
use crate::merge::{demux_journals, generate_state};

use super::notifier::{ChangeEvent, ChangeNotifier, ChangeSource};
use super::persistence::{SavePlan, StatePersistence, StoreError};

/// Outcome of `insert` or `update`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    /// The stored object after the call.
    pub object: EntityObject,
    /// Observable changes; empty for a no-op update.
    pub deltas: Deltas,
    /// Structures this call made dirty.
    pub save_plan: SavePlan,
}

/// Outcome of `merge`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// True if any entity changed.
    pub changed: bool,
    pub deltas: Deltas,
    pub save_plan: SavePlan,
}

/// The journal store of one device.
pub struct Database {
    local_id: JournalId,
    journal_cache: JournalCache,
    state: StoreState,
    dirty: SavePlan,
    notifier: Option<ChangeNotifier>,
}

impl Database {
    /// Create an empty store for the device `local_id`.
    pub fn new(local_id: impl Into<JournalId>) -> Self {
        Self::with_state(local_id, JournalCache::new(), StoreState::default())
    }

    /// Restore a store from previously saved structures.
    pub fn with_state(
        local_id: impl Into<JournalId>,
        journal_cache: JournalCache,
        state: StoreState,
    ) -> Self {
        Self {
            local_id: local_id.into(),
            journal_cache,
            state,
            dirty: SavePlan::default(),
            notifier: None,
        }
    }

    /// Broadcast every non-empty delta set to `notifier` as well.
    pub fn with_notifier(mut self, notifier: ChangeNotifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn local_id(&self) -> &str {
        &self.local_id
    }

    pub fn journal_cache(&self) -> &JournalCache {
        &self.journal_cache
    }

    pub fn state(&self) -> &StoreState {
        &self.state
    }

    /// Structures changed since the last successful `save`.
    pub fn pending_save(&self) -> SavePlan {
        self.dirty
    }

    /// This device's multiplex journal, empty if nothing was written yet.
    pub fn local_journal(&self) -> Journal {
        self.journal_cache
            .get(&self.local_id)
            .cloned()
            .unwrap_or_else(|| Journal::empty(self.local_id.clone()))
    }

    /// Store a new object.
    ///
    /// Assigns an identifier if the object has none and stamps both dates
    /// with the current time. The whole property set becomes one diff in the
    /// local journal. Inserting over an existing identifier overlays the
    /// properties onto the stored object.
    #[instrument(skip(self, object), fields(id = %object.identifier))]
    pub fn insert(&mut self, object: EntityObject) -> Applied {
        let identifier = if object.is_unassigned() {
            generate_entity_id()
        } else {
            object.identifier.clone()
        };
        let now = Timestamp::now();
        let properties = strip_reserved(object.properties);

        let diff = Diff::new(identifier.clone(), now, properties);
        self.apply_local(diff, now);

        let stored = self.stored_object(&identifier, now);
        let mut deltas = Deltas::new();
        deltas.insert(identifier.clone(), stored.clone());
        self.notify(ChangeSource::Local, &deltas);

        info!(id = %identifier, "inserted object");
        Applied {
            object: stored,
            deltas,
            save_plan: SavePlan::all(),
        }
    }

    /// Change some properties of an object.
    ///
    /// Keys whose value already matches are dropped. If nothing is left the
    /// call is a no-op: no diff is stored and nothing is reported. An unknown
    /// identifier is inserted instead.
    ///
    /// The diff is always appended to the local journal, but it is folded by
    /// timestamp like any merged diff. If merged history already holds a later
    /// value for a key, that value stays in the object and the key is missing
    /// from the returned deltas.
    #[instrument(skip(self, properties))]
    pub fn update(&mut self, identifier: &str, properties: Properties) -> Applied {
        if properties.keys().any(|key| is_reserved_key(key)) {
            warn!(id = %identifier, "ignoring reserved keys in update");
        }
        let properties = strip_reserved(properties);

        let Some(current) = self.state.snapshot.get(identifier) else {
            debug!(id = %identifier, "update of unknown object, inserting");
            let now = Timestamp::now();
            return self.insert(EntityObject::new(identifier, now, now, properties));
        };

        let actual_delta = current.changed_properties(&properties);
        if actual_delta.is_empty() {
            debug!(id = %identifier, "update changes nothing");
            return Applied {
                object: current.clone(),
                deltas: Deltas::new(),
                save_plan: SavePlan::default(),
            };
        }

        let now = Timestamp::now();
        let diff = Diff::new(identifier, now, actual_delta);
        let deltas = self.apply_local(diff, now);
        self.notify(ChangeSource::Local, &deltas);

        Applied {
            object: self.stored_object(identifier, now),
            deltas,
            save_plan: SavePlan::all(),
        }
    }

    pub fn fetch_object(&self, identifier: &str) -> Option<&EntityObject> {
        self.state.snapshot.get(identifier)
    }

    /// All objects, oldest creation date first.
    pub fn fetch_objects(&self) -> Vec<&EntityObject> {
        let mut objects: Vec<&EntityObject> = self.state.snapshot.values().collect();
        objects.sort_by_key(|object| object.creation_date);
        objects
    }

    /// Fold device journals into the store.
    ///
    /// Each journal is the full current log of one device. Only diffs beyond
    /// the cached length of that journal are applied.
    #[instrument(skip(self, journals), fields(journals = journals.len()))]
    pub fn merge(&mut self, journals: &[Journal]) -> MergeOutcome {
        if journals.is_empty() {
            return MergeOutcome::default();
        }

        let demuxed = demux_journals(journals, &self.journal_cache);
        // Histories grow even when no value changes.
        let histories_changed = !demuxed.patch.is_empty();
        let generated = generate_state(
            std::mem::take(&mut self.state),
            &demuxed.patch,
            Timestamp::now(),
        );

        self.journal_cache = demuxed.cache;
        self.state = generated.state;

        let save_plan = SavePlan {
            journal_cache: demuxed.cache_changed,
            state: histories_changed,
        };
        self.dirty = self.dirty.union(save_plan);

        let changed = !generated.deltas.is_empty();
        if changed {
            self.notify(ChangeSource::Merge, &generated.deltas);
            info!(entities = generated.deltas.len(), "merge changed objects");
        }

        MergeOutcome {
            changed,
            deltas: generated.deltas,
            save_plan,
        }
    }

    /// Persist dirty structures and clear their flags.
    ///
    /// A structure whose callback fails stays dirty. Returns what was saved.
    pub fn save<P: StatePersistence>(&mut self, persistence: &mut P) -> Result<SavePlan, StoreError> {
        let mut saved = SavePlan::default();
        if self.dirty.journal_cache {
            persistence.save_journal_cache(&self.journal_cache)?;
            self.dirty.journal_cache = false;
            saved.journal_cache = true;
        }
        if self.dirty.state {
            persistence.save_state(&self.state)?;
            self.dirty.state = false;
            saved.state = true;
        }
        Ok(saved)
    }

    /// Append a local diff to this device's journal and fold it into the state.
    fn apply_local(&mut self, diff: Diff, now: Timestamp) -> Deltas {
        self.journal_cache
            .entry(self.local_id.clone())
            .or_insert_with(|| Journal::empty(self.local_id.clone()))
            .diffs
            .push(diff.clone());

        let mut patch = EntityPatch::new();
        patch.insert(
            diff.identifier.clone(),
            Journal::new(diff.identifier.clone(), vec![diff]),
        );
        let generated = generate_state(std::mem::take(&mut self.state), &patch, now);
        self.state = generated.state;
        self.dirty = SavePlan::all();
        generated.deltas
    }

    fn stored_object(&self, identifier: &str, now: Timestamp) -> EntityObject {
        self.state
            .snapshot
            .get(identifier)
            .cloned()
            .unwrap_or_else(|| EntityObject::empty(identifier, now))
    }

    fn notify(&self, source: ChangeSource, deltas: &Deltas) {
        if deltas.is_empty() {
            return;
        }
        if let Some(notifier) = &self.notifier {
            notifier.notify(ChangeEvent {
                source,
                deltas: deltas.clone(),
            });
        }
    }
}
