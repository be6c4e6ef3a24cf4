//! Split per-device multiplex journals into per-entity diff patches.

use tracing::{debug, warn};

use crate::db::{EntityPatch, Journal, JournalCache};

/// Result of demultiplexing a batch of multiplex journals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DemuxResult {
    /// Only the diffs not seen before, grouped by entity and sorted by timestamp.
    pub patch: EntityPatch,
    /// Cache with every input journal replacing its previous entry.
    pub cache: JournalCache,
    /// True if any input journal grew or was not cached before.
    pub cache_changed: bool,
}

/// Extract the diffs each journal gained since it was cached.
///
/// New diffs are found by length only: a cached journal of length N means the
/// first N diffs of the incoming journal have been seen. This holds only while
/// device journals grow by append. A journal that was truncated or reordered
/// after caching yields wrong results; a shorter journal is logged and
/// contributes nothing.
///
/// Diffs for the same entity are sorted ascending by timestamp. Equal
/// timestamps keep arrival order.
pub fn demux_journals(journals: &[Journal], cache: &JournalCache) -> DemuxResult {
    let mut patch = EntityPatch::new();
    let mut new_cache = cache.clone();
    let mut cache_changed = false;

    for journal in journals {
        let cached_len = match cache.get(&journal.identifier) {
            Some(cached) => {
                if cached.len() > journal.len() {
                    warn!(
                        journal = %journal.identifier,
                        cached = cached.len(),
                        incoming = journal.len(),
                        "journal is shorter than its cached copy"
                    );
                }
                cache_changed |= cached.len() < journal.len();
                cached.len()
            }
            None => {
                cache_changed = true;
                0
            }
        };

        for diff in journal.diffs.iter().skip(cached_len) {
            patch
                .entry(diff.identifier.clone())
                .or_insert_with(|| Journal::empty(diff.identifier.clone()))
                .diffs
                .push(diff.clone());
        }

        new_cache.insert(journal.identifier.clone(), journal.clone());
    }

    for entity_journal in patch.values_mut() {
        entity_journal.diffs.sort_by_key(|diff| diff.timestamp);
    }

    debug!(
        journals = journals.len(),
        entities = patch.len(),
        cache_changed,
        "demuxed journals"
    );

    DemuxResult {
        patch,
        cache: new_cache,
        cache_changed,
    }
}
