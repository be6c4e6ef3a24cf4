//! Persistence seam for the store.
//!
//! The store never writes files itself. Each mutating call reports a
//! `SavePlan`; `Database::save` hands dirty structures to a `StatePersistence`.

use miette::Diagnostic;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[cfg(test)]
use mockall::automock;

use crate::db::{JournalCache, StoreState};
use crate::sync::codec::{self, CodecError};
use crate::sync::paths;

/// Errors that can occur while persisting store structures.
#[derive(Error, Diagnostic, Debug)]
pub enum StoreError {
    #[error("Failed to save {target}: {source}")]
    #[diagnostic(code(driftdb::store::save_failed))]
    SaveFailed {
        target: &'static str,
        #[source]
        source: CodecError,
    },
}

/// Which persisted structures are out of date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SavePlan {
    pub journal_cache: bool,
    pub state: bool,
}

impl SavePlan {
    pub fn all() -> Self {
        Self {
            journal_cache: true,
            state: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.journal_cache && !self.state
    }

    /// Union of two plans.
    pub fn union(self, other: SavePlan) -> SavePlan {
        SavePlan {
            journal_cache: self.journal_cache || other.journal_cache,
            state: self.state || other.state,
        }
    }
}

/// Destination for store structures. Can be mocked in tests.
#[cfg_attr(test, automock)]
pub trait StatePersistence {
    /// Persist the cache of device journals (includes the local journal).
    fn save_journal_cache(&mut self, cache: &JournalCache) -> Result<(), StoreError>;

    /// Persist snapshot and histories.
    fn save_state(&mut self, state: &StoreState) -> Result<(), StoreError>;
}

/// Writes the journal cache and state as JSON files.
#[derive(Debug, Clone)]
pub struct FilePersistence {
    journal_cache_path: PathBuf,
    state_path: PathBuf,
}

impl FilePersistence {
    pub fn new(journal_cache_path: PathBuf, state_path: PathBuf) -> Self {
        Self {
            journal_cache_path,
            state_path,
        }
    }

    /// The standard files under a data directory.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(
            paths::journal_cache_path(data_dir),
            paths::state_path(data_dir),
        )
    }

    /// Load previously saved structures; missing files yield empty values.
    pub fn load(&self) -> Result<(JournalCache, StoreState), CodecError> {
        let cache = if self.journal_cache_path.exists() {
            codec::read_journal_cache(&self.journal_cache_path)?
        } else {
            JournalCache::new()
        };
        let state = if self.state_path.exists() {
            codec::read_state(&self.state_path)?
        } else {
            StoreState::default()
        };
        Ok((cache, state))
    }
}

impl StatePersistence for FilePersistence {
    fn save_journal_cache(&mut self, cache: &JournalCache) -> Result<(), StoreError> {
        debug!(path = %self.journal_cache_path.display(), journals = cache.len(), "saving journal cache");
        codec::write_journal_cache(&self.journal_cache_path, cache).map_err(|source| {
            StoreError::SaveFailed {
                target: "journal cache",
                source,
            }
        })
    }

    fn save_state(&mut self, state: &StoreState) -> Result<(), StoreError> {
        debug!(path = %self.state_path.display(), objects = state.snapshot.len(), "saving state");
        codec::write_state(&self.state_path, state).map_err(|source| StoreError::SaveFailed {
            target: "state",
            source,
        })
    }
}
