//! Sync manager - one full sync round for a device.
//!
//! Coordinates the local journal file, the sync planner, the codec and the
//! store so that a round leaves every structure on disk up to date.

use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info, instrument, warn};

use crate::db::Journal;
use crate::store::{Database, FilePersistence};

use super::codec;
use super::error::SyncError;
use super::metadata::{MetadataMap, SyncState, scan_directory};
use super::paths::{self, JOURNAL_SUFFIX};
use super::planner::run_sync;
use super::transport::Transport;

/// Sync manager handles all sync operations of one device.
pub struct SyncManager<T: Transport> {
    transport: T,
    data_dir: PathBuf,
    device_id: String,
    suffix: String,
}

impl<T: Transport> SyncManager<T> {
    /// Create a sync manager for `device_id` storing its files under `data_dir`.
    pub fn new(transport: T, data_dir: PathBuf, device_id: impl Into<String>) -> Self {
        Self {
            transport,
            data_dir,
            device_id: device_id.into(),
            suffix: JOURNAL_SUFFIX.to_string(),
        }
    }

    /// Manage files with a different suffix.
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn persistence(&self) -> FilePersistence {
        FilePersistence::in_dir(&self.data_dir)
    }

    /// Load the store of this device from disk.
    pub fn open_database(&self) -> Result<Database, SyncError> {
        let (journal_cache, state) = self.persistence().load()?;
        debug!(
            journals = journal_cache.len(),
            objects = state.snapshot.len(),
            "opened database"
        );
        Ok(Database::with_state(
            self.device_id.clone(),
            journal_cache,
            state,
        ))
    }

    fn journals_dir(&self) -> PathBuf {
        paths::journals_dir(&self.data_dir)
    }

    fn local_journal_filename(&self) -> String {
        paths::journal_filename(&self.device_id, &self.suffix)
    }

    /// Write this device's journal file if its content changed.
    ///
    /// Returns true if the file was written. An empty journal is never
    /// written, so a reinstalled device can pull its old journal back.
    pub fn write_local_journal(&self, db: &Database) -> Result<bool, SyncError> {
        let journal = db.local_journal();
        if journal.is_empty() {
            return Ok(false);
        }

        let path = self.journals_dir().join(self.local_journal_filename());
        let text = codec::encode_journal(&journal)?;
        if path.exists() && std::fs::read_to_string(&path)? == text {
            return Ok(false);
        }
        std::fs::write(&path, text)?;
        debug!(path = %path.display(), diffs = journal.len(), "wrote local journal");
        Ok(true)
    }

    async fn local_metadata(&self) -> Result<MetadataMap, SyncError> {
        let own = self.local_journal_filename();
        let mut metadata = scan_directory(&self.journals_dir(), &self.suffix).await?;
        metadata.retain(|filename, _| *filename == own);
        Ok(metadata)
    }

    fn read_journals(&self, filenames: &[String]) -> Result<Vec<Journal>, SyncError> {
        let dir = self.journals_dir();
        filenames
            .iter()
            .map(|filename| codec::read_journal(&dir.join(filename)).map_err(SyncError::from))
            .collect()
    }

    /// Run one sync round.
    ///
    /// Writes the local journal, exchanges journal files through the
    /// transport, merges pulled journals into `db` and persists the store and
    /// the sync metadata. If the transport fails nothing is merged and the
    /// sync metadata is left as it was.
    #[instrument(skip(self, db), fields(device = %self.device_id))]
    pub async fn sync(&self, db: &mut Database) -> Result<SyncReport, SyncError> {
        std::fs::create_dir_all(self.journals_dir())?;
        self.write_local_journal(db)?;

        let sync_state_path = paths::sync_state_path(&self.data_dir);
        let mut sync_state = SyncState::load(&sync_state_path)?;
        let local = self.local_metadata().await?;

        let outcome = run_sync(&local, &sync_state.remote, &self.transport, &self.suffix).await?;

        let journals = self.read_journals(&outcome.pulled)?;
        for journal in &journals {
            if journal.identifier == self.device_id {
                warn!(diffs = journal.len(), "pulled this device's own journal");
            }
        }
        let merged = db.merge(&journals);
        let mut persistence = self.persistence();
        db.save(&mut persistence)?;
        // Recovered local diffs belong in the local file too.
        self.write_local_journal(db)?;

        sync_state.remote = outcome.remote_metadata;
        sync_state.local = self.local_metadata().await?;
        sync_state.save(&sync_state_path)?;

        info!(
            pulled = outcome.pulled.len(),
            pushed = outcome.pushed.len(),
            changed = merged.deltas.len(),
            "sync complete"
        );
        Ok(SyncReport {
            pulled: outcome.pulled,
            pushed: outcome.pushed,
            changed: merged.deltas.len(),
        })
    }

    /// Summarize the store and sync metadata of this device.
    pub fn status(&self, db: &Database) -> Result<SyncStatus, SyncError> {
        let sync_state = SyncState::load(&paths::sync_state_path(&self.data_dir))?;
        Ok(SyncStatus::collect(db, &sync_state))
    }
}

/// Result of one sync round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub pulled: Vec<String>,
    pub pushed: Vec<String>,
    /// Number of entities the merge changed.
    pub changed: usize,
}

/// Snapshot of a device's store and sync metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncStatus {
    pub device_id: String,
    pub objects: usize,
    /// Cached diff count per device journal.
    pub journals: BTreeMap<String, usize>,
    /// Remote files pulled at least once.
    pub known_remote_files: usize,
    pub unsaved_changes: bool,
}

impl SyncStatus {
    pub fn collect(db: &Database, sync_state: &SyncState) -> Self {
        Self {
            device_id: db.local_id().to_string(),
            objects: db.state().snapshot.len(),
            journals: db
                .journal_cache()
                .iter()
                .map(|(id, journal)| (id.clone(), journal.len()))
                .collect(),
            known_remote_files: sync_state.remote.len(),
            unsaved_changes: !db.pending_save().is_empty(),
        }
    }
}
