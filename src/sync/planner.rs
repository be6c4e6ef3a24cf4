//! Sync planning.
//!
//! A round compares three views of the world: this device's managed files,
//! the live remote listing and the remote listing as of the last pull of
//! each file. Files are pushed when the local copy is newer than the remote
//! one and pulled when the remote copy is newer than the one last pulled.

use std::collections::BTreeSet;
use tracing::{debug, info, instrument, warn};

use super::error::SyncError;
use super::metadata::{MetadataMap, is_managed};
use super::transport::Transport;

/// Files a round will move.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    pub pull: Vec<String>,
    pub push: Vec<String>,
}

/// Result of a successful round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    pub pulled: Vec<String>,
    pub pushed: Vec<String>,
    /// Cached remote metadata updated for the pulled files.
    pub remote_metadata: MetadataMap,
}

/// Managed local files missing from the remote or newer than its copy.
pub fn compute_files_to_push(local: &MetadataMap, remote: &MetadataMap, suffix: &str) -> Vec<String> {
    local
        .values()
        .filter(|file| is_managed(&file.filename, suffix))
        .filter(|file| {
            remote
                .get(&file.filename)
                .is_none_or(|theirs| file.modified_after(theirs))
        })
        .map(|file| file.filename.clone())
        .collect()
}

/// Managed remote files that are not local and are new or changed since
/// they were last pulled.
pub fn compute_files_to_pull(
    local: &MetadataMap,
    cached_remote: &MetadataMap,
    remote: &MetadataMap,
    suffix: &str,
) -> Vec<String> {
    remote
        .values()
        .filter(|file| is_managed(&file.filename, suffix))
        .filter(|file| !local.contains_key(&file.filename))
        .filter(|file| {
            cached_remote
                .get(&file.filename)
                .is_none_or(|cached| file.modified_after(cached))
        })
        .map(|file| file.filename.clone())
        .collect()
}

/// Compute both sets. A file never appears in both; pulling wins.
pub fn plan(
    local: &MetadataMap,
    cached_remote: &MetadataMap,
    remote: &MetadataMap,
    suffix: &str,
) -> SyncPlan {
    let pull = compute_files_to_pull(local, cached_remote, remote, suffix);
    let pulled: BTreeSet<&str> = pull.iter().map(String::as_str).collect();
    let push = compute_files_to_push(local, remote, suffix)
        .into_iter()
        .filter(|filename| {
            let overlaps = pulled.contains(filename.as_str());
            if overlaps {
                warn!(file = %filename, "file planned for both pull and push, pulling only");
            }
            !overlaps
        })
        .collect();
    SyncPlan { pull, push }
}

/// Run one sync round against `transport`.
///
/// Pull and push run concurrently. If either fails the round fails and the
/// cached remote metadata must not be updated by the caller; the next round
/// simply retries.
#[instrument(skip_all)]
pub async fn run_sync<T: Transport>(
    local: &MetadataMap,
    cached_remote: &MetadataMap,
    transport: &T,
    suffix: &str,
) -> Result<SyncOutcome, SyncError> {
    let remote = transport
        .fetch_remote_metadata()
        .await
        .map_err(SyncError::FetchMetadata)?;

    let SyncPlan { pull, push } = plan(local, cached_remote, &remote, suffix);
    debug!(pull = pull.len(), push = push.len(), "planned sync");

    let (pulled, pushed) = tokio::join!(transport.pull(&pull), transport.push(&push));
    pulled.map_err(SyncError::Pull)?;
    pushed.map_err(SyncError::Push)?;

    let mut remote_metadata = cached_remote.clone();
    for filename in &pull {
        if let Some(file) = remote.get(filename) {
            remote_metadata.insert(filename.clone(), file.clone());
        }
    }

    info!(pulled = pull.len(), pushed = push.len(), "sync round complete");
    Ok(SyncOutcome {
        pulled: pull,
        pushed: push,
        remote_metadata,
    })
}
