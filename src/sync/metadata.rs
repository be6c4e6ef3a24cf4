//! File metadata used to plan sync rounds.

use chrono::{DateTime, Utc};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use crate::db::Timestamp;

use super::codec::CodecError;

/// Size and modification time of one file.
///
/// `last_modified` has whole-second precision and is what gets persisted.
/// A freshly scanned file also carries its exact mtime in `modified_at`,
/// which is never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub filename: String,
    pub filesize: u64,
    #[serde(rename = "lastModified")]
    pub last_modified: Timestamp,
    #[serde(skip)]
    pub modified_at: Option<DateTime<Utc>>,
}

impl FileMetadata {
    pub fn new(filename: impl Into<String>, filesize: u64, last_modified: Timestamp) -> Self {
        Self {
            filename: filename.into(),
            filesize,
            last_modified,
            modified_at: None,
        }
    }

    /// Metadata of a scanned file with its exact modification time.
    pub fn scanned(filename: impl Into<String>, filesize: u64, modified: DateTime<Utc>) -> Self {
        Self {
            modified_at: Some(modified),
            ..Self::new(filename, filesize, Timestamp::from_datetime(modified))
        }
    }

    /// True if this file was modified strictly after `other`.
    ///
    /// Exact mtimes are compared when both sides have one, whole seconds
    /// otherwise.
    pub fn modified_after(&self, other: &FileMetadata) -> bool {
        match (self.modified_at, other.modified_at) {
            (Some(mine), Some(theirs)) => mine > theirs,
            _ => self.last_modified > other.last_modified,
        }
    }
}

/// Metadata keyed by filename.
pub type MetadataMap = BTreeMap<String, FileMetadata>;

/// Errors that can occur while scanning a directory.
#[derive(Error, Diagnostic, Debug)]
pub enum ScanError {
    #[error("Failed to scan {path}: {source}")]
    #[diagnostic(code(driftdb::sync::metadata::scan))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Returns true if `filename` is a file the sync planner manages.
pub fn is_managed(filename: &str, suffix: &str) -> bool {
    filename.ends_with(suffix)
}

/// Collect metadata for the managed files directly inside `dir`.
///
/// Entries keep their exact mtime; `last_modified` is truncated to whole
/// seconds, matching the persisted timestamp precision.
pub async fn scan_directory(dir: &Path, suffix: &str) -> Result<MetadataMap, ScanError> {
    let to_error = |source| ScanError::Io {
        path: dir.display().to_string(),
        source,
    };

    let mut result = MetadataMap::new();
    let mut entries = tokio::fs::read_dir(dir).await.map_err(to_error)?;
    while let Some(entry) = entries.next_entry().await.map_err(to_error)? {
        let metadata = entry.metadata().await.map_err(to_error)?;
        if !metadata.is_file() {
            continue;
        }
        let Some(filename) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if !is_managed(&filename, suffix) {
            continue;
        }
        let modified: DateTime<Utc> = metadata.modified().map_err(to_error)?.into();
        result.insert(
            filename.clone(),
            FileMetadata::scanned(filename, metadata.len(), modified),
        );
    }
    Ok(result)
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct MetadataDocument {
    files: MetadataMap,
}

/// Metadata remembered between sync rounds.
///
/// Persisted as `{"local": {"files": {..}}, "remote": {"files": {..}}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncState {
    /// This device's own managed files as of the last round.
    pub local: MetadataMap,
    /// Remote files as of the last time each was pulled.
    pub remote: MetadataMap,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SyncStateDocument {
    #[serde(default)]
    local: MetadataDocument,
    #[serde(default)]
    remote: MetadataDocument,
}

pub fn encode_metadata(metadata: &MetadataMap) -> Result<String, CodecError> {
    Ok(serde_json::to_string(&MetadataDocument {
        files: metadata.clone(),
    })?)
}

pub fn decode_metadata(text: &str) -> Result<MetadataMap, CodecError> {
    let document: MetadataDocument = serde_json::from_str(text)?;
    Ok(document.files)
}

impl SyncState {
    /// Load the sync state; a missing file yields an empty state.
    pub fn load(path: &Path) -> Result<Self, CodecError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let document: SyncStateDocument = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        Ok(Self {
            local: document.local.files,
            remote: document.remote.files,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), CodecError> {
        let document = SyncStateDocument {
            local: MetadataDocument {
                files: self.local.clone(),
            },
            remote: MetadataDocument {
                files: self.remote.clone(),
            },
        };
        std::fs::write(path, serde_json::to_string_pretty(&document)?)?;
        Ok(())
    }
}
