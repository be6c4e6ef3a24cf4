//! Runtime configuration.

use miette::Diagnostic;
use std::env;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

use crate::db::utils::generate_entity_id;
use crate::sync::paths::{self, JOURNAL_SUFFIX};

/// Environment variable naming the remote sync directory.
pub const REMOTE_DIR_ENV: &str = "DRIFT_REMOTE_DIR";

/// Errors that can occur while resolving configuration.
#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    #[diagnostic(code(driftdb::config::io))]
    Io(#[from] std::io::Error),

    #[error("Invalid device id: {value:?}")]
    #[diagnostic(
        code(driftdb::config::invalid_device_id),
        help("Device ids become file names; use letters, digits, '-' or '_'")
    )]
    InvalidDeviceId { value: String },
}

/// Store and sync configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding journals, state and sync metadata.
    pub data_dir: PathBuf,
    /// Directory journals are exchanged through; sync needs one.
    pub remote_dir: Option<PathBuf>,
    /// Explicit device id; otherwise read from or written to `<data_dir>/device_id`.
    pub device_id: Option<String>,
    /// Suffix of the files the sync planner manages.
    pub journal_suffix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Configuration from the environment (`DRIFT_DATA_DIR`, `DRIFT_REMOTE_DIR`).
    pub fn new() -> Self {
        let remote_dir = env::var(REMOTE_DIR_ENV)
            .ok()
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from);
        Self {
            data_dir: paths::get_data_dir(),
            remote_dir,
            device_id: None,
            journal_suffix: JOURNAL_SUFFIX.to_string(),
        }
    }

    pub fn with_data_dir(mut self, data_dir: PathBuf) -> Self {
        self.data_dir = data_dir;
        self
    }

    pub fn with_remote_dir(mut self, remote_dir: PathBuf) -> Self {
        self.remote_dir = Some(remote_dir);
        self
    }

    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    /// Create the data directory layout if it is missing.
    pub fn ensure_dirs(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(paths::journals_dir(&self.data_dir))?;
        Ok(())
    }

    /// The id of this device.
    ///
    /// An explicit id wins. Otherwise the id stored in `<data_dir>/device_id`
    /// is used, generating and storing a fresh one on first use.
    pub fn resolve_device_id(&self) -> Result<String, ConfigError> {
        if let Some(id) = &self.device_id {
            return validate_device_id(id);
        }

        let path = paths::device_id_path(&self.data_dir);
        if path.exists() {
            return validate_device_id(std::fs::read_to_string(&path)?.trim());
        }

        std::fs::create_dir_all(&self.data_dir)?;
        let id = generate_entity_id();
        std::fs::write(&path, &id)?;
        info!(device = %id, "generated device id");
        Ok(id)
    }
}

/// Device ids name journal files, so they must be usable as file names.
fn validate_device_id(value: &str) -> Result<String, ConfigError> {
    let sanitized = sanitize_filename::sanitize(value);
    if value.is_empty() || sanitized != value {
        return Err(ConfigError::InvalidDeviceId {
            value: value.to_string(),
        });
    }
    Ok(sanitized)
}
