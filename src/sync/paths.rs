//! Path resolution for driftdb directories.
//!
//! Provides XDG-compliant path resolution with an environment override.

use std::env;
use std::path::{Path, PathBuf};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "DRIFT_DATA_DIR";

/// Suffix of the files the sync planner manages.
pub const JOURNAL_SUFFIX: &str = ".journal";

/// Get the data directory for driftdb.
///
/// Resolution order: `DRIFT_DATA_DIR`, then `$XDG_DATA_HOME/driftdb`, then
/// `$HOME/.local/share/driftdb`. Without `HOME` the current directory is used.
pub fn get_data_dir() -> PathBuf {
    if let Ok(dir) = env::var(DATA_DIR_ENV)
        && !dir.is_empty()
    {
        return PathBuf::from(dir);
    }

    let data_home = env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            env::var("HOME")
                .map(|home| PathBuf::from(home).join(".local/share"))
                .unwrap_or_else(|_| PathBuf::from("."))
        });

    data_home.join("driftdb")
}

/// Directory holding multiplex journal files (local and pulled).
pub fn journals_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("journals")
}

pub fn journal_cache_path(data_dir: &Path) -> PathBuf {
    data_dir.join("journal_cache.json")
}

pub fn state_path(data_dir: &Path) -> PathBuf {
    data_dir.join("state.json")
}

pub fn sync_state_path(data_dir: &Path) -> PathBuf {
    data_dir.join("sync_state.json")
}

pub fn device_id_path(data_dir: &Path) -> PathBuf {
    data_dir.join("device_id")
}

/// File name of a device's multiplex journal.
pub fn journal_filename(device_id: &str, suffix: &str) -> String {
    format!("{}{}", device_id, suffix)
}
