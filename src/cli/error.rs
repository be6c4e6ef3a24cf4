use miette::Diagnostic;
use thiserror::Error;

use crate::config::ConfigError;
use crate::store::StoreError;
use crate::sync::{CodecError, SyncError};

#[derive(Error, Diagnostic, Debug)]
pub enum CliError {
    #[error("No remote directory configured")]
    #[diagnostic(
        code(driftdb::cli::no_remote),
        help("Pass --remote /path/to/shared/dir or set DRIFT_REMOTE_DIR.")
    )]
    NoRemote,

    #[error("Object not found: {id}")]
    #[diagnostic(code(driftdb::cli::not_found))]
    NotFound { id: String },

    #[error("Invalid property '{input}': expected KEY=VALUE")]
    #[diagnostic(
        code(driftdb::cli::invalid_property),
        help("Keys must be non-empty and must not start with '_'.")
    )]
    InvalidProperty { input: String },

    #[error("Failed to format output: {message}")]
    #[diagnostic(code(driftdb::cli::output))]
    Output { message: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Sync(#[from] SyncError),
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Output {
            message: e.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for CliError {
    fn from(e: serde_yaml::Error) -> Self {
        CliError::Output {
            message: e.to_string(),
        }
    }
}

pub type CliResult<T> = Result<T, CliError>;
