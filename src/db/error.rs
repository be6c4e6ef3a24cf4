//! Data model error types.
//!
//! Uses miette for diagnostic output and thiserror for derive macros.
//! The merge engine itself never fails; these errors are raised at the
//! boundary where raw values become model types.

use miette::Diagnostic;
use thiserror::Error;

/// Errors raised while constructing model values.
#[derive(Error, Diagnostic, Debug, PartialEq, Eq)]
pub enum DbError {
    #[error("Invalid timestamp '{value}': {reason}")]
    #[diagnostic(
        code(driftdb::db::invalid_timestamp),
        help("Timestamps use the form 2017-11-04T10:00:00+0000")
    )]
    InvalidTimestamp { value: String, reason: String },

    #[error("Reserved key '{key}' is not allowed in a property map")]
    #[diagnostic(code(driftdb::db::reserved_key))]
    ReservedKey { key: String },
}

/// Result type for model operations.
pub type DbResult<T> = Result<T, DbError>;
