use miette::Diagnostic;
use thiserror::Error;

use crate::store::StoreError;

use super::codec::CodecError;
use super::metadata::ScanError;
use super::transport::TransportError;

/// Errors that can occur during a sync round.
#[derive(Error, Diagnostic, Debug)]
pub enum SyncError {
    #[error("Failed to fetch remote metadata: {0}")]
    #[diagnostic(
        code(driftdb::sync::fetch_metadata),
        help("Check that the remote directory exists and is readable")
    )]
    FetchMetadata(#[source] TransportError),

    #[error("Pull failed: {0}")]
    #[diagnostic(code(driftdb::sync::pull))]
    Pull(#[source] TransportError),

    #[error("Push failed: {0}")]
    #[diagnostic(code(driftdb::sync::push))]
    Push(#[source] TransportError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    #[diagnostic(code(driftdb::sync::io))]
    Io(#[from] std::io::Error),
}
