//! Sync module - file-based exchange of device journals.
//!
//! Each device writes its multiplex journal to a file, the planner decides
//! which journal files to move through a `Transport`, and pulled journals are
//! merged into the local store.

pub mod codec;
mod error;
mod manager;
#[cfg(test)]
mod manager_test;
mod metadata;
pub mod paths;
mod planner;
mod transport;
#[cfg(test)]
mod transport_test;

pub use codec::{CodecError, Format};
pub use error::SyncError;
pub use manager::{SyncManager, SyncReport, SyncStatus};
pub use metadata::{
    FileMetadata, MetadataMap, ScanError, SyncState, decode_metadata, encode_metadata, is_managed,
    scan_directory,
};
pub use paths::get_data_dir;
pub use planner::{
    SyncOutcome, SyncPlan, compute_files_to_pull, compute_files_to_push, plan, run_sync,
};
pub use transport::{FolderTransport, Transport, TransportError};
