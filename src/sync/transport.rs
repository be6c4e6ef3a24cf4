//! Remote file transport.
//!
//! The planner only needs three capabilities from a remote: list its files,
//! copy some of them here and copy some local files there. `FolderTransport`
//! implements them over a shared directory (a mounted network share or a
//! folder kept in sync by a third-party client).

use miette::Diagnostic;
use std::future::Future;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use super::metadata::{MetadataMap, ScanError, scan_directory};

/// Errors that can occur while talking to a remote.
#[derive(Error, Diagnostic, Debug)]
pub enum TransportError {
    #[error("IO error: {0}")]
    #[diagnostic(code(driftdb::sync::transport::io))]
    Io(#[from] std::io::Error),

    #[error("File not found: {filename}")]
    #[diagnostic(code(driftdb::sync::transport::missing_file))]
    MissingFile { filename: String },

    #[error("Remote error: {message}")]
    #[diagnostic(code(driftdb::sync::transport::remote))]
    Remote { message: String },
}

impl From<ScanError> for TransportError {
    fn from(err: ScanError) -> Self {
        match err {
            ScanError::Io { source, .. } => TransportError::Io(source),
        }
    }
}

/// A place journal files are exchanged through.
pub trait Transport {
    /// Current metadata of every remote file.
    fn fetch_remote_metadata(
        &self,
    ) -> impl Future<Output = Result<MetadataMap, TransportError>> + Send;

    /// Copy the named remote files into the local directory.
    fn pull(&self, filenames: &[String]) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Copy the named local files to the remote.
    fn push(&self, filenames: &[String]) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// Transport over a directory reachable through the filesystem.
#[derive(Debug, Clone)]
pub struct FolderTransport {
    local_dir: PathBuf,
    remote_dir: PathBuf,
    suffix: String,
}

impl FolderTransport {
    pub fn new(local_dir: PathBuf, remote_dir: PathBuf, suffix: impl Into<String>) -> Self {
        Self {
            local_dir,
            remote_dir,
            suffix: suffix.into(),
        }
    }

    /// Copy one remote file to `destination`.
    pub async fn fetch(&self, filename: &str, destination: &Path) -> Result<(), TransportError> {
        let source = self.remote_dir.join(filename);
        copy_file(&source, destination, filename).await
    }

    /// Copy one local file to the remote, keeping its name.
    pub async fn send(&self, filename: &str) -> Result<(), TransportError> {
        let source = self.local_dir.join(filename);
        copy_file(&source, &self.remote_dir.join(filename), filename).await
    }
}

async fn copy_file(source: &Path, destination: &Path, filename: &str) -> Result<(), TransportError> {
    if !tokio::fs::try_exists(source).await? {
        return Err(TransportError::MissingFile {
            filename: filename.to_string(),
        });
    }
    debug!(from = %source.display(), to = %destination.display(), "copying file");
    tokio::fs::copy(source, destination).await?;
    Ok(())
}

impl Transport for FolderTransport {
    async fn fetch_remote_metadata(&self) -> Result<MetadataMap, TransportError> {
        if !tokio::fs::try_exists(&self.remote_dir).await? {
            return Err(TransportError::Remote {
                message: format!("{} does not exist", self.remote_dir.display()),
            });
        }
        Ok(scan_directory(&self.remote_dir, &self.suffix).await?)
    }

    async fn pull(&self, filenames: &[String]) -> Result<(), TransportError> {
        for filename in filenames {
            self.fetch(filename, &self.local_dir.join(filename)).await?;
        }
        Ok(())
    }

    async fn push(&self, filenames: &[String]) -> Result<(), TransportError> {
        for filename in filenames {
            self.send(filename).await?;
        }
        Ok(())
    }
}
