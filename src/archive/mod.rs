//! Evidence archive for probe results
//!
//! Probe results are written once to a blob-style key-value store under
//! time-partitioned keys (`YYYY/MM/DD/HHMMSSZ-<check id>.json`). Writes may
//! overwrite an existing key; nothing in this crate reads the archive back.

mod blob;
mod local;
mod memory;

pub use blob::BlobArchive;
pub use local::LocalArchive;
pub use memory::MemoryArchive;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use reqwest::StatusCode;
use thiserror::Error;

use crate::config::{ConfigError, StorageBackend, StorageConfig};

/// Errors that can occur when persisting evidence
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Local filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Request to the blob endpoint failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Blob endpoint answered with a non-2xx status
    #[error("blob endpoint returned HTTP {0}")]
    Status(StatusCode),

    /// The result could not be encoded
    #[error("failed to serialize result: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The backend refused the write
    #[error("{0}")]
    Rejected(String),

    /// The archive is not configured
    #[error(transparent)]
    MissingConfiguration(#[from] ConfigError),
}

/// Write-only blob store
#[async_trait]
pub trait EvidenceArchive: Send + Sync {
    /// Stores `bytes` under `key`, replacing any previous value
    async fn write(&self, key: &str, bytes: Vec<u8>) -> Result<(), ArchiveError>;
}

/// Builds the archive key for a probe taken at `at`
pub fn blob_name(at: DateTime<Utc>, check_id: &str) -> String {
    format!("{}-{}.json", at.format("%Y/%m/%d/%H%M%SZ"), check_id)
}

/// Selects the archive backend described by `config`
///
/// A blob backend without a storage account is still returned as an archive
/// whose writes fail, so probes keep answering and report the problem.
pub fn from_config(config: &StorageConfig) -> Arc<dyn EvidenceArchive> {
    match config.backend {
        StorageBackend::Blob => match &config.account {
            Some(account) => Arc::new(BlobArchive::new(
                account,
                &config.container,
                config.blob_endpoint.as_deref(),
                config.sas_token.clone(),
            )),
            None => Arc::new(UnconfiguredArchive(ConfigError::Missing("STORAGE_ACCOUNT_NAME"))),
        },
        StorageBackend::Local => {
            let root = config.results_dir.clone().or_else(|| {
                ProjectDirs::from("", "", "breach-tracker").map(|dirs| dirs.data_dir().to_path_buf())
            });
            match root {
                Some(root) => Arc::new(LocalArchive::new(root.join(&config.container))),
                None => Arc::new(UnconfiguredArchive(ConfigError::Missing("RESULTS_DIR"))),
            }
        }
    }
}

/// Archive whose every write fails with the missing setting
#[derive(Debug)]
struct UnconfiguredArchive(ConfigError);

#[async_trait]
impl EvidenceArchive for UnconfiguredArchive {
    async fn write(&self, _key: &str, _bytes: Vec<u8>) -> Result<(), ArchiveError> {
        Err(self.0.clone().into())
    }
}
