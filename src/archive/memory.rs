//! In-process evidence archive for tests and dry runs

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use super::{ArchiveError, EvidenceArchive};

#[derive(Debug, Default)]
pub struct MemoryArchive {
    blobs: Mutex<BTreeMap<String, Vec<u8>>>,
    fail_with: Option<String>,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// An archive that refuses every write with `reason`
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            blobs: Mutex::default(),
            fail_with: Some(reason.into()),
        }
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.lock().get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
        self.blobs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl EvidenceArchive for MemoryArchive {
    async fn write(&self, key: &str, bytes: Vec<u8>) -> Result<(), ArchiveError> {
        if let Some(reason) = &self.fail_with {
            return Err(ArchiveError::Rejected(reason.clone()));
        }
        self.lock().insert(key.to_string(), bytes);
        Ok(())
    }
}
