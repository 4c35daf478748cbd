//! Filesystem-backed evidence archive

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use super::{ArchiveError, EvidenceArchive};

/// Writes each key as a file below a root directory
///
/// Key segments separated by `/` become subdirectories, which are created on
/// demand.
#[derive(Debug, Clone)]
pub struct LocalArchive {
    root: PathBuf,
}

impl LocalArchive {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves `key` below the root, refusing anything that would escape it
    fn path_for(&self, key: &str) -> Result<PathBuf, ArchiveError> {
        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if key.is_empty() || escapes {
            return Err(ArchiveError::Rejected(format!("invalid archive key: {key}")));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl EvidenceArchive for LocalArchive {
    async fn write(&self, key: &str, bytes: Vec<u8>) -> Result<(), ArchiveError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, bytes).await?;

        tracing::debug!(path = %path.display(), "wrote evidence file");
        Ok(())
    }
}
