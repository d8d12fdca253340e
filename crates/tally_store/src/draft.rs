//! Local cache of the in-progress selection.

use std::path::{Path, PathBuf};

use tally_core::UsageSelection;
use tracing::{debug, warn};

use crate::error::StoreResult;

/// Caches one draft selection as a JSON file.
///
/// The cache is best effort: a draft that no longer parses is discarded on
/// load instead of failing the caller.
#[derive(Debug, Clone)]
pub struct DraftCache {
    path: PathBuf,
}

impl DraftCache {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn save(&self, selection: &UsageSelection) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(selection)?;
        tokio::fs::write(&self.path, content).await?;
        debug!("Cached draft selection at {}", self.path.display());
        Ok(())
    }

    /// The cached draft, if there is a readable one.
    pub async fn load(&self) -> StoreResult<Option<UsageSelection>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        match serde_json::from_str(&content) {
            Ok(selection) => Ok(Some(selection)),
            Err(err) => {
                warn!("Discarding unreadable draft {}: {}", self.path.display(), err);
                Ok(None)
            }
        }
    }

    pub async fn clear(&self) -> StoreResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
