//! Runtime settings: environment first, command-line flags on top.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tally_core::PricingCatalog;
use tally_store::{ConfigStore, DraftCache, FileBackend, ScenarioStore, StoreError};
use tracing::debug;

use crate::commands::GlobalArgs;

const DEFAULT_DATA_DIR: &str = ".tally";
const DRAFT_FILE: &str = "draft.json";

/// Resolved CLI settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Root of the file backend and the draft cache
    pub data_dir: PathBuf,
    /// Signed-in owner for scenario and config operations
    pub user: Option<String>,
    /// Catalog file overriding the stored catalog
    pub catalog: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            user: None,
            catalog: None,
        }
    }
}

impl Settings {
    /// Load from environment variables
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| var(key).filter(|v| !v.trim().is_empty());
        let mut settings = Self::default();

        if let Some(dir) = non_empty("TALLY_DATA_DIR") {
            settings.data_dir = PathBuf::from(dir);
        }
        settings.user = non_empty("TALLY_USER");
        settings.catalog = non_empty("TALLY_CATALOG").map(PathBuf::from);

        settings
    }

    /// Apply flags given on the command line.
    pub fn with_overrides(mut self, args: &GlobalArgs) -> Self {
        if let Some(dir) = &args.data_dir {
            self.data_dir = dir.clone();
        }
        if let Some(user) = &args.user {
            self.user = Some(user.clone());
        }
        if let Some(catalog) = &args.catalog {
            self.catalog = Some(catalog.clone());
        }
        self
    }

    /// The signed-in owner, or an authorization error.
    pub fn owner(&self) -> Result<&str> {
        match self.user.as_deref().map(str::trim) {
            Some(user) if !user.is_empty() => Ok(user),
            _ => Err(anyhow::Error::new(StoreError::Authorization)
                .context("Pass --user or set TALLY_USER")),
        }
    }

    pub fn backend(&self) -> FileBackend {
        FileBackend::new(&self.data_dir)
    }

    pub fn scenarios(&self) -> ScenarioStore<FileBackend> {
        ScenarioStore::new(self.backend())
    }

    pub fn config_store(&self) -> ConfigStore<FileBackend> {
        ConfigStore::new(self.backend())
    }

    pub fn draft_cache(&self) -> DraftCache {
        DraftCache::new(self.data_dir.join(DRAFT_FILE))
    }

    /// The catalog to cost against.
    ///
    /// A catalog file wins; otherwise the stored catalog is used when a user
    /// is signed in, and the built-in catalog when not.
    pub async fn load_catalog(&self) -> Result<PricingCatalog> {
        if let Some(path) = &self.catalog {
            return load_catalog_file(path);
        }

        match self.owner() {
            Ok(owner) => self
                .config_store()
                .get_config(owner)
                .await
                .context("Failed to load the stored pricing catalog"),
            Err(_) => {
                debug!("No user signed in, using the built-in catalog");
                Ok(PricingCatalog::default())
            }
        }
    }
}

pub fn load_catalog_file(path: &Path) -> Result<PricingCatalog> {
    PricingCatalog::from_file(path)
        .with_context(|| format!("Failed to load catalog from {}", path.display()))
}
