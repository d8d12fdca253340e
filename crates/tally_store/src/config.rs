//! Config store: the shared pricing catalog.
//!
//! One catalog document lives at `config/global`. Reading it when nothing is
//! stored yields the built-in catalog, so a fresh install behaves exactly like
//! [`PricingCatalog::default`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tally_core::PricingCatalog;
use tracing::{debug, info};

use crate::backend::DocumentBackend;
use crate::error::StoreResult;
use crate::scenario::require_owner;

/// Backend collection holding configuration.
pub const CONFIG: &str = "config";

/// Document id of the shared catalog.
pub const GLOBAL_CONFIG_ID: &str = "global";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredConfig {
    catalog: PricingCatalog,
    updated_at: DateTime<Utc>,
    updated_by: String,
}

/// Reads and writes the shared catalog through a [`DocumentBackend`].
#[derive(Debug, Clone)]
pub struct ConfigStore<B> {
    backend: B,
}

impl<B: DocumentBackend> ConfigStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// The stored catalog, or the built-in one if none has been saved.
    pub async fn get_config(&self, owner: &str) -> StoreResult<PricingCatalog> {
        require_owner(owner)?;

        match self.backend.get(CONFIG, GLOBAL_CONFIG_ID).await? {
            Some(data) => {
                let stored: StoredConfig = serde_json::from_value(data)?;
                stored.catalog.validate()?;
                debug!(updated_by = %stored.updated_by, "Loaded stored catalog");
                Ok(stored.catalog)
            }
            None => {
                debug!("No stored catalog, using built-in defaults");
                Ok(PricingCatalog::default())
            }
        }
    }

    /// Validate and store a catalog, replacing any previous one.
    pub async fn set_config(&self, owner: &str, catalog: &PricingCatalog) -> StoreResult<()> {
        let owner = require_owner(owner)?;
        catalog.validate()?;

        let stored = StoredConfig {
            catalog: catalog.clone(),
            updated_at: Utc::now(),
            updated_by: owner.to_string(),
        };
        self.backend
            .put(CONFIG, GLOBAL_CONFIG_ID, serde_json::to_value(&stored)?)
            .await?;

        info!(owner, "Saved pricing catalog");
        Ok(())
    }

    /// Drop the stored catalog so reads fall back to the built-in one.
    pub async fn reset_config(&self, owner: &str) -> StoreResult<()> {
        let owner = require_owner(owner)?;
        let removed = self.backend.delete(CONFIG, GLOBAL_CONFIG_ID).await?;
        info!(owner, removed, "Reset pricing catalog");
        Ok(())
    }
}
