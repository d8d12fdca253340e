//! # tally_store
//!
//! Persistence adapters for Tally.
//!
//! # Features
//!
//! - **Scenario Store**: named selection snapshots, scoped to their owner
//! - **Config Store**: the shared pricing catalog, falling back to defaults
//! - **Draft Cache**: the in-progress selection as a local JSON file
//! - **Backends**: in-memory (with failure simulation) and JSON files
//!
//! Owner and name checks run before any backend call. Backend failures are
//! returned as [`StoreError::Persistence`] and never retried.
//!
//! # Example
//!
//! ```rust,no_run
//! use tally_core::UsageSelection;
//! use tally_store::{FileBackend, ScenarioRepository, ScenarioStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = ScenarioStore::new(FileBackend::new(".tally"));
//!
//!     let scenario = store
//!         .save("ann", "Q3 rollout", &UsageSelection::new("growth"), None)
//!         .await?;
//!     println!("Saved {}", scenario.id);
//!
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod config;
pub mod draft;
pub mod error;
pub mod scenario;

pub use backend::{BackendResult, DocumentBackend, FileBackend, MemoryBackend, StoredDocument};
pub use config::{ConfigStore, CONFIG, GLOBAL_CONFIG_ID};
pub use draft::DraftCache;
pub use error::{PersistenceError, StoreError, StoreResult};
pub use scenario::{Scenario, ScenarioPatch, ScenarioRepository, ScenarioStore, SCENARIOS};
