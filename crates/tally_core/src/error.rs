//! Error types for the core module.

use thiserror::Error;

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, PricerError>;

/// Errors that can occur while loading catalogs or costing a selection.
///
/// The cost engine only ever returns [`PricerError::Configuration`]; every
/// other anomaly in a selection degrades to a zero-cost line plus a
/// [`StaleSelectionWarning`](crate::breakdown::StaleSelectionWarning).
#[derive(Error, Debug)]
pub enum PricerError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl PricerError {
    /// Whether this error means the catalog cannot cost the selection at all.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::InvalidCatalog(_))
    }
}
