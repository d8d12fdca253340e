//! Error types for the store adapters.

use tally_core::PricerError;
use thiserror::Error;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by the scenario, config and draft stores.
///
/// Every error is returned to the caller as-is; nothing is retried.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No signed-in owner was supplied
    #[error("Not signed in: an owner is required for this operation")]
    Authorization,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Pricing(#[from] PricerError),
}

impl StoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(collection: &str, id: &str) -> Self {
        Self::Persistence(PersistenceError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        })
    }

    pub fn permission_denied(collection: &str, id: &str) -> Self {
        Self::Persistence(PersistenceError::PermissionDenied {
            collection: collection.to_string(),
            id: id.to_string(),
        })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Persistence(PersistenceError::NotFound { .. }))
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::Persistence(PersistenceError::PermissionDenied { .. }))
    }
}

/// Failures of the document backend.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error("Permission denied for {collection}/{id}")]
    PermissionDenied { collection: String, id: String },

    /// Backend-specific failure, e.g. a simulated outage
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Persistence(PersistenceError::Io(err))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Persistence(PersistenceError::Serialization(err))
    }
}
