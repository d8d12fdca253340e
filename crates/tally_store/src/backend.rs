//! Document backends.
//!
//! A backend stores JSON documents by `(collection, id)`. It knows nothing
//! about scenarios or catalogs; the adapters in this crate own the record
//! shapes and the access rules.
//!
//! Two implementations ship with the crate:
//! - [`MemoryBackend`]: process-local maps, with failure simulation for tests
//! - [`FileBackend`]: one pretty-printed JSON file per document under
//!   `<root>/<collection>/<id>.json`

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::PersistenceError;

/// Result type alias for backend operations.
pub type BackendResult<T> = Result<T, PersistenceError>;

/// A stored document and its id.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub data: Value,
}

/// Minimal document store the adapters are written against.
///
/// Operations are independent: there are no transactions and no locking
/// across calls, so concurrent writers see last-write-wins.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    /// Store a new document and return the id the backend assigned.
    async fn insert(&self, collection: &str, data: Value) -> BackendResult<String>;

    async fn get(&self, collection: &str, id: &str) -> BackendResult<Option<Value>>;

    /// Create or replace the document at `id`.
    async fn put(&self, collection: &str, id: &str, data: Value) -> BackendResult<()>;

    /// Documents whose top-level `field` equals `value`, ordered by id.
    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> BackendResult<Vec<StoredDocument>>;

    /// Remove a document. Returns false if there was nothing to remove.
    async fn delete(&self, collection: &str, id: &str) -> BackendResult<bool>;
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn field_matches(data: &Value, field: &str, value: &Value) -> bool {
    data.get(field) == Some(value)
}

// ============================================================================
// In-memory backend
// ============================================================================

type Collections = HashMap<String, BTreeMap<String, Value>>;

/// Process-local backend.
///
/// Clones share the same storage, so a test can keep a handle while a store
/// owns another.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    collections: Arc<RwLock<Collections>>,
    /// Number of successful writes (insert, put, delete).
    writes: Arc<AtomicUsize>,
    /// Simulated failure returned by every operation while set.
    simulate_failure: Arc<RwLock<Option<String>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every operation with a backend error until cleared.
    pub fn simulate_failure(self, message: impl Into<String>) -> Self {
        *self.simulate_failure.write() = Some(message.into());
        self
    }

    pub fn clear_failure(&self) {
        *self.simulate_failure.write() = None;
    }

    /// Number of writes that reached storage.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of documents in a collection.
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .get(collection)
            .map(BTreeMap::len)
            .unwrap_or(0)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    fn check_failure(&self) -> BackendResult<()> {
        match self.simulate_failure.read().as_ref() {
            Some(message) => Err(PersistenceError::Backend(message.clone())),
            None => Ok(()),
        }
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentBackend for MemoryBackend {
    async fn insert(&self, collection: &str, data: Value) -> BackendResult<String> {
        self.check_failure()?;
        let id = new_id();
        self.collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), data);
        self.record_write();
        Ok(id)
    }

    async fn get(&self, collection: &str, id: &str) -> BackendResult<Option<Value>> {
        self.check_failure()?;
        Ok(self
            .collections
            .read()
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn put(&self, collection: &str, id: &str, data: Value) -> BackendResult<()> {
        self.check_failure()?;
        self.collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), data);
        self.record_write();
        Ok(())
    }

    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> BackendResult<Vec<StoredDocument>> {
        self.check_failure()?;
        let collections = self.collections.read();
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };
        Ok(docs
            .iter()
            .filter(|(_, data)| field_matches(data, field, value))
            .map(|(id, data)| StoredDocument {
                id: id.clone(),
                data: data.clone(),
            })
            .collect())
    }

    async fn delete(&self, collection: &str, id: &str) -> BackendResult<bool> {
        self.check_failure()?;
        let removed = self
            .collections
            .write()
            .get_mut(collection)
            .and_then(|docs| docs.remove(id))
            .is_some();
        if removed {
            self.record_write();
        }
        Ok(removed)
    }
}

// ============================================================================
// File backend
// ============================================================================

/// Backend storing each document as `<root>/<collection>/<id>.json`.
#[derive(Debug, Clone)]
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_dir(&self, collection: &str) -> BackendResult<PathBuf> {
        check_segment(collection)?;
        Ok(self.root.join(collection))
    }

    fn document_path(&self, collection: &str, id: &str) -> BackendResult<PathBuf> {
        check_segment(id)?;
        Ok(self.collection_dir(collection)?.join(format!("{}.json", id)))
    }

    async fn write_document(&self, collection: &str, id: &str, data: &Value) -> BackendResult<()> {
        let dir = self.collection_dir(collection)?;
        tokio::fs::create_dir_all(&dir).await?;
        let path = self.document_path(collection, id)?;
        let content = serde_json::to_string_pretty(data)?;
        // Write aside and rename so readers never see a partial file.
        let staging = dir.join(format!("{}.{}.tmp", id, new_id()));
        tokio::fs::write(&staging, content).await?;
        tokio::fs::rename(&staging, &path).await?;
        debug!("Wrote document {}", path.display());
        Ok(())
    }
}

/// Collection names and ids become path segments; keep them inside the root.
fn check_segment(segment: &str) -> BackendResult<()> {
    let invalid = segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains(['/', '\\'])
        || segment.contains('\0');
    if invalid {
        return Err(PersistenceError::Backend(format!(
            "invalid document path segment '{}'",
            segment
        )));
    }
    Ok(())
}

#[async_trait]
impl DocumentBackend for FileBackend {
    async fn insert(&self, collection: &str, data: Value) -> BackendResult<String> {
        let id = new_id();
        self.write_document(collection, &id, &data).await?;
        Ok(id)
    }

    async fn get(&self, collection: &str, id: &str) -> BackendResult<Option<Value>> {
        let path = self.document_path(collection, id)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn put(&self, collection: &str, id: &str, data: Value) -> BackendResult<()> {
        self.write_document(collection, id, &data).await
    }

    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> BackendResult<Vec<StoredDocument>> {
        let dir = self.collection_dir(collection)?;
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut found = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };
            let content = match tokio::fs::read_to_string(&path).await {
                Ok(content) => content,
                // Deleted after the directory was listed.
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
                Err(err) => return Err(err.into()),
            };
            let data: Value = match serde_json::from_str(&content) {
                Ok(data) => data,
                Err(err) => {
                    warn!("Skipping unreadable document {}: {}", path.display(), err);
                    continue;
                }
            };
            if field_matches(&data, field, value) {
                found.push(StoredDocument { id, data });
            }
        }

        found.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(found)
    }

    async fn delete(&self, collection: &str, id: &str) -> BackendResult<bool> {
        let path = self.document_path(collection, id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Removed document {}", path.display());
                Ok(true)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}
