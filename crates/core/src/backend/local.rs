//! In-process document store with an optional JSON write-through.
//!
//! Documents are kept in memory per collection. When opened on a directory, every write is
//! also persisted as `<dir>/<collection>/<s1>/<s2>/<id>.json` using the sharded layout from
//! `admission-uuid`, and the directory is reloaded on the next start. Writes publish a
//! change on a broadcast feed that drives live subscriptions.

use super::{
    BackendError, BackendResult, Document, DocumentData, DocumentStore, Query, Subscription,
    UpdateCallback,
};
use admission_uuid::ShardableUuid;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::RwLock;

const CHANGE_FEED_CAPACITY: usize = 256;

type Collections = HashMap<String, BTreeMap<String, DocumentData>>;

#[derive(Debug, Clone)]
struct Change {
    collection: String,
    id: String,
}

#[derive(Debug)]
struct StoreInner {
    collections: RwLock<Collections>,
    changes: broadcast::Sender<Change>,
    records_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct LocalDocumentStore {
    inner: Arc<StoreInner>,
}

impl Default for LocalDocumentStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl LocalDocumentStore {
    /// A store that keeps documents in memory only.
    pub fn in_memory() -> Self {
        Self::from_parts(Collections::new(), None)
    }

    /// Opens a store persisted under `records_dir`, loading any existing records.
    ///
    /// Persisted stores only accept canonical UUID document ids, since ids become
    /// sharded file paths.
    pub fn open(records_dir: impl Into<PathBuf>) -> BackendResult<Self> {
        let records_dir = records_dir.into();
        std::fs::create_dir_all(&records_dir).map_err(|e| {
            BackendError::Storage(format!(
                "failed to create records directory {}: {e}",
                records_dir.display()
            ))
        })?;
        let collections = load_records(&records_dir)?;
        let loaded: usize = collections.values().map(BTreeMap::len).sum();
        tracing::info!(
            records_dir = %records_dir.display(),
            documents = loaded,
            "document store opened"
        );
        Ok(Self::from_parts(collections, Some(records_dir)))
    }

    fn from_parts(collections: Collections, records_dir: Option<PathBuf>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Self {
            inner: Arc::new(StoreInner {
                collections: RwLock::new(collections),
                changes,
                records_dir,
            }),
        }
    }
}

impl StoreInner {
    async fn run_query(&self, query: &Query) -> Vec<Document> {
        let collections = self.collections.read().await;
        let Some(documents) = collections.get(query.collection_name()) else {
            return Vec::new();
        };
        documents
            .iter()
            .map(|(id, data)| Document {
                id: id.clone(),
                data: data.clone(),
            })
            .filter(|document| query.matches(document))
            .collect()
    }

    fn persist(&self, collection: &str, id: &str, data: &DocumentData) -> BackendResult<()> {
        let Some(records_dir) = &self.records_dir else {
            return Ok(());
        };
        let path = record_path(records_dir, collection, id)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                BackendError::Storage(format!("failed to create {}: {e}", parent.display()))
            })?;
        }
        let json = serde_json::to_vec_pretty(data)
            .map_err(|e| BackendError::Storage(format!("failed to serialize document: {e}")))?;
        std::fs::write(&path, json).map_err(|e| {
            BackendError::Storage(format!("failed to write {}: {e}", path.display()))
        })
    }

    fn notify(&self, collection: &str, id: &str) {
        // No receivers simply means no live subscriptions.
        let _ = self.changes.send(Change {
            collection: collection.to_string(),
            id: id.to_string(),
        });
    }
}

fn validate_collection_name(collection: &str) -> BackendResult<()> {
    let ok = !collection.is_empty()
        && collection
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if ok {
        Ok(())
    } else {
        Err(BackendError::Storage(format!(
            "invalid collection name: '{collection}'"
        )))
    }
}

fn record_path(records_dir: &Path, collection: &str, id: &str) -> BackendResult<PathBuf> {
    let uuid = ShardableUuid::parse(id).map_err(|e| BackendError::Storage(e.to_string()))?;
    Ok(uuid.sharded_file(&records_dir.join(collection), "json"))
}

fn read_dir_entries(dir: &Path) -> BackendResult<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| BackendError::Storage(format!("failed to read {}: {e}", dir.display())))?;
    let mut paths = Vec::new();
    for entry in entries {
        match entry {
            Ok(entry) => paths.push(entry.path()),
            Err(e) => tracing::warn!("failed to read entry in {}: {}", dir.display(), e),
        }
    }
    Ok(paths)
}

/// Walks `<dir>/<collection>/<s1>/<s2>/<id>.json`, skipping anything that does not fit.
fn load_records(records_dir: &Path) -> BackendResult<Collections> {
    let mut collections = Collections::new();

    for collection_dir in read_dir_entries(records_dir)? {
        let Some(collection) = collection_dir.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !collection_dir.is_dir() || validate_collection_name(collection).is_err() {
            continue;
        }
        let collection = collection.to_string();
        let documents = collections.entry(collection.clone()).or_default();

        for s1 in read_dir_entries(&collection_dir)? {
            if !s1.is_dir() {
                continue;
            }
            for s2 in read_dir_entries(&s1)? {
                if !s2.is_dir() {
                    continue;
                }
                for file in read_dir_entries(&s2)? {
                    if file.extension().and_then(|e| e.to_str()) != Some("json") {
                        continue;
                    }
                    let Some(id) = file.file_stem().and_then(|s| s.to_str()) else {
                        continue;
                    };
                    if !ShardableUuid::is_canonical(id) {
                        tracing::warn!("skipping record with non-canonical id: {}", file.display());
                        continue;
                    }
                    let bytes = match std::fs::read(&file) {
                        Ok(bytes) => bytes,
                        Err(e) => {
                            tracing::warn!("failed to read {}: {}", file.display(), e);
                            continue;
                        }
                    };
                    match serde_json::from_slice::<DocumentData>(&bytes) {
                        Ok(data) => {
                            documents.insert(id.to_string(), data);
                        }
                        Err(e) => {
                            tracing::warn!("failed to parse {}: {}", file.display(), e);
                        }
                    }
                }
            }
        }
    }

    Ok(collections)
}

#[async_trait]
impl DocumentStore for LocalDocumentStore {
    async fn create(&self, collection: &str, data: DocumentData) -> BackendResult<String> {
        validate_collection_name(collection)?;
        let id = ShardableUuid::new().to_string();
        {
            let mut collections = self.inner.collections.write().await;
            self.inner.persist(collection, &id, &data)?;
            collections
                .entry(collection.to_string())
                .or_default()
                .insert(id.clone(), data);
        }
        tracing::debug!(collection, id = %id, "document created");
        self.inner.notify(collection, &id);
        Ok(id)
    }

    async fn set(&self, collection: &str, id: &str, data: DocumentData) -> BackendResult<()> {
        validate_collection_name(collection)?;
        {
            let mut collections = self.inner.collections.write().await;
            self.inner.persist(collection, id, &data)?;
            collections
                .entry(collection.to_string())
                .or_default()
                .insert(id.to_string(), data);
        }
        self.inner.notify(collection, id);
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> BackendResult<Option<Document>> {
        let collections = self.inner.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|documents| documents.get(id))
            .map(|data| Document {
                id: id.to_string(),
                data: data.clone(),
            }))
    }

    async fn query(&self, query: &Query) -> BackendResult<Vec<Document>> {
        Ok(self.inner.run_query(query).await)
    }

    async fn update(&self, collection: &str, id: &str, patch: DocumentData) -> BackendResult<()> {
        {
            let mut collections = self.inner.collections.write().await;
            let stored = collections
                .get_mut(collection)
                .and_then(|documents| documents.get_mut(id))
                .ok_or_else(|| BackendError::NotFound {
                    collection: collection.to_string(),
                    id: id.to_string(),
                })?;
            let mut merged = stored.clone();
            for (key, value) in patch {
                merged.insert(key, value);
            }
            self.inner.persist(collection, id, &merged)?;
            *stored = merged;
        }
        tracing::debug!(collection, id, "document updated");
        self.inner.notify(collection, id);
        Ok(())
    }

    fn subscribe(&self, query: Query, on_update: UpdateCallback) -> Subscription {
        let inner = self.inner.clone();
        // Subscribe to the feed before the first read so no write can fall in between.
        let mut changes = inner.changes.subscribe();

        Subscription::spawn(on_update, move |delivery| async move {
            loop {
                let documents = inner.run_query(&query).await;
                if !delivery.deliver(documents) {
                    return;
                }
                loop {
                    match changes.recv().await {
                        Ok(change) if query.is_affected_by(&change.collection, &change.id) => {
                            break
                        }
                        Ok(_) => continue,
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::debug!(skipped, "change feed lagged, re-running query");
                            break;
                        }
                        Err(RecvError::Closed) => return,
                    }
                }
            }
        })
    }
}
