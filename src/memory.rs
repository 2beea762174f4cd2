//! In-process storage engine.
//!
//! [`MemoryEngine`] implements the engine seam over process-local state. It
//! mirrors the semantics the store is written against: versioned named
//! containers, a single keyed object store per container with an
//! auto-increment key generator, and key-ordered enumeration.

use crate::engine::{EngineError, StorageContainer, StorageEngine};
use crate::schema::{IndexedField, Schema};
use crate::{Key, SchemaVersion};
use dashmap::DashMap;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug)]
struct ObjectStore {
    key_path: String,
    /// Index intent recorded at definition time. Advisory only; the memory
    /// engine answers no index queries.
    indexes: Vec<IndexedField>,
    next_key: Key,
    records: BTreeMap<Key, Value>,
}

#[derive(Debug)]
struct DatabaseState {
    version: SchemaVersion,
    store: Option<ObjectStore>,
}

/// A storage engine keeping all containers in memory.
///
/// Cloning is cheap and clones share the same databases, so one engine can be
/// handed to several stores or tasks.
#[derive(Debug, Clone, Default)]
pub struct MemoryEngine {
    databases: Arc<DashMap<String, DatabaseState>>,
}

impl MemoryEngine {
    /// Create an engine with no containers.
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageEngine for MemoryEngine {
    type Container = MemoryContainer;

    async fn open(
        &self,
        name: &str,
        version: SchemaVersion,
    ) -> Result<Self::Container, EngineError> {
        use dashmap::mapref::entry::Entry;

        match self.databases.entry(name.to_string()) {
            Entry::Vacant(vacant) => {
                vacant.insert(DatabaseState {
                    version,
                    store: None,
                });
            }
            Entry::Occupied(mut occupied) => {
                let state = occupied.get_mut();
                if version < state.version {
                    return Err(EngineError::VersionTooLow {
                        requested: version,
                        stored: state.version,
                    });
                }
                state.version = version;
            }
        }

        Ok(MemoryContainer {
            name: name.to_string(),
            version,
            databases: Arc::clone(&self.databases),
            open: Arc::new(AtomicBool::new(true)),
        })
    }
}

/// Handle to one in-memory container.
///
/// Clones refer to the same container and share the same open/closed state.
#[derive(Debug, Clone)]
pub struct MemoryContainer {
    name: String,
    version: SchemaVersion,
    databases: Arc<DashMap<String, DatabaseState>>,
    open: Arc<AtomicBool>,
}

impl MemoryContainer {
    fn with_state<T>(
        &self,
        f: impl FnOnce(&mut DatabaseState) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        if !self.open.load(Ordering::Acquire) {
            return Err(EngineError::Closed);
        }
        let mut state = self
            .databases
            .get_mut(&self.name)
            .ok_or(EngineError::Closed)?;
        f(&mut state)
    }

    fn with_store<T>(
        &self,
        f: impl FnOnce(&mut ObjectStore) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        self.with_state(|state| {
            let store = state.store.as_mut().ok_or(EngineError::MissingObjectStore)?;
            f(store)
        })
    }
}

impl StorageContainer for MemoryContainer {
    fn version(&self) -> SchemaVersion {
        self.version
    }

    fn is_defined(&self) -> bool {
        if !self.open.load(Ordering::Acquire) {
            return false;
        }
        self.databases
            .get(&self.name)
            .map(|state| state.store.is_some())
            .unwrap_or(false)
    }

    async fn define(&self, schema: &Schema) -> Result<(), EngineError> {
        self.with_state(|state| {
            if state.store.is_none() {
                state.store = Some(ObjectStore {
                    key_path: schema.key_path().to_string(),
                    indexes: schema.fields().to_vec(),
                    next_key: 1,
                    records: BTreeMap::new(),
                });
            }
            Ok(())
        })
    }

    async fn add(&self, value: Value) -> Result<Key, EngineError> {
        self.with_store(|store| {
            let mut obj = match value {
                Value::Object(map) => map,
                _ => return Err(EngineError::NotAnObject),
            };

            let key = match obj.get(&store.key_path).and_then(Value::as_u64) {
                Some(explicit) => {
                    if store.records.contains_key(&explicit) {
                        return Err(EngineError::KeyExists(explicit));
                    }
                    // The generator never reissues a key at or below an
                    // explicitly supplied one.
                    store.next_key = store.next_key.max(explicit + 1);
                    explicit
                }
                None => {
                    let generated = store.next_key;
                    store.next_key += 1;
                    generated
                }
            };

            obj.insert(store.key_path.clone(), Value::from(key));
            store.records.insert(key, Value::Object(obj));
            Ok(key)
        })
    }

    async fn put(&self, value: Value) -> Result<Key, EngineError> {
        self.with_store(|store| {
            let obj = match value {
                Value::Object(map) => map,
                _ => return Err(EngineError::NotAnObject),
            };

            let key = obj
                .get(&store.key_path)
                .and_then(Value::as_u64)
                .ok_or_else(|| EngineError::MissingKey(store.key_path.clone()))?;

            store.next_key = store.next_key.max(key + 1);
            store.records.insert(key, Value::Object(obj));
            Ok(key)
        })
    }

    async fn get(&self, key: Key) -> Result<Option<Value>, EngineError> {
        self.with_store(|store| Ok(store.records.get(&key).cloned()))
    }

    async fn get_all(&self) -> Result<Vec<Value>, EngineError> {
        self.with_store(|store| Ok(store.records.values().cloned().collect()))
    }

    fn close(&self) {
        self.open.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Schema {
        Schema::new().with_field("url", false)
    }

    async fn defined_container(engine: &MemoryEngine, name: &str) -> MemoryContainer {
        let container = engine.open(name, 1).await.unwrap();
        container.define(&schema()).await.unwrap();
        container
    }

    #[tokio::test]
    async fn open_creates_undefined_container() {
        let engine = MemoryEngine::new();
        let container = engine.open("calls", 1).await.unwrap();

        assert_eq!(container.version(), 1);
        assert!(!container.is_defined());
        assert_eq!(
            container.add(json!({"url": "/api"})).await,
            Err(EngineError::MissingObjectStore)
        );
    }

    #[tokio::test]
    async fn add_assigns_sequential_keys() {
        let engine = MemoryEngine::new();
        let container = defined_container(&engine, "calls").await;

        assert_eq!(container.add(json!({"url": "/a"})).await.unwrap(), 1);
        assert_eq!(container.add(json!({"url": "/b"})).await.unwrap(), 2);

        let stored = container.get(1).await.unwrap().unwrap();
        assert_eq!(stored, json!({"url": "/a", "id": 1}));
    }

    #[tokio::test]
    async fn add_with_explicit_key_collision() {
        let engine = MemoryEngine::new();
        let container = defined_container(&engine, "calls").await;

        container.add(json!({"url": "/a", "id": 7})).await.unwrap();
        let result = container.add(json!({"url": "/b", "id": 7})).await;
        assert_eq!(result, Err(EngineError::KeyExists(7)));

        // The generator skipped past the explicit key.
        assert_eq!(container.add(json!({"url": "/c"})).await.unwrap(), 8);
    }

    #[tokio::test]
    async fn put_replaces_and_inserts() {
        let engine = MemoryEngine::new();
        let container = defined_container(&engine, "calls").await;

        container.add(json!({"url": "/a"})).await.unwrap();
        container
            .put(json!({"url": "/a2", "id": 1}))
            .await
            .unwrap();
        assert_eq!(
            container.get(1).await.unwrap().unwrap(),
            json!({"url": "/a2", "id": 1})
        );

        // Insert at a fresh key.
        assert_eq!(
            container.put(json!({"url": "/b", "id": 5})).await.unwrap(),
            5
        );

        // Without a key field, put has nothing to key on.
        assert_eq!(
            container.put(json!({"url": "/c"})).await,
            Err(EngineError::MissingKey("id".to_string()))
        );
    }

    #[tokio::test]
    async fn get_all_in_key_order() {
        let engine = MemoryEngine::new();
        let container = defined_container(&engine, "calls").await;

        container.add(json!({"url": "/a", "id": 3})).await.unwrap();
        container.add(json!({"url": "/b", "id": 1})).await.unwrap();

        let all = container.get_all().await.unwrap();
        let keys: Vec<_> = all.iter().map(|v| v["id"].as_u64().unwrap()).collect();
        assert_eq!(keys, vec![1, 3]);
    }

    #[tokio::test]
    async fn reopen_at_higher_version_keeps_records() {
        let engine = MemoryEngine::new();
        let container = defined_container(&engine, "calls").await;
        container.add(json!({"url": "/a"})).await.unwrap();
        container.close();

        let reopened = engine.open("calls", 2).await.unwrap();
        assert_eq!(reopened.version(), 2);
        assert!(reopened.is_defined());
        assert_eq!(reopened.get_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn open_below_stored_version_fails() {
        let engine = MemoryEngine::new();
        engine.open("calls", 3).await.unwrap();

        let result = engine.open("calls", 2).await;
        assert_eq!(
            result.err(),
            Some(EngineError::VersionTooLow {
                requested: 2,
                stored: 3,
            })
        );
    }

    #[tokio::test]
    async fn closed_handle_rejects_operations() {
        let engine = MemoryEngine::new();
        let container = defined_container(&engine, "calls").await;
        let clone = container.clone();
        container.close();

        assert_eq!(clone.get_all().await, Err(EngineError::Closed));
        assert_eq!(
            clone.add(json!({"url": "/a"})).await,
            Err(EngineError::Closed)
        );
    }

    #[tokio::test]
    async fn define_records_index_intent() {
        let engine = MemoryEngine::new();
        let container = engine.open("calls", 1).await.unwrap();
        container
            .define(&Schema::new().with_field("url", false).with_field("tag", true))
            .await
            .unwrap();

        let state = engine.databases.get("calls").unwrap();
        let store = state.store.as_ref().unwrap();
        assert_eq!(store.indexes.len(), 2);
        assert!(store.indexes[1].unique);
    }
}
