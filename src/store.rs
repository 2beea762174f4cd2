//! The collection store.
//!
//! [`CollectionStore`] owns the handle registry: a mapping from collection
//! name to the currently open container handle. Callers first request that a
//! collection exist at a schema version via [`CollectionStore::open_or_upgrade`],
//! then issue create/save/query/query-all operations against the cached
//! handle. Every other operation requires an already-registered handle — there
//! is no implicit open.
//!
//! The registry holds at most one handle per collection name. An upgrade
//! closes the old handle before reopening at the new version, and the registry
//! entry is replaced only once the new handle is confirmed open. Handles are
//! never explicitly closed on shutdown; they live for the process lifetime.
//!
//! Operations issued while an open or upgrade is still in flight are not
//! queued — they race against the transition and may observe the old handle
//! or no handle at all. Callers that interleave opens with reads and writes
//! on the same collection are responsible for sequencing them.

use crate::engine::{StorageContainer, StorageEngine};
use crate::error::{Result, StoreError};
use crate::schema::Schema;
use crate::{CollectionName, Key, SchemaVersion};
use dashmap::DashMap;
use serde_json::Value;

struct Handle<C> {
    container: C,
    version: SchemaVersion,
    key_path: String,
}

/// An asynchronous collection store over a versioned storage engine.
pub struct CollectionStore<E: StorageEngine> {
    engine: E,
    collections: DashMap<CollectionName, Handle<E::Container>>,
}

impl<E: StorageEngine> CollectionStore<E> {
    /// Create a store over `engine` with no collections open.
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            collections: DashMap::new(),
        }
    }

    /// Whether a handle is currently registered for `name`.
    pub fn is_open(&self, name: &str) -> bool {
        self.collections.contains_key(name)
    }

    /// Ensure the collection `name` exists at `version` with `schema`.
    ///
    /// Idempotent: a second call at the same (or a lower) version completes
    /// immediately without touching existing records. A call at a higher
    /// version closes the registered handle and reopens at the new version;
    /// the object store is defined only if the container does not already
    /// carry one, so existing data survives upgrades.
    pub async fn open_or_upgrade(
        &self,
        name: &str,
        schema: &Schema,
        version: SchemaVersion,
    ) -> Result<()> {
        if let Some(handle) = self.collections.get(name) {
            if version <= handle.version {
                return Ok(());
            }
            let old = handle.container.clone();
            drop(handle);

            tracing::debug!(collection = name, version, "upgrading collection");
            old.close();
            return self.open_fresh(name, schema, version).await;
        }

        self.open_fresh(name, schema, version).await
    }

    async fn open_fresh(&self, name: &str, schema: &Schema, version: SchemaVersion) -> Result<()> {
        let container =
            self.engine
                .open(name, version)
                .await
                .map_err(|source| StoreError::StorageInit {
                    collection: name.to_string(),
                    source,
                })?;

        if !container.is_defined() {
            container
                .define(schema)
                .await
                .map_err(|source| StoreError::StorageInit {
                    collection: name.to_string(),
                    source,
                })?;
        }

        self.collections.insert(
            name.to_string(),
            Handle {
                container,
                version,
                key_path: schema.key_path().to_string(),
            },
        );
        tracing::debug!(collection = name, version, "collection open");
        Ok(())
    }

    /// Insert `value`, letting the engine assign the primary key.
    ///
    /// Returns the assigned key. Fails with
    /// [`StoreError::CollectionNotInitialized`] when no handle is registered
    /// for `name`, and with [`StoreError::Write`] when the engine rejects the
    /// insert.
    pub async fn create(&self, name: &str, value: Value) -> Result<Key> {
        let (container, _) = self.handle(name)?;
        container
            .add(value)
            .await
            .map_err(|source| StoreError::Write {
                collection: name.to_string(),
                source,
            })
    }

    /// Upsert: replace the record at `key`, or create a new one when `key`
    /// is `None`.
    ///
    /// With an explicit key, `value` is stored merged with the key field and
    /// the same key is returned. This is the entry point for callers that do
    /// not know whether the record already exists.
    pub async fn save(&self, name: &str, key: Option<Key>, value: Value) -> Result<Key> {
        let Some(key) = key else {
            return self.create(name, value).await;
        };

        let (container, key_path) = self.handle(name)?;
        let value = match value {
            Value::Object(mut map) => {
                map.insert(key_path, Value::from(key));
                Value::Object(map)
            }
            // Leave non-objects to the engine's own rejection.
            other => other,
        };

        container
            .put(value)
            .await
            .map_err(|source| StoreError::Write {
                collection: name.to_string(),
                source,
            })
    }

    /// Fetch one record by primary key.
    ///
    /// Resolves with `None` when no record exists at `key`; engine "not
    /// found" is not an error.
    pub async fn query(&self, name: &str, key: Key) -> Result<Option<Value>> {
        let (container, _) = self.handle(name)?;
        container
            .get(key)
            .await
            .map_err(|source| StoreError::Read {
                collection: name.to_string(),
                source,
            })
    }

    /// Fetch every record in the collection, in the engine's native
    /// enumeration order. Callers sort as needed.
    pub async fn query_all(&self, name: &str) -> Result<Vec<Value>> {
        let (container, _) = self.handle(name)?;
        container
            .get_all()
            .await
            .map_err(|source| StoreError::Read {
                collection: name.to_string(),
                source,
            })
    }

    /// Look up the registered handle for `name`, cloning the container so no
    /// registry lock is held across engine awaits.
    fn handle(&self, name: &str) -> Result<(E::Container, String)> {
        let handle = self
            .collections
            .get(name)
            .ok_or_else(|| StoreError::CollectionNotInitialized(name.to_string()))?;
        Ok((handle.container.clone(), handle.key_path.clone()))
    }
}
