//! The storage engine seam.
//!
//! The collection store treats its storage substrate as opaque: a versioned,
//! transactional key-value engine that hands out container handles. These
//! traits describe exactly the surface the store needs — open at a version,
//! define a keyed object store once, and atomic add/put/get/get-all against
//! it. [`crate::memory::MemoryEngine`] is the in-process implementation.

use crate::schema::Schema;
use crate::{Key, SchemaVersion};
use serde_json::Value;
use thiserror::Error;

/// Failures reported by a storage engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// An open requested a version below the container's stored version.
    #[error("requested version {requested} is below stored version {stored}")]
    VersionTooLow {
        requested: SchemaVersion,
        stored: SchemaVersion,
    },

    /// An operation reached a container whose object store was never defined.
    #[error("object store is not defined")]
    MissingObjectStore,

    /// The record value is not a JSON object.
    #[error("record value must be an object")]
    NotAnObject,

    /// A replace-or-insert was issued without a usable key field.
    #[error("record is missing integer key field '{0}'")]
    MissingKey(String),

    /// An insert carried an explicit key that is already occupied.
    #[error("key {0} already exists")]
    KeyExists(Key),

    /// The container handle was closed (e.g. superseded by an upgrade).
    #[error("container is closed")]
    Closed,
}

/// A versioned storage engine that opens named containers.
#[allow(async_fn_in_trait)]
pub trait StorageEngine: Send + Sync {
    /// Handle type for an open container. Cloning must yield another handle
    /// to the same underlying container.
    type Container: StorageContainer + Clone;

    /// Open the container `name` at `version`, creating it when absent.
    ///
    /// Re-opening at a higher version bumps the stored version in place;
    /// requesting a lower version fails with [`EngineError::VersionTooLow`].
    /// Existing records are never touched by an open.
    async fn open(
        &self,
        name: &str,
        version: SchemaVersion,
    ) -> Result<Self::Container, EngineError>;
}

/// An open handle to a single named container.
///
/// Each method call is atomic from the engine's perspective; the store layers
/// no transactions of its own on top.
#[allow(async_fn_in_trait)]
pub trait StorageContainer: Send + Sync {
    /// The version this handle was opened at.
    fn version(&self) -> SchemaVersion;

    /// Whether the keyed object store has been defined for this container.
    fn is_defined(&self) -> bool;

    /// Define the keyed, auto-incrementing object store from `schema`.
    ///
    /// Callers must only invoke this when [`Self::is_defined`] is false;
    /// the definition records the key path and index intent, nothing more.
    async fn define(&self, schema: &Schema) -> Result<(), EngineError>;

    /// Insert `value`, assigning the primary key via auto-increment.
    ///
    /// A value that already carries an integer key field uses that key and
    /// advances the generator past it; a collision with an existing key is
    /// rejected with [`EngineError::KeyExists`]. Returns the key the record
    /// was stored under.
    async fn add(&self, value: Value) -> Result<Key, EngineError>;

    /// Replace-or-insert `value` at the key carried in its key field.
    async fn put(&self, value: Value) -> Result<Key, EngineError>;

    /// Fetch one record by primary key. Absence is `Ok(None)`, not an error.
    async fn get(&self, key: Key) -> Result<Option<Value>, EngineError>;

    /// Fetch every record in the engine's native enumeration order.
    async fn get_all(&self) -> Result<Vec<Value>, EngineError>;

    /// Close this handle. Further operations through it (or its clones) fail
    /// with [`EngineError::Closed`]; the underlying data is untouched.
    fn close(&self);
}
