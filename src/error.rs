//! Error types for the collection store.

use crate::engine::EngineError;
use crate::CollectionName;
use thiserror::Error;

/// All possible failures surfaced by the collection store.
///
/// Every engine-level failure carries the collection name it targeted plus
/// the engine's own error as its source. The store performs no internal
/// retries; callers decide whether to reissue a failed operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// An operation targeted a collection with no registered handle.
    #[error("database not initialized: {0}")]
    CollectionNotInitialized(CollectionName),

    /// Opening or upgrading a collection failed at the engine level.
    #[error("failed to open collection '{collection}': {source}")]
    StorageInit {
        collection: CollectionName,
        #[source]
        source: EngineError,
    },

    /// An insert or replace was rejected by the engine.
    #[error("write to collection '{collection}' rejected: {source}")]
    Write {
        collection: CollectionName,
        #[source]
        source: EngineError,
    },

    /// A fetch-by-key or fetch-all failed at the engine level.
    #[error("read from collection '{collection}' failed: {source}")]
    Read {
        collection: CollectionName,
        #[source]
        source: EngineError,
    },
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
