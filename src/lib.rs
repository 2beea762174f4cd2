//! # Pulse Store
//!
//! A versioned, asynchronous collection store for endpoint latency
//! measurements.
//!
//! This crate provides the local persistence layer of a latency measurement
//! loop: named collections of dynamic JSON records, opened lazily at a schema
//! version, with a uniform create/read/update/list contract over an opaque
//! transactional key-value engine.
//!
//! ## Design Principles
//!
//! - **Engine-agnostic**: the store talks to storage only through the
//!   [`StorageEngine`]/[`StorageContainer`] seam; [`MemoryEngine`] is the
//!   in-process implementation
//! - **Lazy, versioned schemas**: a collection is created on first open and
//!   upgraded in place when a higher version is requested — never destroyed
//! - **Uniform results**: every operation is an `async fn` resolving to a
//!   [`Result`](error::Result) with an explicit error taxonomy; no retries,
//!   no hidden fallbacks
//! - **Dynamic records**: records are untyped JSON objects plus an integer
//!   primary key; per-collection field contracts live on types like
//!   [`TimingRecord`]
//!
//! ## Core Concepts
//!
//! ### Collections
//!
//! A collection is a named, persistent container of keyed records. It carries
//! a schema version (monotonically non-decreasing), a primary-key field name
//! (the key path, `"id"` by default) and auto-generated integer keys. The
//! store keeps at most one open handle per collection name; an upgrade closes
//! the old handle before the registry entry is replaced.
//!
//! ### Operations
//!
//! - [`CollectionStore::open_or_upgrade`] — idempotent open / in-place upgrade
//! - [`CollectionStore::create`] — insert with auto-assigned key
//! - [`CollectionStore::save`] — upsert keyed on whether a key is supplied
//! - [`CollectionStore::query`] / [`CollectionStore::query_all`] — fetch by
//!   key or list everything
//!
//! Every operation other than `open_or_upgrade` requires an already-open
//! collection and fails with [`StoreError::CollectionNotInitialized`]
//! otherwise.
//!
//! ### Measurement collaborators
//!
//! [`LatencyRecorder`] persists one [`TimingRecord`] per timed call and never
//! fails its caller; [`LatencyReader`] lists the records back and reduces
//! them to min / max / average / percentile via [`stats`].
//!
//! ## Quick Start
//!
//! ```rust
//! use pulse_store::{CollectionStore, MemoryEngine, Schema};
//! use serde_json::json;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let store = CollectionStore::new(MemoryEngine::new());
//!
//! // 1. Ensure the collection exists at version 1
//! store.open_or_upgrade("performance", &Schema::new(), 1).await?;
//!
//! // 2. Persist a record; the engine assigns the key
//! let key = store
//!     .create("performance", json!({"url": "/api/application", "totalTime": 12.5}))
//!     .await?;
//! assert_eq!(key, 1);
//!
//! // 3. Read it back — the stored record carries the key field
//! let record = store.query("performance", key).await?.unwrap();
//! assert_eq!(record["url"], "/api/application");
//!
//! // 4. List everything; callers sort as needed
//! let all = store.query_all("performance").await?;
//! assert_eq!(all.len(), 1);
//! # Ok::<(), pulse_store::StoreError>(())
//! # }).unwrap();
//! ```
//!
//! ## Concurrency
//!
//! All operations are non-blocking `async fn`s. Operations against different
//! collections are fully independent; same-collection ordering is whatever
//! the engine's transaction scheduling provides — each engine operation is
//! atomic, but the store imposes no queue of its own. Opens and upgrades are
//! not guarded against concurrent reads and writes on the same collection;
//! callers sequence those themselves. No operation supports cancellation or
//! timeout.

pub mod engine;
pub mod error;
pub mod memory;
pub mod schema;
pub mod stats;
pub mod store;
pub mod timing;

// Re-export main types at crate root
pub use engine::{EngineError, StorageContainer, StorageEngine};
pub use error::{Result, StoreError};
pub use memory::{MemoryContainer, MemoryEngine};
pub use schema::{IndexedField, Schema, DEFAULT_KEY_PATH};
pub use stats::{percentile, summarize, LatencyReader, LatencySummary};
pub use store::CollectionStore;
pub use timing::{performance_schema, LatencyRecorder, TimingRecord, PERFORMANCE_COLLECTION};

/// Type aliases for clarity
pub type CollectionName = String;
pub type Key = u64;
pub type SchemaVersion = u32;
