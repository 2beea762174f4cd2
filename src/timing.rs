//! Timing records and the latency recorder.
//!
//! A [`TimingRecord`] captures one round trip against a backend endpoint.
//! Its serialized field names (`startTime`, `responseStart`, `responseEnd`,
//! `totalTime`) are the documented field contract of the `performance`
//! collection — records stay dynamic JSON in the store, this type is the
//! shape callers agree on.

use crate::engine::StorageEngine;
use crate::error::Result;
use crate::schema::Schema;
use crate::store::CollectionStore;
use crate::{Key, SchemaVersion};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Default collection name for latency measurements.
pub const PERFORMANCE_COLLECTION: &str = "performance";

/// One timed round trip, in milliseconds relative to the probe's time origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingRecord {
    /// Requested URL.
    pub url: String,
    /// When the request was issued.
    pub start_time: f64,
    /// When the first response byte arrived.
    pub response_start: f64,
    /// When the last response byte arrived.
    pub response_end: f64,
    /// `response_end - start_time`.
    pub total_time: f64,
}

impl TimingRecord {
    /// Build a record from raw resource timestamps, deriving the total.
    pub fn new(
        url: impl Into<String>,
        start_time: f64,
        response_start: f64,
        response_end: f64,
    ) -> Self {
        Self {
            url: url.into(),
            start_time,
            response_start,
            response_end,
            total_time: response_end - start_time,
        }
    }
}

/// Schema for the latency measurement collection: `"id"` key path plus
/// non-unique indexes on every timing field.
pub fn performance_schema() -> Schema {
    Schema::new()
        .with_field("url", false)
        .with_field("startTime", false)
        .with_field("responseStart", false)
        .with_field("responseEnd", false)
        .with_field("totalTime", false)
}

/// Persists timing records after each timed call completes.
///
/// The recorder never retries and never fails its caller: a missing sample is
/// a warning and a rejected write is logged, in both cases the caller moves
/// on to the next round.
pub struct LatencyRecorder<E: StorageEngine> {
    store: Arc<CollectionStore<E>>,
    collection: String,
}

impl<E: StorageEngine> LatencyRecorder<E> {
    /// Open (or upgrade) the measurement collection and build a recorder
    /// over it.
    pub async fn open(
        store: Arc<CollectionStore<E>>,
        collection: impl Into<String>,
        version: SchemaVersion,
    ) -> Result<Self> {
        let collection = collection.into();
        store
            .open_or_upgrade(&collection, &performance_schema(), version)
            .await?;
        Ok(Self { store, collection })
    }

    /// The collection this recorder writes to.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Persist one timing record, returning its assigned key.
    pub async fn record(&self, sample: &TimingRecord) -> Result<Key> {
        let value = serde_json::json!(sample);
        self.store.create(&self.collection, value).await
    }

    /// Persist a sample if one was captured.
    ///
    /// Absence of timing data is a warning, not an error; a failed write is
    /// logged and swallowed. Returns the assigned key when the record made it
    /// to storage.
    pub async fn record_sample(&self, sample: Option<TimingRecord>) -> Option<Key> {
        let Some(sample) = sample else {
            tracing::warn!(collection = %self.collection, "timing data not found for call");
            return None;
        };

        match self.record(&sample).await {
            Ok(key) => Some(key),
            Err(err) => {
                tracing::error!(
                    collection = %self.collection,
                    url = %sample.url,
                    error = %err,
                    "failed to persist timing record"
                );
                None
            }
        }
    }
}
