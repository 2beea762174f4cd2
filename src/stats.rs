//! Latency statistics over persisted timing records.
//!
//! The reader side of the measurement loop: fetch everything once, sort by
//! total time, and reduce to min / max / average / nearest-rank percentiles.

use crate::engine::StorageEngine;
use crate::error::Result;
use crate::store::CollectionStore;
use crate::timing::TimingRecord;
use serde::Serialize;
use std::sync::Arc;

/// Aggregate statistics over a set of timing records.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatencySummary {
    /// Number of samples the summary is based on.
    pub count: usize,
    /// Smallest total time.
    pub min: f64,
    /// Largest total time.
    pub max: f64,
    /// Mean total time.
    pub average: f64,
    /// Median (nearest-rank p50).
    pub p50: f64,
    /// Nearest-rank p95.
    pub p95: f64,
}

/// Nearest-rank percentile over an ascending-sorted slice.
///
/// `p` is a percentage in `(0, 100]`; the rank is `ceil(p/100 * n)`, clamped
/// into the slice. Returns `None` on an empty slice.
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let rank = ((p / 100.0) * sorted.len() as f64).ceil() as usize;
    let index = rank.clamp(1, sorted.len()) - 1;
    Some(sorted[index])
}

/// Reduce timing records to a [`LatencySummary`]. `None` when empty.
pub fn summarize(samples: &[TimingRecord]) -> Option<LatencySummary> {
    if samples.is_empty() {
        return None;
    }

    let mut times: Vec<f64> = samples.iter().map(|s| s.total_time).collect();
    times.sort_by(|a, b| a.total_cmp(b));

    let sum: f64 = times.iter().sum();
    Some(LatencySummary {
        count: times.len(),
        min: times[0],
        max: times[times.len() - 1],
        average: sum / times.len() as f64,
        p50: percentile(&times, 50.0)?,
        p95: percentile(&times, 95.0)?,
    })
}

/// Reads all persisted timing records of a collection and reduces them.
pub struct LatencyReader<E: StorageEngine> {
    store: Arc<CollectionStore<E>>,
    collection: String,
}

impl<E: StorageEngine> LatencyReader<E> {
    /// Build a reader over an already-opened collection.
    pub fn new(store: Arc<CollectionStore<E>>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    /// Fetch every record and decode it as a [`TimingRecord`].
    ///
    /// Records that do not match the timing field contract are skipped with
    /// a warning rather than failing the whole read. Results are sorted by
    /// total time, ascending by default.
    pub async fn samples(&self, descending: bool) -> Result<Vec<TimingRecord>> {
        let values = self.store.query_all(&self.collection).await?;

        let mut samples = Vec::with_capacity(values.len());
        for value in values {
            match serde_json::from_value::<TimingRecord>(value) {
                Ok(sample) => samples.push(sample),
                Err(err) => {
                    tracing::warn!(
                        collection = %self.collection,
                        error = %err,
                        "skipping record that is not a timing record"
                    );
                }
            }
        }

        samples.sort_by(|a, b| a.total_time.total_cmp(&b.total_time));
        if descending {
            samples.reverse();
        }
        Ok(samples)
    }

    /// Fetch, decode and reduce in one step. `Ok(None)` on an empty
    /// collection — no data is not an error.
    pub async fn summary(&self) -> Result<Option<LatencySummary>> {
        let samples = self.samples(false).await?;
        Ok(summarize(&samples))
    }
}
