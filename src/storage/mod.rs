//! Decision persistence
//!
//! Expert decisions, per-well verdicts and per-batch routing counts are
//! stored through the [`DecisionStore`] trait so the tracker and CLI never
//! depend on a concrete backend:
//! - `InMemoryDecisionStore`: tests and one-shot runs
//! - `SledDecisionStore`: durable store under `[storage] data_dir`
//!
//! Appending a decision is idempotent on `(well_id, timestamp)`.

mod memory;
mod sled_store;

pub use memory::InMemoryDecisionStore;
pub use sled_store::SledDecisionStore;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::routing::RoutingStats;
use crate::types::{ExpertDecisionRecord, StoredClassification};

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("lock poisoned: {0}")]
    Poisoned(String),
}

impl From<sled::Error> for StorageError {
    fn from(err: sled::Error) -> Self {
        StorageError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Result of appending an expert decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordOutcome {
    Recorded,
    /// Same (well, timestamp) already stored; nothing written
    Duplicate,
}

/// Latest verdict for a well and the review cycle it opened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerdictRecord {
    pub verdict: StoredClassification,
    /// Unix time the verdict was produced; expert decisions older than this
    /// belong to a previous cycle
    pub analyzed_at: u64,
    /// Metrics the verdict was based on, offered to the reviewer
    #[serde(default)]
    pub features: BTreeMap<String, serde_json::Value>,
}

/// Routing counts for one classified batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRecord {
    /// Unix time the batch finished
    pub timestamp: u64,
    pub stats: RoutingStats,
    /// Same counts split by upper-cased assay target
    #[serde(default)]
    pub by_target: BTreeMap<String, RoutingStats>,
}

/// Pluggable persistence backend.
///
/// Implementations must be thread-safe (Send + Sync) for shared access
/// across async tasks.
pub trait DecisionStore: Send + Sync {
    /// Append an expert decision unless one with the same (well, timestamp) exists.
    fn append_decision(&self, record: &ExpertDecisionRecord) -> Result<RecordOutcome, StorageError>;

    /// All decisions, ordered by (well_id, timestamp).
    fn decisions(&self) -> Result<Vec<ExpertDecisionRecord>, StorageError>;

    /// Persist the current verdict for a well (last write wins).
    fn store_verdict(&self, well_id: &str, record: &VerdictRecord) -> Result<(), StorageError>;

    fn get_verdict(&self, well_id: &str) -> Result<Option<VerdictRecord>, StorageError>;

    /// Latest verdict of every well, ordered by well id.
    fn verdicts(&self) -> Result<Vec<(String, VerdictRecord)>, StorageError>;

    /// Append the routing counts of a finished batch.
    fn append_batch(&self, record: &BatchRecord) -> Result<(), StorageError>;

    /// All batch records, oldest first.
    fn batches(&self) -> Result<Vec<BatchRecord>, StorageError>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}

/// Sled key for a decision: `well_id \0 timestamp_be`. Sorts by well, then time.
pub(crate) fn decision_key(well_id: &str, timestamp: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(well_id.len() + 9);
    key.extend_from_slice(well_id.as_bytes());
    key.push(0);
    key.extend_from_slice(&timestamp.to_be_bytes());
    key
}
