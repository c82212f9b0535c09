//! Sled-backed decision store
//!
//! Three named trees in one database:
//! - `expert_decisions`: key `well_id \0 timestamp_be`, value JSON `ExpertDecisionRecord`
//! - `verdicts`: key `well_id`, value JSON `VerdictRecord`
//! - `batches`: key `timestamp_be id_be`, value JSON `BatchRecord`
//!
//! Decision inserts use compare-and-swap against an absent key, so concurrent
//! duplicate submissions resolve to exactly one stored record.

use std::path::Path;

use serde::de::DeserializeOwned;
use sled::Tree;
use tracing::{info, warn};

use super::{decision_key, BatchRecord, DecisionStore, RecordOutcome, StorageError, VerdictRecord};
use crate::types::ExpertDecisionRecord;

const DECISIONS_TREE: &str = "expert_decisions";
const VERDICTS_TREE: &str = "verdicts";
const BATCHES_TREE: &str = "batches";

#[derive(Clone)]
pub struct SledDecisionStore {
    db: sled::Db,
    decisions: Tree,
    verdicts: Tree,
    batches: Tree,
}

impl SledDecisionStore {
    /// Open or create the store at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let db = sled::open(path)?;
        let decisions = db.open_tree(DECISIONS_TREE)?;
        let verdicts = db.open_tree(VERDICTS_TREE)?;
        let batches = db.open_tree(BATCHES_TREE)?;
        info!(
            path = %path.display(),
            decisions = decisions.len(),
            verdicts = verdicts.len(),
            batches = batches.len(),
            "Decision store opened"
        );
        Ok(Self {
            db,
            decisions,
            verdicts,
            batches,
        })
    }

    /// Flush pending writes to disk.
    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }

    fn decode_all<T: DeserializeOwned>(
        tree: &Tree,
        what: &str,
    ) -> Result<Vec<(sled::IVec, T)>, StorageError> {
        let mut records = Vec::new();
        for item in tree.iter() {
            let (key, value) = item?;
            match serde_json::from_slice::<T>(&value) {
                Ok(record) => records.push((key, record)),
                Err(e) => warn!("Skipping undecodable {} record: {}", what, e),
            }
        }
        Ok(records)
    }
}

impl DecisionStore for SledDecisionStore {
    fn append_decision(&self, record: &ExpertDecisionRecord) -> Result<RecordOutcome, StorageError> {
        let key = decision_key(&record.well_id, record.timestamp);
        let value = serde_json::to_vec(record)?;
        match self.decisions.compare_and_swap(key, None as Option<&[u8]>, Some(value))? {
            Ok(()) => {
                self.decisions.flush()?;
                Ok(RecordOutcome::Recorded)
            }
            Err(_) => Ok(RecordOutcome::Duplicate),
        }
    }

    fn decisions(&self) -> Result<Vec<ExpertDecisionRecord>, StorageError> {
        Ok(Self::decode_all::<ExpertDecisionRecord>(&self.decisions, "decision")?
            .into_iter()
            .map(|(_, r)| r)
            .collect())
    }

    fn store_verdict(&self, well_id: &str, record: &VerdictRecord) -> Result<(), StorageError> {
        let value = serde_json::to_vec(record)?;
        self.verdicts.insert(well_id.as_bytes(), value)?;
        Ok(())
    }

    fn get_verdict(&self, well_id: &str) -> Result<Option<VerdictRecord>, StorageError> {
        match self.verdicts.get(well_id.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn verdicts(&self) -> Result<Vec<(String, VerdictRecord)>, StorageError> {
        Ok(Self::decode_all::<VerdictRecord>(&self.verdicts, "verdict")?
            .into_iter()
            .map(|(key, r)| (String::from_utf8_lossy(&key).into_owned(), r))
            .collect())
    }

    fn append_batch(&self, record: &BatchRecord) -> Result<(), StorageError> {
        // Several batches can finish within the same second
        let mut key = record.timestamp.to_be_bytes().to_vec();
        key.extend_from_slice(&self.db.generate_id()?.to_be_bytes());
        self.batches.insert(key, serde_json::to_vec(record)?)?;
        self.batches.flush()?;
        Ok(())
    }

    fn batches(&self) -> Result<Vec<BatchRecord>, StorageError> {
        Ok(Self::decode_all::<BatchRecord>(&self.batches, "batch")?
            .into_iter()
            .map(|(_, r)| r)
            .collect())
    }

    fn backend_name(&self) -> &'static str {
        "Sled"
    }
}
