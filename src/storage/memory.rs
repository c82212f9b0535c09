//! In-memory decision store
//!
//! Thread-safe via `RwLock`. Not durable; data is lost on restart.

use std::collections::BTreeMap;
use std::sync::RwLock;

use super::{BatchRecord, DecisionStore, RecordOutcome, StorageError, VerdictRecord};
use crate::types::ExpertDecisionRecord;

#[derive(Debug, Default)]
pub struct InMemoryDecisionStore {
    decisions: RwLock<BTreeMap<(String, u64), ExpertDecisionRecord>>,
    verdicts: RwLock<BTreeMap<String, VerdictRecord>>,
    batches: RwLock<Vec<BatchRecord>>,
}

impl InMemoryDecisionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(err: std::sync::PoisonError<T>) -> StorageError {
    StorageError::Poisoned(err.to_string())
}

impl DecisionStore for InMemoryDecisionStore {
    fn append_decision(&self, record: &ExpertDecisionRecord) -> Result<RecordOutcome, StorageError> {
        let mut store = self.decisions.write().map_err(poisoned)?;
        let key = (record.well_id.clone(), record.timestamp);
        if store.contains_key(&key) {
            return Ok(RecordOutcome::Duplicate);
        }
        store.insert(key, record.clone());
        Ok(RecordOutcome::Recorded)
    }

    fn decisions(&self) -> Result<Vec<ExpertDecisionRecord>, StorageError> {
        let store = self.decisions.read().map_err(poisoned)?;
        Ok(store.values().cloned().collect())
    }

    fn store_verdict(&self, well_id: &str, record: &VerdictRecord) -> Result<(), StorageError> {
        let mut store = self.verdicts.write().map_err(poisoned)?;
        store.insert(well_id.to_string(), record.clone());
        Ok(())
    }

    fn get_verdict(&self, well_id: &str) -> Result<Option<VerdictRecord>, StorageError> {
        let store = self.verdicts.read().map_err(poisoned)?;
        Ok(store.get(well_id).cloned())
    }

    fn verdicts(&self) -> Result<Vec<(String, VerdictRecord)>, StorageError> {
        let store = self.verdicts.read().map_err(poisoned)?;
        Ok(store.iter().map(|(id, r)| (id.clone(), r.clone())).collect())
    }

    fn append_batch(&self, record: &BatchRecord) -> Result<(), StorageError> {
        let mut store = self.batches.write().map_err(poisoned)?;
        let at = store.partition_point(|b| b.timestamp <= record.timestamp);
        store.insert(at, record.clone());
        Ok(())
    }

    fn batches(&self) -> Result<Vec<BatchRecord>, StorageError> {
        Ok(self.batches.read().map_err(poisoned)?.clone())
    }

    fn backend_name(&self) -> &'static str {
        "InMemory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::RoutingStats;
    use crate::types::{Classification, ClassificationVerdict};

    fn decision(well: &str, ts: u64) -> ExpertDecisionRecord {
        ExpertDecisionRecord::new(well, "FAM", "WEAK_POSITIVE", "NEGATIVE", BTreeMap::new(), ts)
    }

    fn verdict(class: Classification, analyzed_at: u64) -> VerdictRecord {
        VerdictRecord {
            verdict: ClassificationVerdict::confident(class, 0.9, "").to_stored(),
            analyzed_at,
            features: BTreeMap::new(),
        }
    }

    #[test]
    fn test_duplicate_is_noop() {
        let store = InMemoryDecisionStore::new();
        assert_eq!(store.append_decision(&decision("A1", 10)).unwrap(), RecordOutcome::Recorded);
        assert_eq!(store.append_decision(&decision("A1", 10)).unwrap(), RecordOutcome::Duplicate);
        assert_eq!(store.append_decision(&decision("A1", 11)).unwrap(), RecordOutcome::Recorded);
        assert_eq!(store.decisions().unwrap().len(), 2);
    }

    #[test]
    fn test_verdict_last_write_wins() {
        let store: Box<dyn DecisionStore> = Box::new(InMemoryDecisionStore::new());
        assert_eq!(store.backend_name(), "InMemory");
        store.store_verdict("A1", &verdict(Classification::WeakPositive, 10)).unwrap();
        store.store_verdict("A1", &verdict(Classification::Negative, 20)).unwrap();
        store.store_verdict("B1", &verdict(Classification::Positive, 15)).unwrap();
        assert_eq!(store.get_verdict("A1").unwrap(), Some(verdict(Classification::Negative, 20)));
        assert!(store.get_verdict("C1").unwrap().is_none());

        let ids: Vec<String> = store.verdicts().unwrap().into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["A1", "B1"]);
    }

    #[test]
    fn test_batches_kept_in_time_order() {
        let store = InMemoryDecisionStore::new();
        for ts in [30, 10, 20] {
            store
                .append_batch(&BatchRecord {
                    timestamp: ts,
                    stats: RoutingStats::new(1, 9),
                    by_target: BTreeMap::new(),
                })
                .unwrap();
        }
        let ts: Vec<u64> = store.batches().unwrap().iter().map(|b| b.timestamp).collect();
        assert_eq!(ts, vec![10, 20, 30]);
    }
}
