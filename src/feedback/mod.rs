//! Expert feedback: correction grouping, accuracy tracking, review state
//!
//! Expert decisions are the ground truth for classifier accuracy. Every
//! decision is appended to a [`DecisionStore`]; accuracy is recomputed from
//! the stored records on request, never cached.

pub mod accuracy;
pub mod grouping;
pub mod ledger;
pub mod recent;
pub mod report;

pub use accuracy::{accuracy_by_target, compute_accuracy, transition_counts, DecisionFilter, GroupTransition};
pub use grouping::{classification_group, is_correction, ClassificationGroup};
pub use ledger::{LedgerUpdate, ReviewLedger};
pub use recent::{RecentCorrection, RecentCorrections};
pub use report::TriageReport;

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::LabInfo;
use crate::routing::RoutingStats;
use crate::storage::{BatchRecord, DecisionStore, RecordOutcome, StorageError, VerdictRecord};
use crate::types::{AccuracyAggregate, ClassificationVerdict, ExpertDecisionRecord, ReviewState};

/// What happened to a submitted review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewReceipt {
    pub outcome: RecordOutcome,
    /// Review state of the well after this submission
    pub state: ReviewState,
    pub is_correction: bool,
    /// Stored and counted towards accuracy, but a later decision or a newer
    /// analysis already holds for the well
    #[serde(default)]
    pub stale: bool,
}

/// Records expert reviews and answers accuracy questions.
pub struct CorrectionTracker {
    store: Arc<dyn DecisionStore>,
    ledger: RwLock<ReviewLedger>,
    recent: RwLock<RecentCorrections>,
}

fn poisoned<T>(err: std::sync::PoisonError<T>) -> StorageError {
    StorageError::Poisoned(err.to_string())
}

impl CorrectionTracker {
    /// Rebuild review state from whatever the store already holds.
    pub fn new(store: Arc<dyn DecisionStore>, recent_ttl_secs: u64) -> Result<Self, StorageError> {
        let existing = store.decisions()?;
        let verdicts = store.verdicts()?;
        let ledger = ReviewLedger::from_history(
            &existing,
            verdicts
                .iter()
                .map(|(well_id, v)| (well_id.as_str(), v.verdict.class.as_str(), v.analyzed_at)),
        );
        let recent = RecentCorrections::from_records(recent_ttl_secs, &existing);
        info!(
            backend = store.backend_name(),
            decisions = existing.len(),
            verdicts = verdicts.len(),
            wells = ledger.len(),
            "Correction tracker ready"
        );
        Ok(Self {
            store,
            ledger: RwLock::new(ledger),
            recent: RwLock::new(recent),
        })
    }

    /// Record an expert review made at `reviewed_at` (unix seconds).
    ///
    /// The caller owns the timestamp: resubmitting the same review with the
    /// same `reviewed_at` is a no-op.
    pub fn submit_review(
        &self,
        well_id: &str,
        assay_target: &str,
        original_prediction: &str,
        expert_correction: &str,
        features_used: BTreeMap<String, serde_json::Value>,
        reviewed_at: u64,
    ) -> Result<ReviewReceipt, StorageError> {
        let record = ExpertDecisionRecord::new(
            well_id,
            assay_target,
            original_prediction,
            expert_correction,
            features_used,
            reviewed_at,
        );
        self.record_decision(&record)
    }

    /// Append a decision. A repeat of the same (well, timestamp) is a no-op.
    pub fn record_decision(&self, record: &ExpertDecisionRecord) -> Result<ReviewReceipt, StorageError> {
        let is_correction = record.is_correction();
        let outcome = self.store.append_decision(record)?;

        if outcome == RecordOutcome::Duplicate {
            warn!(well_id = %record.well_id, timestamp = record.timestamp, "Duplicate expert decision ignored");
            let state = self.ledger.read().map_err(poisoned)?.state(&record.well_id);
            return Ok(ReviewReceipt {
                outcome,
                state,
                is_correction,
                stale: false,
            });
        }

        let (update, state) = {
            let mut ledger = self.ledger.write().map_err(poisoned)?;
            let update = ledger.apply(record);
            (update, ledger.state(&record.well_id))
        };
        self.recent.write().map_err(poisoned)?.record(record);

        let stale = update == LedgerUpdate::Stale;
        if stale {
            info!(
                well_id = %record.well_id,
                timestamp = record.timestamp,
                is_correction,
                "Expert decision recorded; a newer decision or analysis holds for the well"
            );
        } else {
            info!(
                well_id = %record.well_id,
                target = %record.assay_target,
                original = %record.original_prediction,
                correction = %record.expert_correction,
                is_correction,
                state = %state,
                "Expert decision recorded"
            );
        }

        Ok(ReviewReceipt {
            outcome,
            state,
            is_correction,
            stale,
        })
    }

    /// Persist a fresh verdict for a well and start a new review cycle at
    /// `analyzed_at` (unix seconds).
    pub fn open_reanalysis(
        &self,
        well_id: &str,
        verdict: &ClassificationVerdict,
        features: BTreeMap<String, serde_json::Value>,
        analyzed_at: u64,
    ) -> Result<(), StorageError> {
        let record = VerdictRecord {
            verdict: verdict.to_stored(),
            analyzed_at,
            features,
        };
        self.store.store_verdict(well_id, &record)?;
        self.ledger.write().map_err(poisoned)?.open(well_id, verdict, analyzed_at);
        Ok(())
    }

    /// Latest stored verdict for a well, with the metrics it was based on.
    pub fn stored_verdict(&self, well_id: &str) -> Result<Option<VerdictRecord>, StorageError> {
        self.store.get_verdict(well_id)
    }

    pub fn review_state(&self, well_id: &str) -> Result<ReviewState, StorageError> {
        Ok(self.ledger.read().map_err(poisoned)?.state(well_id))
    }

    /// Authoritative label for the well after applying decisions in timestamp order.
    pub fn current_label(&self, well_id: &str) -> Result<Option<String>, StorageError> {
        Ok(self
            .ledger
            .read()
            .map_err(poisoned)?
            .current_label(well_id)
            .map(str::to_string))
    }

    /// Wells whose current review cycle has no expert decision yet.
    pub fn pending_reviews(&self) -> Result<Vec<String>, StorageError> {
        Ok(self
            .ledger
            .read()
            .map_err(poisoned)?
            .pending_wells()
            .into_iter()
            .map(str::to_string)
            .collect())
    }

    /// Unexpired corrections as of `now`, for handing to the classifier.
    pub fn recent_corrections(&self, now: u64) -> Result<RecentCorrections, StorageError> {
        let mut recent = self.recent.write().map_err(poisoned)?;
        let pruned = recent.prune(now);
        if pruned > 0 {
            info!(pruned, "Expired recent corrections pruned");
        }
        Ok(recent.clone())
    }

    /// Persist the routing counts of a classified batch.
    pub fn record_batch(
        &self,
        stats: RoutingStats,
        by_target: BTreeMap<String, RoutingStats>,
        finished_at: u64,
    ) -> Result<(), StorageError> {
        self.store.append_batch(&BatchRecord {
            timestamp: finished_at,
            stats,
            by_target,
        })
    }

    /// Routed vs confident counts summed over the batches inside the filter
    /// window; `None` when no batch matches.
    ///
    /// With a target filter only that target's share of each batch counts.
    pub fn routing_totals(&self, filter: &DecisionFilter) -> Result<Option<RoutingStats>, StorageError> {
        let target = filter.assay_target.as_deref().map(str::to_ascii_uppercase);
        let totals = self
            .store
            .batches()?
            .into_iter()
            .filter(|b| filter.since.map_or(true, |since| b.timestamp >= since))
            .filter(|b| filter.until.map_or(true, |until| b.timestamp <= until))
            .filter_map(|b| match &target {
                Some(t) => b.by_target.get(t).copied(),
                None => Some(b.stats),
            })
            .reduce(RoutingStats::combine);
        Ok(totals)
    }

    /// Accuracy over the filtered window, recomputed from the store.
    pub fn accuracy(&self, filter: &DecisionFilter) -> Result<AccuracyAggregate, StorageError> {
        Ok(compute_accuracy(&self.store.decisions()?, filter))
    }

    pub fn accuracy_by_target(
        &self,
        filter: &DecisionFilter,
    ) -> Result<BTreeMap<String, AccuracyAggregate>, StorageError> {
        Ok(accuracy_by_target(&self.store.decisions()?, filter))
    }

    pub fn transition_counts(&self, filter: &DecisionFilter) -> Result<Vec<GroupTransition>, StorageError> {
        Ok(transition_counts(&self.store.decisions()?, filter))
    }

    /// Accuracy, routing and review backlog in one report.
    pub fn report(&self, lab: &LabInfo, filter: &DecisionFilter) -> Result<TriageReport, StorageError> {
        let routing = self.routing_totals(filter)?;
        let mut report = TriageReport::build(lab, &self.store.decisions()?, filter, routing);
        report.pending_reviews = self.pending_reviews()?;
        Ok(report)
    }
}
