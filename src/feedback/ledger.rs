//! Per-well review state
//!
//! Tracks where each well sits in its review cycle and which label is
//! currently authoritative for it. A re-analysis opens a new cycle; expert
//! decisions made before the cycle opened no longer apply to the well (they
//! still count towards historical accuracy, which is computed elsewhere).

use std::collections::HashMap;

use crate::types::{ClassificationVerdict, ExpertDecisionRecord, ReviewState};

#[derive(Debug, Clone, PartialEq, Eq)]
struct LedgerEntry {
    state: ReviewState,
    label: String,
    /// Start of the current review cycle
    opened_at: u64,
    /// Timestamp of the decision that set `state`, if any
    decided_at: Option<u64>,
}

/// Result of applying one expert decision to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerUpdate {
    /// Decision is now authoritative for the well
    Applied(ReviewState),
    /// A later decision already holds, or the decision predates the current cycle
    Stale,
}

/// Replay step for [`ReviewLedger::from_history`].
enum HistoryEvent<'a> {
    /// (well_id, label)
    Open(&'a str, &'a str),
    Decision(&'a ExpertDecisionRecord),
}

#[derive(Debug, Clone, Default)]
pub struct ReviewLedger {
    wells: HashMap<String, LedgerEntry>,
}

impl ReviewLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from stored decisions, applying them in timestamp order.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a ExpertDecisionRecord>) -> Self {
        Self::from_history(records, std::iter::empty())
    }

    /// Rebuild from stored decisions and the review cycles opened by
    /// re-analysis, given as `(well_id, label, opened_at)`.
    ///
    /// Events replay in time order. A decision stamped in the same second as
    /// a cycle opening belongs to that cycle.
    pub fn from_history<'a>(
        records: impl IntoIterator<Item = &'a ExpertDecisionRecord>,
        openings: impl IntoIterator<Item = (&'a str, &'a str, u64)>,
    ) -> Self {
        let mut events: Vec<(u64, u8, HistoryEvent<'a>)> = openings
            .into_iter()
            .map(|(well_id, label, at)| (at, 0, HistoryEvent::Open(well_id, label)))
            .chain(records.into_iter().map(|r| (r.timestamp, 1, HistoryEvent::Decision(r))))
            .collect();
        events.sort_by_key(|(at, rank, _)| (*at, *rank));

        let mut ledger = Self::new();
        for (at, _, event) in events {
            match event {
                HistoryEvent::Open(well_id, label) => ledger.open_label(well_id, label, at),
                HistoryEvent::Decision(record) => {
                    ledger.apply(record);
                }
            }
        }
        ledger
    }

    /// Start a new review cycle for a freshly produced verdict.
    pub fn open(&mut self, well_id: &str, verdict: &ClassificationVerdict, now: u64) {
        self.open_label(well_id, verdict.classification.as_str(), now);
    }

    fn open_label(&mut self, well_id: &str, label: &str, now: u64) {
        self.wells.insert(
            well_id.to_string(),
            LedgerEntry {
                state: ReviewState::Pending,
                label: label.to_string(),
                opened_at: now,
                decided_at: None,
            },
        );
    }

    /// Apply an expert decision. The latest timestamp per well is authoritative.
    pub fn apply(&mut self, record: &ExpertDecisionRecord) -> LedgerUpdate {
        let state = record.review_state();
        let label = record.expert_correction.trim();

        match self.wells.get_mut(&record.well_id) {
            Some(entry) => {
                if record.timestamp < entry.opened_at
                    || entry.decided_at.is_some_and(|t| record.timestamp < t)
                {
                    return LedgerUpdate::Stale;
                }
                entry.state = state;
                if !label.is_empty() {
                    entry.label = label.to_string();
                }
                entry.decided_at = Some(record.timestamp);
            }
            None => {
                // First sighting of the well is a decision: the cycle began with
                // the prediction the expert reviewed
                let label = if label.is_empty() {
                    record.original_prediction.trim()
                } else {
                    label
                };
                self.wells.insert(
                    record.well_id.clone(),
                    LedgerEntry {
                        state,
                        label: label.to_string(),
                        opened_at: 0,
                        decided_at: Some(record.timestamp),
                    },
                );
            }
        }
        LedgerUpdate::Applied(state)
    }

    /// Review state of the well's current cycle; `Pending` for unknown wells.
    pub fn state(&self, well_id: &str) -> ReviewState {
        self.wells.get(well_id).map_or(ReviewState::Pending, |e| e.state)
    }

    /// Authoritative label for the well: the latest expert label, or the
    /// verdict that opened the cycle when nobody has reviewed it yet.
    pub fn current_label(&self, well_id: &str) -> Option<&str> {
        self.wells.get(well_id).map(|e| e.label.as_str())
    }

    /// Wells whose current cycle has no expert decision.
    pub fn pending_wells(&self) -> Vec<&str> {
        let mut wells: Vec<&str> = self
            .wells
            .iter()
            .filter(|(_, e)| e.state == ReviewState::Pending)
            .map(|(id, _)| id.as_str())
            .collect();
        wells.sort_unstable();
        wells
    }

    pub fn len(&self) -> usize {
        self.wells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Classification;
    use std::collections::BTreeMap;

    fn decision(well: &str, original: &str, correction: &str, ts: u64) -> ExpertDecisionRecord {
        ExpertDecisionRecord::new(well, "FAM", original, correction, BTreeMap::new(), ts)
    }

    fn weak_positive() -> ClassificationVerdict {
        ClassificationVerdict::confident(Classification::WeakPositive, 0.5, "edge")
    }

    #[test]
    fn test_open_is_pending_with_verdict_label() {
        let mut ledger = ReviewLedger::new();
        ledger.open("A1", &weak_positive(), 100);
        assert_eq!(ledger.state("A1"), ReviewState::Pending);
        assert_eq!(ledger.current_label("A1"), Some("WEAK_POSITIVE"));
        assert_eq!(ledger.pending_wells(), vec!["A1"]);
    }

    #[test]
    fn test_confirm_then_correct() {
        let mut ledger = ReviewLedger::new();
        ledger.open("A1", &weak_positive(), 100);

        let update = ledger.apply(&decision("A1", "WEAK_POSITIVE", "STRONG_POSITIVE", 110));
        assert_eq!(update, LedgerUpdate::Applied(ReviewState::Confirmed));
        assert_eq!(ledger.current_label("A1"), Some("STRONG_POSITIVE"));

        let update = ledger.apply(&decision("A1", "STRONG_POSITIVE", "NEGATIVE", 120));
        assert_eq!(update, LedgerUpdate::Applied(ReviewState::Corrected));
        assert_eq!(ledger.state("A1"), ReviewState::Corrected);
        assert_eq!(ledger.current_label("A1"), Some("NEGATIVE"));
    }

    #[test]
    fn test_latest_decision_is_authoritative() {
        let mut ledger = ReviewLedger::new();
        ledger.apply(&decision("A1", "WEAK_POSITIVE", "NEGATIVE", 200));
        assert_eq!(
            ledger.apply(&decision("A1", "WEAK_POSITIVE", "POSITIVE", 150)),
            LedgerUpdate::Stale
        );
        assert_eq!(ledger.current_label("A1"), Some("NEGATIVE"));
    }

    #[test]
    fn test_reanalysis_reopens_the_well() {
        let mut ledger = ReviewLedger::new();
        ledger.apply(&decision("A1", "WEAK_POSITIVE", "NEGATIVE", 100));
        assert_eq!(ledger.state("A1"), ReviewState::Corrected);

        ledger.open("A1", &weak_positive(), 300);
        assert_eq!(ledger.state("A1"), ReviewState::Pending);
        assert_eq!(ledger.current_label("A1"), Some("WEAK_POSITIVE"));

        // A decision from the previous cycle no longer applies
        assert_eq!(
            ledger.apply(&decision("A1", "WEAK_POSITIVE", "NEGATIVE", 250)),
            LedgerUpdate::Stale
        );
        assert_eq!(ledger.state("A1"), ReviewState::Pending);
    }

    #[test]
    fn test_from_records_sorts_by_timestamp() {
        let records = vec![
            decision("A1", "WEAK_POSITIVE", "NEGATIVE", 300),
            decision("A1", "WEAK_POSITIVE", "POSITIVE", 100),
            decision("B2", "NEGATIVE", "NEGATIVE", 50),
        ];
        let ledger = ReviewLedger::from_records(&records);
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.current_label("A1"), Some("NEGATIVE"));
        assert_eq!(ledger.state("B2"), ReviewState::Confirmed);
        assert_eq!(ledger.state("unknown"), ReviewState::Pending);
        assert!(ledger.current_label("unknown").is_none());
    }

    #[test]
    fn test_history_replays_reanalysis_cycles() {
        let records = vec![
            decision("A1", "INDETERMINATE", "NEGATIVE", 100),
            decision("B2", "WEAK_POSITIVE", "POSITIVE", 100),
            decision("B2", "POSITIVE", "POSITIVE", 500),
            decision("C3", "NEGATIVE", "NEGATIVE", 400),
        ];
        let openings = vec![("A1", "POSITIVE", 300), ("B2", "WEAK_POSITIVE", 300), ("C3", "NEGATIVE", 400)];
        let ledger = ReviewLedger::from_history(&records, openings);

        // Re-analysed after the correction: back to pending with the new label
        assert_eq!(ledger.state("A1"), ReviewState::Pending);
        assert_eq!(ledger.current_label("A1"), Some("POSITIVE"));
        // Reviewed again inside the new cycle
        assert_eq!(ledger.state("B2"), ReviewState::Confirmed);
        assert_eq!(ledger.current_label("B2"), Some("POSITIVE"));
        // Same-second decision belongs to the new cycle
        assert_eq!(ledger.state("C3"), ReviewState::Confirmed);
        assert_eq!(ledger.pending_wells(), vec!["A1"]);
    }

    #[test]
    fn test_blank_correction_keeps_label() {
        let mut ledger = ReviewLedger::new();
        ledger.open("A1", &weak_positive(), 100);
        ledger.apply(&decision("A1", "WEAK_POSITIVE", "", 110));
        assert_eq!(ledger.current_label("A1"), Some("WEAK_POSITIVE"));
        assert_eq!(ledger.state("A1"), ReviewState::Confirmed);
    }
}
