//! Accuracy computation over expert decisions
//!
//! Pure computation module, no storage. Every figure is recomputed from the
//! record set it is given so a report can never drift from the records it
//! describes.
//!
//! Duplicate submissions (same well, same review timestamp) are counted once
//! even if a caller hands in a record set that still contains them.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use super::grouping::ClassificationGroup;
use crate::types::{AccuracyAggregate, ExpertDecisionRecord};

/// Selects the window of records an aggregate is computed over.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionFilter {
    /// Restrict to one assay target (case-insensitive)
    pub assay_target: Option<String>,
    /// Inclusive lower bound on review timestamp (unix seconds)
    pub since: Option<u64>,
    /// Inclusive upper bound on review timestamp (unix seconds)
    pub until: Option<u64>,
}

impl DecisionFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_target(target: impl Into<String>) -> Self {
        Self {
            assay_target: Some(target.into()),
            ..Self::default()
        }
    }

    pub fn between(mut self, since: Option<u64>, until: Option<u64>) -> Self {
        self.since = since;
        self.until = until;
        self
    }

    pub fn matches(&self, record: &ExpertDecisionRecord) -> bool {
        if let Some(target) = &self.assay_target {
            if !record.assay_target.eq_ignore_ascii_case(target) {
                return false;
            }
        }
        if self.since.is_some_and(|since| record.timestamp < since) {
            return false;
        }
        if self.until.is_some_and(|until| record.timestamp > until) {
            return false;
        }
        true
    }
}

/// Records that pass the filter, first occurrence per (well, timestamp).
fn unique_matching<'a>(
    records: &'a [ExpertDecisionRecord],
    filter: &'a DecisionFilter,
) -> impl Iterator<Item = &'a ExpertDecisionRecord> + 'a {
    let mut seen: HashSet<(&'a str, u64)> = HashSet::new();
    records
        .iter()
        .filter(move |r| filter.matches(r))
        .filter(move |r| seen.insert(r.dedup_key()))
}

/// Accuracy over the filtered window.
pub fn compute_accuracy(records: &[ExpertDecisionRecord], filter: &DecisionFilter) -> AccuracyAggregate {
    let (total, corrections) = unique_matching(records, filter).fold((0usize, 0usize), |(t, c), r| {
        (t + 1, c + usize::from(r.is_correction()))
    });
    AccuracyAggregate::from_counts(total, corrections)
}

/// Accuracy per assay target within the filtered window. Records without a
/// target are reported under an empty key.
pub fn accuracy_by_target(
    records: &[ExpertDecisionRecord],
    filter: &DecisionFilter,
) -> BTreeMap<String, AccuracyAggregate> {
    let mut counts: BTreeMap<String, (usize, usize)> = BTreeMap::new();
    for r in unique_matching(records, filter) {
        let entry = counts.entry(r.assay_target.to_ascii_uppercase()).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += usize::from(r.is_correction());
    }
    counts
        .into_iter()
        .map(|(target, (total, corrections))| (target, AccuracyAggregate::from_counts(total, corrections)))
        .collect()
}

/// Count of decisions moving between two groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupTransition {
    pub from: ClassificationGroup,
    pub to: ClassificationGroup,
    pub count: usize,
    /// Whether decisions on this edge count against accuracy
    pub is_correction: bool,
}

/// Breakdown of decisions by (original group → corrected group).
///
/// Blank-label decisions are skipped; they are neither agreements nor corrections.
pub fn transition_counts(records: &[ExpertDecisionRecord], filter: &DecisionFilter) -> Vec<GroupTransition> {
    let mut counts: BTreeMap<(ClassificationGroup, ClassificationGroup), (usize, bool)> = BTreeMap::new();
    for r in unique_matching(records, filter) {
        if r.original_prediction.trim().is_empty() || r.expert_correction.trim().is_empty() {
            continue;
        }
        let entry = counts
            .entry((r.original_group(), r.corrected_group()))
            .or_insert((0, r.is_correction()));
        entry.0 += 1;
    }
    counts
        .into_iter()
        .map(|((from, to), (count, is_correction))| GroupTransition {
            from,
            to,
            count,
            is_correction,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap as Map;

    fn decision(well: &str, target: &str, original: &str, correction: &str, ts: u64) -> ExpertDecisionRecord {
        ExpertDecisionRecord::new(well, target, original, correction, Map::new(), ts)
    }

    #[test]
    fn test_empty_window_is_full_accuracy() {
        let agg = compute_accuracy(&[], &DecisionFilter::all());
        assert_eq!(agg.total_decisions, 0);
        assert_eq!(agg.accuracy_percentage, 100.0);
    }

    #[test]
    fn test_same_group_changes_keep_accuracy_at_100() {
        let records: Vec<_> = (0..25)
            .map(|i| decision(&format!("W{i}"), "FAM", "WEAK_POSITIVE", "STRONG_POSITIVE", i))
            .collect();
        let agg = compute_accuracy(&records, &DecisionFilter::all());
        assert_eq!(agg.total_decisions, 25);
        assert_eq!(agg.corrections, 0);
        assert_eq!(agg.accuracy_percentage, 100.0);
    }

    #[test]
    fn test_mixed_decisions() {
        let records = vec![
            decision("A1", "FAM", "POSITIVE", "POSITIVE", 1),
            decision("A2", "FAM", "WEAK_POSITIVE", "NEGATIVE", 2),
            decision("A3", "HEX", "NEGATIVE", "NEGATIVE", 3),
            decision("A4", "HEX", "INDETERMINATE", "REDO", 4),
        ];
        let agg = compute_accuracy(&records, &DecisionFilter::all());
        assert_eq!(agg.total_decisions, 4);
        assert_eq!(agg.corrections, 1);
        assert!((agg.accuracy_percentage - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_duplicates_counted_once() {
        let d = decision("A2", "FAM", "WEAK_POSITIVE", "NEGATIVE", 2);
        let records = vec![d.clone(), d.clone(), decision("A1", "FAM", "POSITIVE", "POSITIVE", 1), d];
        let agg = compute_accuracy(&records, &DecisionFilter::all());
        assert_eq!(agg.total_decisions, 2);
        assert_eq!(agg.corrections, 1);
    }

    #[test]
    fn test_filter_by_target_and_window() {
        let records = vec![
            decision("A1", "FAM", "POSITIVE", "NEGATIVE", 100),
            decision("A2", "fam", "POSITIVE", "POSITIVE", 200),
            decision("A3", "HEX", "POSITIVE", "NEGATIVE", 300),
        ];
        let fam = compute_accuracy(&records, &DecisionFilter::for_target("FAM"));
        assert_eq!(fam.total_decisions, 2);
        assert_eq!(fam.corrections, 1);

        let late = compute_accuracy(&records, &DecisionFilter::all().between(Some(150), Some(300)));
        assert_eq!(late.total_decisions, 2);
        assert_eq!(late.corrections, 1);

        let none = compute_accuracy(&records, &DecisionFilter::all().between(Some(400), None));
        assert_eq!(none.accuracy_percentage, 100.0);
    }

    #[test]
    fn test_accuracy_by_target() {
        let records = vec![
            decision("A1", "FAM", "POSITIVE", "NEGATIVE", 1),
            decision("A2", "fam", "POSITIVE", "POSITIVE", 2),
            decision("A3", "HEX", "NEGATIVE", "NEGATIVE", 3),
        ];
        let by_target = accuracy_by_target(&records, &DecisionFilter::all());
        assert_eq!(by_target.len(), 2);
        assert!((by_target["FAM"].accuracy_percentage - 50.0).abs() < 1e-9);
        assert_eq!(by_target["HEX"].accuracy_percentage, 100.0);
    }

    #[test]
    fn test_transition_counts() {
        let records = vec![
            decision("A1", "FAM", "WEAK_POSITIVE", "NEGATIVE", 1),
            decision("A2", "FAM", "POSITIVE", "NEGATIVE", 2),
            decision("A3", "FAM", "POSITIVE", "STRONG_POSITIVE", 3),
            decision("A4", "FAM", "", "NEGATIVE", 4),
        ];
        let transitions = transition_counts(&records, &DecisionFilter::all());
        assert_eq!(transitions.len(), 2);
        let pos_to_neg = transitions
            .iter()
            .find(|t| t.from == ClassificationGroup::Positive && t.to == ClassificationGroup::Negative)
            .unwrap();
        assert_eq!(pos_to_neg.count, 2);
        assert!(pos_to_neg.is_correction);
        let pos_to_pos = transitions
            .iter()
            .find(|t| t.from == ClassificationGroup::Positive && t.to == ClassificationGroup::Positive)
            .unwrap();
        assert_eq!(pos_to_pos.count, 1);
        assert!(!pos_to_pos.is_correction);
    }
}
