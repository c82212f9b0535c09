//! Accuracy report for lab QA and compliance review

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::accuracy::{accuracy_by_target, compute_accuracy, transition_counts, DecisionFilter, GroupTransition};
use crate::config::LabInfo;
use crate::routing::RoutingStats;
use crate::types::{AccuracyAggregate, ExpertDecisionRecord};

/// Snapshot of classifier accuracy over a decision window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageReport {
    pub generated_at: DateTime<Utc>,
    pub lab: LabInfo,
    pub filter: DecisionFilter,
    pub global: AccuracyAggregate,
    pub by_target: BTreeMap<String, AccuracyAggregate>,
    pub transitions: Vec<GroupTransition>,
    /// Routed vs confident counts summed over the batches in the window
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing: Option<RoutingStats>,
    /// Wells re-analyzed since their last expert decision
    #[serde(default)]
    pub pending_reviews: Vec<String>,
}

impl TriageReport {
    pub fn build(
        lab: &LabInfo,
        records: &[ExpertDecisionRecord],
        filter: &DecisionFilter,
        routing: Option<RoutingStats>,
    ) -> Self {
        Self {
            generated_at: Utc::now(),
            lab: lab.clone(),
            filter: filter.clone(),
            global: compute_accuracy(records, filter),
            by_target: accuracy_by_target(records, filter),
            transitions: transition_counts(records, filter),
            routing,
            pending_reviews: Vec::new(),
        }
    }

    /// Number of decisions that crossed classification groups.
    pub fn corrections(&self) -> usize {
        self.global.corrections
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_sections_agree() {
        let records = vec![
            ExpertDecisionRecord::new("A1", "FAM", "WEAK_POSITIVE", "NEGATIVE", BTreeMap::new(), 10),
            ExpertDecisionRecord::new("A2", "HEX", "POSITIVE", "STRONG_POSITIVE", BTreeMap::new(), 20),
        ];
        let report = TriageReport::build(
            &LabInfo::default(),
            &records,
            &DecisionFilter::all(),
            Some(RoutingStats::new(2, 94)),
        );
        assert_eq!(report.global.total_decisions, 2);
        assert_eq!(report.corrections(), 1);
        let per_target_total: usize = report.by_target.values().map(|a| a.total_decisions).sum();
        assert_eq!(per_target_total, report.global.total_decisions);
        let transition_total: usize = report.transitions.iter().map(|t| t.count).sum();
        assert_eq!(transition_total, 2);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["routing"]["routed"], 2);
        assert_eq!(json["pending_reviews"], serde_json::json!([]));
        assert_eq!(json["by_target"]["HEX"]["accuracy_percentage"], 100.0);
    }
}
