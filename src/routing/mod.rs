//! Edge-Case Router
//!
//! Decides which rule verdicts are worth a secondary classifier call. Only
//! the minority of wells the rules cannot settle confidently are routed, so
//! the expensive tier runs on a small fraction of each plate.
//!
//! Decision order (first match wins):
//! 1. `edge_case` → route
//! 2. `ml_recommended` → route
//! 3. confidence below `low_confidence_floor` → route
//! 4. INDETERMINATE / SUSPICIOUS → route
//! 5. WEAK_POSITIVE → route
//! 6. STRONG_POSITIVE / POSITIVE / NEGATIVE at or above `confident_min` → keep
//! 7. anything else → route
//!
//! Expert-feedback and unreadable-input verdicts are never routed. With
//! [`SuspiciousRouting::HumanReviewOnly`], verdicts flagged for review that do
//! not recommend a model opinion are kept for the human queue instead.

use serde::{Deserialize, Serialize};

use crate::config::{RoutingConfig, SuspiciousRouting};
use crate::types::{Classification, ClassificationVerdict, VerdictMethod};

#[derive(Debug, Clone, Default)]
pub struct EdgeCaseRouter {
    config: RoutingConfig,
}

impl EdgeCaseRouter {
    pub fn new(config: RoutingConfig) -> Self {
        Self { config }
    }

    /// Whether this verdict should go to the secondary classifier.
    pub fn needs_secondary_review(&self, verdict: &ClassificationVerdict) -> bool {
        if matches!(verdict.method, VerdictMethod::ExpertFeedback | VerdictMethod::Unreadable) {
            return false;
        }
        if self.config.suspicious == SuspiciousRouting::HumanReviewOnly
            && verdict.flag_for_review
            && !verdict.ml_recommended
        {
            return false;
        }

        if verdict.edge_case || verdict.ml_recommended {
            return true;
        }
        if verdict.confidence < self.config.low_confidence_floor {
            return true;
        }
        match verdict.classification {
            Classification::Indeterminate | Classification::Suspicious | Classification::WeakPositive => true,
            Classification::StrongPositive | Classification::Positive | Classification::Negative => {
                verdict.confidence < self.config.confident_min
            }
        }
    }

    /// Split verdicts into routed and confident index sets, preserving order.
    pub fn partition(&self, verdicts: &[ClassificationVerdict]) -> RoutingPartition {
        let (edge_cases, confident_cases): (Vec<usize>, Vec<usize>) =
            (0..verdicts.len()).partition(|&i| self.needs_secondary_review(&verdicts[i]));
        RoutingPartition {
            edge_cases,
            confident_cases,
        }
    }
}

/// Indices into the verdict slice handed to [`EdgeCaseRouter::partition`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingPartition {
    pub edge_cases: Vec<usize>,
    pub confident_cases: Vec<usize>,
}

impl RoutingPartition {
    pub fn stats(&self) -> RoutingStats {
        RoutingStats::new(self.edge_cases.len(), self.confident_cases.len())
    }
}

/// How much of a batch the secondary tier had to look at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutingStats {
    pub routed: usize,
    pub confident: usize,
    pub total: usize,
    /// routed / total, 0 for an empty batch
    pub routed_fraction: f64,
}

impl RoutingStats {
    pub fn new(routed: usize, confident: usize) -> Self {
        let total = routed + confident;
        Self {
            routed,
            confident,
            total,
            routed_fraction: if total == 0 { 0.0 } else { routed as f64 / total as f64 },
        }
    }

    /// Sum of two batches.
    pub fn combine(self, other: RoutingStats) -> Self {
        Self::new(self.routed + other.routed, self.confident + other.confident)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EdgeCaseReason;

    fn verdict(c: Classification, confidence: f64) -> ClassificationVerdict {
        ClassificationVerdict::confident(c, confidence, "")
    }

    fn suspicious() -> ClassificationVerdict {
        ClassificationVerdict {
            flag_for_review: true,
            ..verdict(Classification::Suspicious, 0.90)
        }
    }

    #[test]
    fn test_confident_verdicts_are_not_routed() {
        let router = EdgeCaseRouter::default();
        assert!(!router.needs_secondary_review(&verdict(Classification::StrongPositive, 0.95)));
        assert!(!router.needs_secondary_review(&verdict(Classification::Positive, 0.90)));
        assert!(!router.needs_secondary_review(&verdict(Classification::Negative, 0.85)));
    }

    #[test]
    fn test_rule_order() {
        let router = EdgeCaseRouter::default();
        let edge = ClassificationVerdict::edge(
            Classification::Positive,
            0.99,
            vec![EdgeCaseReason::ModerateSnr],
            "",
        );
        assert!(router.needs_secondary_review(&edge));
        assert!(router.needs_secondary_review(&verdict(Classification::Positive, 0.70)));
        assert!(router.needs_secondary_review(&verdict(Classification::Indeterminate, 0.99)));
        assert!(router.needs_secondary_review(&verdict(Classification::WeakPositive, 0.99)));
        // Between the floor and confident_min falls through to the default
        assert!(router.needs_secondary_review(&verdict(Classification::Negative, 0.80)));
    }

    #[test]
    fn test_suspicious_policy() {
        let literal = EdgeCaseRouter::default();
        assert!(literal.needs_secondary_review(&suspicious()));

        let human_only = EdgeCaseRouter::new(RoutingConfig {
            suspicious: SuspiciousRouting::HumanReviewOnly,
            ..RoutingConfig::default()
        });
        assert!(!human_only.needs_secondary_review(&suspicious()));
        // Ordinary edge cases are unaffected by the policy
        assert!(human_only.needs_secondary_review(&verdict(Classification::Indeterminate, 0.6)));
    }

    #[test]
    fn test_expert_feedback_never_routed() {
        let v = ClassificationVerdict {
            method: VerdictMethod::ExpertFeedback,
            ..verdict(Classification::Indeterminate, 1.0)
        };
        assert!(!EdgeCaseRouter::default().needs_secondary_review(&v));
    }

    #[test]
    fn test_unreadable_input_never_routed() {
        let v = ClassificationVerdict::unreadable("bad line");
        assert!(!EdgeCaseRouter::default().needs_secondary_review(&v));
    }

    #[test]
    fn test_partition_and_stats() {
        let verdicts = vec![
            verdict(Classification::StrongPositive, 0.95),
            verdict(Classification::WeakPositive, 0.50),
            verdict(Classification::Negative, 0.90),
            suspicious(),
        ];
        let partition = EdgeCaseRouter::default().partition(&verdicts);
        assert_eq!(partition.edge_cases, vec![1, 3]);
        assert_eq!(partition.confident_cases, vec![0, 2]);

        let stats = partition.stats();
        assert_eq!(stats.total, 4);
        assert!((stats.routed_fraction - 0.5).abs() < 1e-12);
        assert_eq!(RoutingStats::new(0, 0).routed_fraction, 0.0);
        assert_eq!(stats.combine(RoutingStats::new(1, 3)).total, 8);
    }
}
