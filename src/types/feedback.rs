//! Expert feedback types: ExpertDecisionRecord, ReviewState, AccuracyAggregate

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::feedback::grouping::{classification_group, is_correction, ClassificationGroup};

/// Confidence recorded for every explicit human decision.
pub const EXPERT_CONFIDENCE: f64 = 1.0;

/// One expert review action. Append-only; never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpertDecisionRecord {
    pub well_id: String,
    /// Pathogen / assay target the well was run for
    #[serde(default)]
    pub assay_target: String,
    /// Label the system produced (free text; legacy labels allowed)
    pub original_prediction: String,
    /// Label the expert assigned
    pub expert_correction: String,
    /// Always 1.0 for human input
    pub confidence: f64,
    /// Metric snapshot the expert saw
    #[serde(default)]
    pub features_used: BTreeMap<String, serde_json::Value>,
    /// Unix timestamp (seconds) of the review action
    pub timestamp: u64,
}

impl ExpertDecisionRecord {
    /// Build a record for an explicit human review. Confidence is fixed at 1.0
    /// regardless of the system's prior confidence.
    pub fn new(
        well_id: impl Into<String>,
        assay_target: impl Into<String>,
        original_prediction: impl Into<String>,
        expert_correction: impl Into<String>,
        features_used: BTreeMap<String, serde_json::Value>,
        timestamp: u64,
    ) -> Self {
        Self {
            well_id: well_id.into(),
            assay_target: assay_target.into(),
            original_prediction: original_prediction.into(),
            expert_correction: expert_correction.into(),
            confidence: EXPERT_CONFIDENCE,
            features_used,
            timestamp,
        }
    }

    /// True when the expert moved the well to a different classification group.
    /// Computed on every call; never persisted.
    pub fn is_correction(&self) -> bool {
        is_correction(&self.original_prediction, &self.expert_correction)
    }

    pub fn original_group(&self) -> ClassificationGroup {
        classification_group(&self.original_prediction)
    }

    pub fn corrected_group(&self) -> ClassificationGroup {
        classification_group(&self.expert_correction)
    }

    /// Outcome of this review event.
    pub fn review_state(&self) -> ReviewState {
        if self.is_correction() {
            ReviewState::Corrected
        } else {
            ReviewState::Confirmed
        }
    }

    /// Idempotency key: one record per (well, review timestamp).
    pub fn dedup_key(&self) -> (&str, u64) {
        (self.well_id.as_str(), self.timestamp)
    }
}

/// Review status of a well's current verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReviewState {
    /// Rule / secondary verdict only
    #[default]
    Pending,
    /// Expert agreed, or relabelled within the same group
    Confirmed,
    /// Expert supplied a label from a different group
    Corrected,
}

impl std::fmt::Display for ReviewState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReviewState::Pending => write!(f, "pending"),
            ReviewState::Confirmed => write!(f, "confirmed"),
            ReviewState::Corrected => write!(f, "corrected"),
        }
    }
}

/// Accuracy over a set of expert decisions. Derived, never cached.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccuracyAggregate {
    pub total_decisions: usize,
    pub corrections: usize,
    pub accuracy_percentage: f64,
}

impl AccuracyAggregate {
    /// Compute from counts. An empty window reports 100% (no evidence of error).
    pub fn from_counts(total_decisions: usize, corrections: usize) -> Self {
        let accuracy_percentage = if total_decisions == 0 {
            100.0
        } else {
            (total_decisions.saturating_sub(corrections)) as f64 / total_decisions as f64 * 100.0
        };
        Self {
            total_decisions,
            corrections,
            accuracy_percentage,
        }
    }
}

impl Default for AccuracyAggregate {
    fn default() -> Self {
        Self::from_counts(0, 0)
    }
}
