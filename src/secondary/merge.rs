//! Rule / secondary merge policy
//!
//! The secondary opinion replaces the rule verdict only when it is strictly
//! more confident by more than the configured margin. Otherwise the rule
//! verdict stands, so the learned model never overrides a decision on a
//! coin-flip difference.

use tracing::debug;

use super::SecondaryVerdict;
use crate::types::{Classification, ClassificationVerdict, SecondaryReview, SupersededVerdict, VerdictMethod};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergePolicy {
    margin: f64,
}

impl Default for MergePolicy {
    fn default() -> Self {
        Self { margin: 0.10 }
    }
}

impl MergePolicy {
    pub fn new(margin: f64) -> Self {
        Self { margin }
    }

    /// Combine a rule verdict with a secondary opinion.
    ///
    /// Opinions with an unknown label or a confidence outside [0, 1] are
    /// never adopted, whichever backend produced them.
    pub fn merge(&self, rule: &ClassificationVerdict, secondary: &SecondaryVerdict) -> ClassificationVerdict {
        let classification = match secondary.classification.parse::<Classification>() {
            Ok(c) => c,
            Err(e) => {
                debug!("Keeping rule verdict: {}", e);
                return self.retain(rule);
            }
        };

        if !(0.0..=1.0).contains(&secondary.confidence) {
            debug!(confidence = secondary.confidence, "Secondary confidence out of range, keeping rule verdict");
            return self.retain(rule);
        }

        let clears_margin = secondary.confidence > rule.confidence + self.margin;
        if !clears_margin {
            return self.retain(rule);
        }

        let method = if secondary.method.trim().is_empty() {
            "unspecified".to_string()
        } else {
            secondary.method.clone()
        };

        ClassificationVerdict {
            classification,
            confidence: secondary.confidence,
            edge_case: false,
            edge_case_reasons: rule.edge_case_reasons.clone(),
            anomalies: rule.anomalies.clone(),
            ml_recommended: false,
            flag_for_review: rule.flag_for_review,
            reason: format!(
                "Secondary classifier ({method}) overrode {} at {:.2} with {:.2}. Rule reason: {}",
                rule.classification, rule.confidence, secondary.confidence, rule.reason
            ),
            method: VerdictMethod::Secondary(method),
            superseded: Some(SupersededVerdict {
                classification: rule.classification,
                confidence: rule.confidence,
            }),
            secondary_review: SecondaryReview::Adopted,
        }
    }

    fn retain(&self, rule: &ClassificationVerdict) -> ClassificationVerdict {
        ClassificationVerdict {
            secondary_review: SecondaryReview::Retained,
            ..rule.clone()
        }
    }
}

/// Rule verdict annotated after a failed or timed-out secondary call.
pub fn mark_unavailable(rule: &ClassificationVerdict) -> ClassificationVerdict {
    ClassificationVerdict {
        secondary_review: SecondaryReview::Unavailable,
        ..rule.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EdgeCaseReason;

    fn rule(confidence: f64) -> ClassificationVerdict {
        ClassificationVerdict::edge(
            Classification::WeakPositive,
            confidence,
            vec![EdgeCaseReason::ModerateSteepness],
            "edge",
        )
    }

    fn secondary(label: &str, confidence: f64) -> SecondaryVerdict {
        SecondaryVerdict {
            classification: label.to_string(),
            confidence,
            method: "cnn-v2".to_string(),
        }
    }

    #[test]
    fn test_small_margin_keeps_rule_verdict() {
        let v1 = rule(0.70);
        let merged = MergePolicy::default().merge(&v1, &secondary("NEGATIVE", 0.79));
        assert_eq!(merged.classification, Classification::WeakPositive);
        assert_eq!(merged.confidence, 0.70);
        assert_eq!(merged.secondary_review, SecondaryReview::Retained);
        assert_eq!(merged.method, VerdictMethod::Rules);
        assert!(merged.superseded.is_none());
    }

    #[test]
    fn test_clear_margin_adopts_secondary() {
        let v1 = rule(0.70);
        let merged = MergePolicy::default().merge(&v1, &secondary("negative", 0.81));
        assert_eq!(merged.classification, Classification::Negative);
        assert_eq!(merged.confidence, 0.81);
        assert_eq!(merged.secondary_review, SecondaryReview::Adopted);
        assert_eq!(merged.method, VerdictMethod::Secondary("cnn-v2".to_string()));
        assert_eq!(
            merged.superseded,
            Some(SupersededVerdict {
                classification: Classification::WeakPositive,
                confidence: 0.70,
            })
        );
        assert!(merged.reason.contains("WEAK_POSITIVE"));
    }

    #[test]
    fn test_exact_margin_is_not_enough() {
        let merged = MergePolicy::new(0.25).merge(&rule(0.5), &secondary("POSITIVE", 0.75));
        assert_eq!(merged.secondary_review, SecondaryReview::Retained);
    }

    #[test]
    fn test_unknown_label_never_adopted() {
        let merged = MergePolicy::default().merge(&rule(0.5), &secondary("DETECTED", 0.99));
        assert_eq!(merged.classification, Classification::WeakPositive);
        assert_eq!(merged.secondary_review, SecondaryReview::Retained);
    }

    #[test]
    fn test_out_of_range_confidence_never_adopted() {
        for confidence in [7.5, 42.0, -0.2, f64::NAN, f64::INFINITY] {
            let merged = MergePolicy::default().merge(&rule(0.5), &secondary("NEGATIVE", confidence));
            assert_eq!(merged.classification, Classification::WeakPositive, "confidence {confidence}");
            assert_eq!(merged.confidence, 0.5);
            assert_eq!(merged.secondary_review, SecondaryReview::Retained);
        }
    }

    #[test]
    fn test_full_confidence_is_adoptable() {
        let merged = MergePolicy::default().merge(&rule(0.5), &secondary("NEGATIVE", 1.0));
        assert_eq!(merged.secondary_review, SecondaryReview::Adopted);
        assert_eq!(merged.confidence, 1.0);
    }

    #[test]
    fn test_unavailable_keeps_rule_verdict() {
        let v1 = rule(0.5);
        let v = mark_unavailable(&v1);
        assert_eq!(v.classification, v1.classification);
        assert_eq!(v.secondary_review, SecondaryReview::Unavailable);
    }
}
