//! Rule Classifier - deterministic first tier of the triage pipeline
//!
//! Evaluation order (first decisive step wins):
//!
//! 1. **CQ validity**: valid (>= 5 cycles), suspicious-early (< 5) or invalid
//! 2. **Anomaly detection**: instrument-artifact patterns → SUSPICIOUS
//! 3. **Confident positive**: every curve gate passes and CQ is valid
//!    → STRONG_POSITIVE / POSITIVE
//! 4. **Confident negative**: any curve gate fails → NEGATIVE
//! 5. **No CQ**: good curve without a crossing → INDETERMINATE (redo),
//!    otherwise borderline INDETERMINATE
//! 6. **Fallback edge case**: tag every moderate metric → WEAK_POSITIVE or
//!    INDETERMINATE at low confidence
//!
//! SNR never gates a confident call: it is unreliable on baseline-subtracted
//! data and only contributes the `moderate_snr` edge-case tag.
//!
//! The classifier is pure. It never fails on malformed input; missing and
//! non-finite metrics are defaulted by [`WellMetrics`] accessors.

pub mod anomaly;

use rayon::prelude::*;
use std::sync::OnceLock;
use tracing::{debug, info};

use crate::config::ClassifierThresholds;
use crate::feedback::RecentCorrections;
use crate::types::{
    Classification, ClassificationVerdict, CqStatus, EdgeCaseReason, VerdictMethod, WellMetrics,
    EXPERT_CONFIDENCE,
};

/// Metrics after defaulting, plus the resolved CQ status.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveSnapshot {
    pub amplitude: f64,
    pub r2: f64,
    pub steepness: f64,
    pub snr: f64,
    pub midpoint: f64,
    pub cq: CqStatus,
}

impl CurveSnapshot {
    pub fn new(metrics: &WellMetrics, thresholds: &ClassifierThresholds) -> Self {
        Self {
            amplitude: metrics.amplitude(),
            r2: metrics.r2(),
            steepness: metrics.steepness(),
            snr: metrics.snr(),
            midpoint: metrics.midpoint(),
            cq: metrics.cq.status(thresholds.cq.min_valid_cycle),
        }
    }

    fn describe(&self) -> String {
        let cq = match self.cq {
            CqStatus::Valid(v) => format!("{v:.2}"),
            CqStatus::SuspiciousEarly(v) => format!("{v:.2} (early)"),
            CqStatus::Invalid => "none".to_string(),
        };
        format!(
            "amplitude {:.1}, R² {:.3}, steepness {:.3}, midpoint {:.1}, Cq {}",
            self.amplitude, self.r2, self.steepness, self.midpoint, cq
        )
    }
}

/// Deterministic threshold classifier.
#[derive(Debug, Clone, Default)]
pub struct RuleClassifier {
    thresholds: ClassifierThresholds,
}

impl RuleClassifier {
    pub fn new(thresholds: ClassifierThresholds) -> Self {
        Self { thresholds }
    }

    /// Classify one well.
    pub fn classify(&self, metrics: &WellMetrics) -> ClassificationVerdict {
        let curve = CurveSnapshot::new(metrics, &self.thresholds);
        let t = &self.thresholds;

        // Step 2: instrument artifacts short-circuit everything else
        let anomalies = anomaly::detect(&curve, &t.anomaly);
        if !anomalies.is_empty() {
            let tags: Vec<&str> = anomalies.iter().map(|a| a.as_str()).collect();
            debug!(sample = %metrics.sample_name, anomalies = ?tags, "Suspicious curve");
            return ClassificationVerdict {
                flag_for_review: true,
                ml_recommended: false,
                reason: format!(
                    "Possible instrument artifact ({}): {}",
                    tags.join(", "),
                    curve.describe()
                ),
                anomalies,
                ..ClassificationVerdict::confident(Classification::Suspicious, t.anomaly.confidence, "")
            };
        }

        // Step 3: confident positive
        if self.is_confident_positive(&curve) {
            let p = &t.positive;
            let strong = curve.amplitude >= p.strong_min_amplitude
                && curve.r2 >= p.strong_min_r2
                && curve.steepness >= p.strong_min_steepness;
            return if strong {
                ClassificationVerdict::confident(
                    Classification::StrongPositive,
                    p.strong_confidence,
                    format!("Strong amplification: {}", curve.describe()),
                )
            } else {
                ClassificationVerdict::confident(
                    Classification::Positive,
                    p.confidence,
                    format!("Clear amplification: {}", curve.describe()),
                )
            };
        }

        // Step 4: confident negative
        if self.is_confident_negative(&curve) {
            return ClassificationVerdict::confident(
                Classification::Negative,
                t.negative.confidence,
                format!("No meaningful amplification: {}", curve.describe()),
            );
        }

        // Step 5: no crossing at all. Step 4 already caught the clear negatives.
        if curve.cq == CqStatus::Invalid {
            let n = &t.no_cq;
            let good_curve = curve.amplitude >= n.good_curve_amplitude
                && curve.r2 >= n.good_curve_r2
                && curve.steepness >= n.good_curve_steepness;
            return if good_curve {
                ClassificationVerdict::edge(
                    Classification::Indeterminate,
                    n.good_curve_confidence,
                    vec![EdgeCaseReason::GoodCurveNoCqj],
                    format!("Good curve without threshold crossing, needs redo: {}", curve.describe()),
                )
            } else {
                ClassificationVerdict::edge(
                    Classification::Indeterminate,
                    n.borderline_confidence,
                    vec![EdgeCaseReason::BorderlineCurveNoCqj],
                    format!("Borderline curve without threshold crossing: {}", curve.describe()),
                )
            };
        }

        // Step 6: valid or suspicious-early CQ, but nothing decisive
        self.fallback_edge_case(&curve)
    }

    /// Classify one well, honouring a recent expert correction for the same well.
    ///
    /// The lookup is owned by the caller; an unexpired correction whose label
    /// maps to a known classification wins outright at confidence 1.0.
    pub fn classify_with_feedback(
        &self,
        well_id: &str,
        metrics: &WellMetrics,
        recent: &RecentCorrections,
        now: u64,
    ) -> ClassificationVerdict {
        if let Some(correction) = recent.lookup(well_id, now) {
            if let Some(classification) = Classification::parse(&correction.label) {
                debug!(well_id = %well_id, label = %classification, "Using recent expert correction");
                return ClassificationVerdict {
                    method: VerdictMethod::ExpertFeedback,
                    ..ClassificationVerdict::confident(
                        classification,
                        EXPERT_CONFIDENCE,
                        format!("Expert correction recorded at {}", correction.timestamp),
                    )
                };
            }
        }
        self.classify(metrics)
    }

    /// Classify many wells in parallel. Output order matches input order.
    pub fn classify_batch(&self, wells: &[WellMetrics]) -> Vec<ClassificationVerdict> {
        let verdicts: Vec<ClassificationVerdict> = wells.par_iter().map(|m| self.classify(m)).collect();
        info!(wells = verdicts.len(), "Rule classification complete");
        verdicts
    }

    fn is_confident_positive(&self, c: &CurveSnapshot) -> bool {
        let p = &self.thresholds.positive;
        c.amplitude >= p.min_amplitude
            && c.r2 >= p.min_r2
            && c.steepness >= p.min_steepness
            && c.cq.is_valid()
            && c.midpoint >= p.min_midpoint
    }

    fn is_confident_negative(&self, c: &CurveSnapshot) -> bool {
        let n = &self.thresholds.negative;
        c.amplitude < n.max_amplitude
            || c.r2 < n.max_r2
            || c.steepness < n.max_steepness
            || c.midpoint > n.max_midpoint
    }

    fn fallback_edge_case(&self, c: &CurveSnapshot) -> ClassificationVerdict {
        let t = &self.thresholds;
        let (neg, pos, edge) = (&t.negative, &t.positive, &t.edge);
        let mut reasons = Vec::new();

        if c.amplitude >= neg.max_amplitude && c.amplitude < pos.min_amplitude {
            reasons.push(EdgeCaseReason::IntermediateAmplitude);
        }
        if c.r2 >= neg.max_r2 && c.r2 < pos.min_r2 {
            reasons.push(EdgeCaseReason::ModerateCurveQuality);
        }
        if c.steepness >= neg.max_steepness && c.steepness < pos.min_steepness {
            reasons.push(EdgeCaseReason::ModerateSteepness);
        }
        if c.snr < edge.snr_floor && c.amplitude > neg.max_amplitude {
            reasons.push(EdgeCaseReason::ModerateSnr);
        }
        if c.cq.is_valid() && c.amplitude < pos.min_amplitude {
            reasons.push(EdgeCaseReason::ValidCqjWeakSignal);
        }
        if !c.cq.is_valid() && c.amplitude >= neg.max_amplitude {
            reasons.push(EdgeCaseReason::NoCqjModerateSignal);
        }

        let classification = if c.amplitude >= edge.weak_positive_amplitude && c.r2 >= edge.weak_positive_r2 {
            Classification::WeakPositive
        } else {
            Classification::Indeterminate
        };

        let tags: Vec<&str> = reasons.iter().map(|r| r.as_str()).collect();
        let reason = format!("Edge case [{}]: {}", tags.join(", "), c.describe());
        ClassificationVerdict::edge(classification, edge.confidence, reasons, reason)
    }
}

/// Classify with the built-in default thresholds.
pub fn classify(metrics: &WellMetrics) -> ClassificationVerdict {
    static DEFAULT: OnceLock<RuleClassifier> = OnceLock::new();
    DEFAULT.get_or_init(RuleClassifier::default).classify(metrics)
}
