//! Instrument-artifact detection
//!
//! Runs before any biological interpretation. Each pattern describes a curve
//! that amplification chemistry cannot produce, so a match means "check the
//! instrument", not "check the patient".

use crate::config::AnomalyThresholds;
use crate::types::{AnomalyTag, CqStatus};

use super::CurveSnapshot;

/// Return every anomaly pattern the curve matches, in fixed evaluation order.
pub fn detect(curve: &CurveSnapshot, t: &AnomalyThresholds) -> Vec<AnomalyTag> {
    let mut tags = Vec::new();

    if curve.amplitude > t.poor_fit_amplitude && curve.r2 < t.poor_fit_r2 {
        tags.push(AnomalyTag::HighAmplitudePoorFit);
    }
    if curve.steepness > t.max_plausible_steepness {
        tags.push(AnomalyTag::ImpossibleSteepness);
    }
    if curve.midpoint < t.early_crossing_midpoint && curve.amplitude > t.early_crossing_amplitude {
        tags.push(AnomalyTag::ImpossibleEarlyCrossing);
    }
    if matches!(curve.cq, CqStatus::SuspiciousEarly(_)) && curve.amplitude > t.early_cq_amplitude {
        tags.push(AnomalyTag::SuspiciousEarlyCqj);
    }
    if curve.amplitude > t.no_growth_amplitude && curve.steepness < t.no_growth_steepness {
        tags.push(AnomalyTag::HighAmpNoGrowth);
    }

    tags
}
