//! Classification verdict types
//!
//! A `ClassificationVerdict` is a value object: every evaluation produces a
//! fresh one and nothing mutates it afterwards. Stages that refine a verdict
//! (merge policy, expert feedback) build a new verdict and keep a
//! back-reference to the one they replaced.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

// ============================================================================
// Classification
// ============================================================================

/// Diagnostic label for a single well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    StrongPositive,
    Positive,
    WeakPositive,
    Negative,
    Indeterminate,
    /// Metrics pattern looks like an instrument or measurement artifact
    Suspicious,
}

impl Classification {
    pub const ALL: [Classification; 6] = [
        Classification::StrongPositive,
        Classification::Positive,
        Classification::WeakPositive,
        Classification::Negative,
        Classification::Indeterminate,
        Classification::Suspicious,
    ];

    /// Canonical upper-case label used in storage and reports.
    pub fn as_str(self) -> &'static str {
        match self {
            Classification::StrongPositive => "STRONG_POSITIVE",
            Classification::Positive => "POSITIVE",
            Classification::WeakPositive => "WEAK_POSITIVE",
            Classification::Negative => "NEGATIVE",
            Classification::Indeterminate => "INDETERMINATE",
            Classification::Suspicious => "SUSPICIOUS",
        }
    }

    /// Case-insensitive lookup; `None` for anything outside the enum.
    pub fn parse(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(label))
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown classification label: {0:?}")]
pub struct UnknownClassification(pub String);

impl FromStr for Classification {
    type Err = UnknownClassification;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| UnknownClassification(s.to_string()))
    }
}

// ============================================================================
// Reason tags
// ============================================================================

/// Instrument-error patterns detected before normal classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyTag {
    /// Large signal with a fit that does not describe it
    HighAmplitudePoorFit,
    /// Steepness beyond what enzymatic amplification can produce
    ImpossibleSteepness,
    /// Large signal crossing within the first cycles
    ImpossibleEarlyCrossing,
    /// CQ earlier than plausible alongside real signal
    SuspiciousEarlyCqj,
    /// Large signal with a flat curve
    HighAmpNoGrowth,
}

impl AnomalyTag {
    pub fn as_str(self) -> &'static str {
        match self {
            AnomalyTag::HighAmplitudePoorFit => "high_amplitude_poor_fit",
            AnomalyTag::ImpossibleSteepness => "impossible_steepness",
            AnomalyTag::ImpossibleEarlyCrossing => "impossible_early_crossing",
            AnomalyTag::SuspiciousEarlyCqj => "suspicious_early_cqj",
            AnomalyTag::HighAmpNoGrowth => "high_amp_no_growth",
        }
    }
}

impl std::fmt::Display for AnomalyTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a verdict was flagged as an edge case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeCaseReason {
    GoodCurveNoCqj,
    BorderlineCurveNoCqj,
    IntermediateAmplitude,
    ModerateCurveQuality,
    ModerateSteepness,
    ModerateSnr,
    ValidCqjWeakSignal,
    NoCqjModerateSignal,
}

impl EdgeCaseReason {
    pub fn as_str(self) -> &'static str {
        match self {
            EdgeCaseReason::GoodCurveNoCqj => "good_curve_no_cqj",
            EdgeCaseReason::BorderlineCurveNoCqj => "borderline_curve_no_cqj",
            EdgeCaseReason::IntermediateAmplitude => "intermediate_amplitude",
            EdgeCaseReason::ModerateCurveQuality => "moderate_curve_quality",
            EdgeCaseReason::ModerateSteepness => "moderate_steepness",
            EdgeCaseReason::ModerateSnr => "moderate_snr",
            EdgeCaseReason::ValidCqjWeakSignal => "valid_cqj_weak_signal",
            EdgeCaseReason::NoCqjModerateSignal => "no_cqj_moderate_signal",
        }
    }
}

impl std::fmt::Display for EdgeCaseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Provenance
// ============================================================================

/// Which stage produced a verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum VerdictMethod {
    #[default]
    Rules,
    /// Adopted from the secondary classifier (its self-reported method name)
    Secondary(String),
    /// Short-circuited by a recent expert correction for the same well
    ExpertFeedback,
    /// Input line could not be read as a well record
    Unreadable,
}

impl std::fmt::Display for VerdictMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerdictMethod::Rules => write!(f, "rules"),
            VerdictMethod::Secondary(name) => write!(f, "secondary:{name}"),
            VerdictMethod::ExpertFeedback => write!(f, "expert_feedback"),
            VerdictMethod::Unreadable => write!(f, "unreadable"),
        }
    }
}

/// Outcome of secondary review for a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SecondaryReview {
    /// Router decided the rule verdict stands alone
    #[default]
    NotRequired,
    /// Secondary opinion was meaningfully more confident and replaced the rule verdict
    Adopted,
    /// Secondary opinion was obtained but did not clear the margin
    Retained,
    /// Secondary review was attempted but failed or timed out
    Unavailable,
}

/// Back-reference to a verdict that was replaced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SupersededVerdict {
    pub classification: Classification,
    pub confidence: f64,
}

// ============================================================================
// Verdict
// ============================================================================

/// Classification result for one well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationVerdict {
    pub classification: Classification,
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// Rule verdict is not confident enough to stand alone
    pub edge_case: bool,
    /// Ordered, de-duplicated reason tags
    #[serde(default)]
    pub edge_case_reasons: Vec<EdgeCaseReason>,
    /// Anomaly patterns matched (only set on SUSPICIOUS verdicts)
    #[serde(default)]
    pub anomalies: Vec<AnomalyTag>,
    /// Classifier suggests a secondary model opinion
    pub ml_recommended: bool,
    /// Needs a human look regardless of routing
    pub flag_for_review: bool,
    /// Human-readable explanation
    pub reason: String,
    #[serde(default)]
    pub method: VerdictMethod,
    /// Rule verdict this one replaced, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superseded: Option<SupersededVerdict>,
    #[serde(default)]
    pub secondary_review: SecondaryReview,
}

impl ClassificationVerdict {
    /// Plain rule-stage verdict with no edge-case flags.
    pub fn confident(classification: Classification, confidence: f64, reason: impl Into<String>) -> Self {
        Self {
            classification,
            confidence,
            edge_case: false,
            edge_case_reasons: Vec::new(),
            anomalies: Vec::new(),
            ml_recommended: false,
            flag_for_review: false,
            reason: reason.into(),
            method: VerdictMethod::Rules,
            superseded: None,
            secondary_review: SecondaryReview::NotRequired,
        }
    }

    /// Rule-stage edge case; always recommends secondary review.
    pub fn edge(
        classification: Classification,
        confidence: f64,
        reasons: Vec<EdgeCaseReason>,
        reason: impl Into<String>,
    ) -> Self {
        let mut deduped: Vec<EdgeCaseReason> = Vec::with_capacity(reasons.len());
        for r in reasons {
            if !deduped.contains(&r) {
                deduped.push(r);
            }
        }
        Self {
            edge_case: true,
            edge_case_reasons: deduped,
            ml_recommended: true,
            ..Self::confident(classification, confidence, reason)
        }
    }

    /// Placeholder for a well whose input could not be parsed. Held for a
    /// human; never sent to the secondary classifier.
    pub fn unreadable(error: impl std::fmt::Display) -> Self {
        Self {
            flag_for_review: true,
            method: VerdictMethod::Unreadable,
            ..Self::confident(
                Classification::Indeterminate,
                0.0,
                format!("Well record could not be read: {error}"),
            )
        }
    }

    /// Compact storage form.
    pub fn to_stored(&self) -> StoredClassification {
        StoredClassification::from(self)
    }
}

// ============================================================================
// Storage form
// ============================================================================

/// Small object persisted per well: `{class, confidence, method, reason?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredClassification {
    pub class: Classification,
    pub confidence: f64,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<&ClassificationVerdict> for StoredClassification {
    fn from(v: &ClassificationVerdict) -> Self {
        let mut reason = v.reason.clone();
        if v.secondary_review == SecondaryReview::Unavailable {
            if !reason.is_empty() {
                reason.push(' ');
            }
            reason.push_str("[secondary review unavailable]");
        }
        Self {
            class: v.classification,
            confidence: v.confidence,
            method: v.method.to_string(),
            reason: if reason.is_empty() { None } else { Some(reason) },
        }
    }
}
