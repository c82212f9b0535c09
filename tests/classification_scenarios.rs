//! Classification Scenario Tests
//!
//! End-to-end checks of the rule tier and router on realistic well records,
//! parsed from the JSON shape the CLI reads.

use qpcr_triage::types::{AnomalyTag, SecondaryReview, VerdictMethod};
use qpcr_triage::{classify, Classification, EdgeCaseReason, EdgeCaseRouter, RuleClassifier, WellRecord};

fn parse(json: &str) -> WellRecord {
    serde_json::from_str(json).unwrap()
}

// ============================================================================
// Reference scenarios
// ============================================================================

#[test]
fn strong_positive_well() {
    let record = parse(
        r#"{"well_id":"A1","pathogen":"FAM","amplitude":35000,"r2":0.999,"steepness":0.95,
            "snr":35,"midpoint":5,"cq":16.5}"#,
    );
    let v = classify(&record.metrics);
    assert_eq!(v.classification, Classification::StrongPositive);
    assert_eq!(v.confidence, 0.95);
    assert!(!v.edge_case);
    assert!(!EdgeCaseRouter::default().needs_secondary_review(&v));
}

#[test]
fn clear_negative_well_with_na_cq() {
    let record = parse(
        r#"{"well_id":"A2","amplitude":50,"r2":0.3,"steepness":0.05,"snr":1,"midpoint":30,"cq":"N/A"}"#,
    );
    let v = classify(&record.metrics);
    assert_eq!(v.classification, Classification::Negative);
    assert_eq!(v.confidence, 0.90);
    assert!(!EdgeCaseRouter::default().needs_secondary_review(&v));
}

#[test]
fn moderate_well_is_routed_edge_case() {
    let record = parse(
        r#"{"well_id":"A3","amplitude":800,"r2":0.75,"steepness":0.12,"snr":1.8,"midpoint":28,"cq":20}"#,
    );
    let v = classify(&record.metrics);
    assert!(v.edge_case);
    assert!(matches!(
        v.classification,
        Classification::WeakPositive | Classification::Indeterminate
    ));
    assert!(v.edge_case_reasons.contains(&EdgeCaseReason::ModerateSteepness));
    assert!(EdgeCaseRouter::default().needs_secondary_review(&v));
    assert_eq!(v.secondary_review, SecondaryReview::NotRequired);
}

// ============================================================================
// Input coercion
// ============================================================================

#[test]
fn sentinel_and_missing_cq_are_not_valid() {
    for cq in [r#""cq":-999"#, r#""cq":null"#, r#""cq":"na""#, r#""cq":"""#] {
        let json = format!(
            r#"{{"well_id":"B1","amplitude":450,"r2":0.85,"steepness":0.18,"midpoint":30,{cq}}}"#
        );
        let v = classify(&parse(&json).metrics);
        assert_eq!(v.classification, Classification::Indeterminate, "cq input {cq}");
        assert_eq!(v.edge_case_reasons, vec![EdgeCaseReason::GoodCurveNoCqj]);
    }
}

#[test]
fn numeric_string_cq_is_accepted() {
    let record = parse(
        r#"{"well_id":"B2","amplitude":35000,"r2":0.999,"steepness":0.95,"midpoint":5,"cq":"16.5"}"#,
    );
    assert_eq!(classify(&record.metrics).classification, Classification::StrongPositive);
}

#[test]
fn missing_fields_never_fail() {
    let record = parse(r#"{"well_id":"B3"}"#);
    let v = classify(&record.metrics);
    assert_eq!(v.classification, Classification::Negative);
    assert_eq!(v.method, VerdictMethod::Rules);
}

// ============================================================================
// Anomaly precedence
// ============================================================================

#[test]
fn every_anomaly_beats_other_rules() {
    let cases = [
        (r#"{"well_id":"C1","amplitude":900,"r2":0.3,"steepness":0.3,"midpoint":20,"cq":20}"#, AnomalyTag::HighAmplitudePoorFit),
        (r#"{"well_id":"C2","amplitude":5000,"r2":0.99,"steepness":1.4,"midpoint":20,"cq":20}"#, AnomalyTag::ImpossibleSteepness),
        (r#"{"well_id":"C3","amplitude":5000,"r2":0.99,"steepness":0.6,"midpoint":2,"cq":20}"#, AnomalyTag::ImpossibleEarlyCrossing),
        (r#"{"well_id":"C4","amplitude":5000,"r2":0.99,"steepness":0.6,"midpoint":20,"cq":2}"#, AnomalyTag::SuspiciousEarlyCqj),
        (r#"{"well_id":"C5","amplitude":5000,"r2":0.99,"steepness":0.01,"midpoint":20,"cq":20}"#, AnomalyTag::HighAmpNoGrowth),
    ];
    for (json, tag) in cases {
        let v = classify(&parse(json).metrics);
        assert_eq!(v.classification, Classification::Suspicious, "{json}");
        assert!(v.anomalies.contains(&tag), "{json}: {:?}", v.anomalies);
        assert!(v.flag_for_review);
        assert!(!v.ml_recommended);
        assert!(v.reason.contains(tag.as_str()));
    }
}

// ============================================================================
// Router invariants
// ============================================================================

#[test]
fn confident_rule_verdicts_are_never_routed() {
    let classifier = RuleClassifier::default();
    let router = EdgeCaseRouter::default();
    for amplitude in [600.0, 1_000.0, 5_000.0, 40_000.0] {
        for r2 in [0.90, 0.95, 0.999] {
            for steepness in [0.2, 0.5, 0.9] {
                let m = qpcr_triage::WellMetrics::curve(amplitude, r2, steepness, 20.0).with_cq(22.0);
                let v = classifier.classify(&m);
                assert!(matches!(
                    v.classification,
                    Classification::Positive | Classification::StrongPositive
                ));
                assert!(!router.needs_secondary_review(&v));
            }
        }
    }
}

#[test]
fn stored_form_roundtrips_classification_and_confidence() {
    let v = classify(&parse(r#"{"well_id":"D1","amplitude":800,"r2":0.93,"steepness":0.3,"midpoint":22,"cq":24}"#).metrics);
    let json = serde_json::to_string(&v.to_stored()).unwrap();
    let back: qpcr_triage::StoredClassification = serde_json::from_str(&json).unwrap();
    assert_eq!(back.class, v.classification);
    assert_eq!(back.confidence, v.confidence);
    assert_eq!(back.method, "rules");
}
