//! Well metric input types: WellMetrics, CqValue, WellRecord
//!
//! Metrics arrive already curve-fitted. Every numeric field is optional on the
//! wire and is coerced to a documented default when read, so a single bad field
//! never blocks a batch:
//!
//! | Field       | Default when missing / non-numeric / non-finite |
//! |-------------|--------------------------------------------------|
//! | amplitude   | 0.0                                              |
//! | r2          | 0.0                                              |
//! | steepness   | 0.0                                              |
//! | snr         | 0.0                                              |
//! | midpoint    | 50.0                                             |
//! | baseline    | 0.0                                              |
//! | cq          | `CqValue::Missing`                               |
//!
//! Callers cannot distinguish a missing amplitude from a measured zero after
//! defaulting; the raw `Option` is still available on the struct.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Midpoint used when the curve fit did not report one (cycle number).
pub const DEFAULT_MIDPOINT: f64 = 50.0;

/// Sentinel written by the instrument export when no crossing was found.
pub const CQ_SENTINEL: f64 = -999.0;

// ============================================================================
// Lenient number parsing
// ============================================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum LenientNumber {
    Number(f64),
    Text(String),
    Other(serde::de::IgnoredAny),
}

/// Accept a number, a numeric string, null, or anything else (-> None).
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<LenientNumber>::deserialize(deserializer)? {
        Some(LenientNumber::Number(v)) => Some(v),
        Some(LenientNumber::Text(s)) => s.trim().parse::<f64>().ok(),
        Some(LenientNumber::Other(_)) | None => None,
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LenientText {
    Text(String),
    Number(serde_json::Number),
    Other(serde::de::IgnoredAny),
}

/// Accept text or a number (stringified); anything else is `None`.
fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<LenientText>::deserialize(deserializer)? {
        Some(LenientText::Text(s)) => Some(s),
        Some(LenientText::Number(n)) => Some(n.to_string()),
        Some(LenientText::Other(_)) | None => None,
    })
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_opt_string(deserializer)?.unwrap_or_default())
}

fn finite_or(value: Option<f64>, default: f64) -> f64 {
    match value {
        Some(v) if v.is_finite() => v,
        _ => default,
    }
}

// ============================================================================
// CQ value
// ============================================================================

/// Threshold-crossing cycle ("CQJ") as reported upstream.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum CqValue {
    /// Numeric crossing cycle
    Value(f64),
    /// Explicit "no crossing" marker ("N/A" or the -999 sentinel)
    NotAvailable,
    /// Field absent, null, or unparseable
    #[default]
    Missing,
}

/// Validity of a CQ value for classification purposes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CqStatus {
    /// Numeric and at or above the minimum plausible cycle
    Valid(f64),
    /// Numeric but earlier than physically plausible
    SuspiciousEarly(f64),
    /// No usable crossing
    Invalid,
}

impl CqStatus {
    pub fn is_valid(self) -> bool {
        matches!(self, CqStatus::Valid(_))
    }
}

impl CqValue {
    /// Build from a raw number, mapping the sentinel and non-finite values.
    pub fn from_number(value: f64) -> Self {
        if !value.is_finite() {
            CqValue::Missing
        } else if (value - CQ_SENTINEL).abs() < f64::EPSILON {
            CqValue::NotAvailable
        } else {
            CqValue::Value(value)
        }
    }

    /// Build from text: "N/A" (any case) or blank means not available,
    /// numeric text is parsed, anything else is treated as missing.
    pub fn from_text(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("n/a") || trimmed.eq_ignore_ascii_case("na") {
            return CqValue::NotAvailable;
        }
        trimmed
            .parse::<f64>()
            .map_or(CqValue::Missing, Self::from_number)
    }

    /// Numeric value, if any.
    pub fn value(self) -> Option<f64> {
        match self {
            CqValue::Value(v) => Some(v),
            CqValue::NotAvailable | CqValue::Missing => None,
        }
    }

    /// Classify the CQ against the minimum valid cycle.
    ///
    /// There is deliberately no upper bound; late crossings are judged by the
    /// curve-shape rules instead.
    pub fn status(self, min_valid_cycle: f64) -> CqStatus {
        match self {
            CqValue::Value(v) if v >= min_valid_cycle => CqStatus::Valid(v),
            CqValue::Value(v) => CqStatus::SuspiciousEarly(v),
            CqValue::NotAvailable | CqValue::Missing => CqStatus::Invalid,
        }
    }
}

impl From<f64> for CqValue {
    fn from(value: f64) -> Self {
        Self::from_number(value)
    }
}

impl Serialize for CqValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CqValue::Value(v) => serializer.serialize_f64(*v),
            CqValue::NotAvailable => serializer.serialize_str("N/A"),
            CqValue::Missing => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for CqValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<LenientNumber>::deserialize(deserializer)? {
            Some(LenientNumber::Number(v)) => CqValue::from_number(v),
            Some(LenientNumber::Text(s)) => CqValue::from_text(&s),
            Some(LenientNumber::Other(_)) | None => CqValue::Missing,
        })
    }
}

// ============================================================================
// Well metrics
// ============================================================================

/// Curve-fit metrics for a single well.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WellMetrics {
    /// Fitted amplitude (RFU above baseline)
    #[serde(default, deserialize_with = "lenient_f64")]
    pub amplitude: Option<f64>,
    /// Curve-fit coefficient of determination
    #[serde(default, deserialize_with = "lenient_f64")]
    pub r2: Option<f64>,
    /// Sigmoid steepness
    #[serde(default, deserialize_with = "lenient_f64")]
    pub steepness: Option<f64>,
    /// Signal-to-noise ratio. Advisory only: unreliable on baseline-subtracted data.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub snr: Option<f64>,
    /// Sigmoid midpoint (cycle number)
    #[serde(default, deserialize_with = "lenient_f64")]
    pub midpoint: Option<f64>,
    /// Fitted baseline
    #[serde(default, deserialize_with = "lenient_f64")]
    pub baseline: Option<f64>,
    /// Threshold-crossing cycle
    #[serde(default, alias = "cqj", alias = "cq_value")]
    pub cq: CqValue,
    /// Sample identity as reported by the run file
    #[serde(default, deserialize_with = "lenient_string")]
    pub sample_name: String,
}

impl WellMetrics {
    /// Shorthand for the four curve-shape metrics most tests and callers set.
    pub fn curve(amplitude: f64, r2: f64, steepness: f64, midpoint: f64) -> Self {
        Self {
            amplitude: Some(amplitude),
            r2: Some(r2),
            steepness: Some(steepness),
            midpoint: Some(midpoint),
            ..Self::default()
        }
    }

    pub fn with_snr(mut self, snr: f64) -> Self {
        self.snr = Some(snr);
        self
    }

    pub fn with_cq(mut self, cq: impl Into<CqValue>) -> Self {
        self.cq = cq.into();
        self
    }

    pub fn with_sample_name(mut self, name: impl Into<String>) -> Self {
        self.sample_name = name.into();
        self
    }

    pub fn amplitude(&self) -> f64 {
        finite_or(self.amplitude, 0.0)
    }

    pub fn r2(&self) -> f64 {
        finite_or(self.r2, 0.0)
    }

    pub fn steepness(&self) -> f64 {
        finite_or(self.steepness, 0.0)
    }

    pub fn snr(&self) -> f64 {
        finite_or(self.snr, 0.0)
    }

    pub fn midpoint(&self) -> f64 {
        finite_or(self.midpoint, DEFAULT_MIDPOINT)
    }

    pub fn baseline(&self) -> f64 {
        finite_or(self.baseline, 0.0)
    }

    /// Feature map handed to expert-review records and the secondary classifier.
    pub fn feature_map(&self) -> std::collections::BTreeMap<String, serde_json::Value> {
        let mut map = std::collections::BTreeMap::new();
        map.insert("amplitude".to_string(), serde_json::json!(self.amplitude()));
        map.insert("r2".to_string(), serde_json::json!(self.r2()));
        map.insert("steepness".to_string(), serde_json::json!(self.steepness()));
        map.insert("snr".to_string(), serde_json::json!(self.snr()));
        map.insert("midpoint".to_string(), serde_json::json!(self.midpoint()));
        map.insert("baseline".to_string(), serde_json::json!(self.baseline()));
        map.insert(
            "cq".to_string(),
            serde_json::to_value(self.cq).unwrap_or(serde_json::Value::Null),
        );
        map
    }
}

// ============================================================================
// Well record (batch input)
// ============================================================================

/// Raw amplification samples, forwarded untouched to the secondary classifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurveSamples {
    #[serde(default)]
    pub cycles: Vec<f64>,
    #[serde(default)]
    pub rfu: Vec<f64>,
}

impl CurveSamples {
    pub fn is_empty(&self) -> bool {
        self.cycles.is_empty() || self.rfu.is_empty()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LenientCurve {
    Curve(CurveSamples),
    Other(serde::de::IgnoredAny),
}

/// A malformed curve is dropped rather than failing the record.
fn lenient_curve<'de, D>(deserializer: D) -> Result<CurveSamples, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<LenientCurve>::deserialize(deserializer)? {
        Some(LenientCurve::Curve(curve)) => curve,
        Some(LenientCurve::Other(_)) | None => CurveSamples::default(),
    })
}

/// One line of batch input: identity, metrics, and optional raw curve.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WellRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub well_id: String,
    /// Pathogen / assay target (fluorophore channel) for per-target reporting
    #[serde(
        default,
        alias = "pathogen",
        alias = "target",
        deserialize_with = "lenient_opt_string"
    )]
    pub assay_target: Option<String>,
    #[serde(flatten)]
    pub metrics: WellMetrics,
    #[serde(default, deserialize_with = "lenient_curve")]
    pub curve: CurveSamples,
    /// Set when the input line could not be read as a record at all
    #[serde(skip)]
    pub parse_error: Option<String>,
}

impl WellRecord {
    /// Placeholder for an input line that is not a well record.
    pub fn unreadable(well_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            well_id: well_id.into(),
            parse_error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Parse one JSON line of batch input. Never fails: every line yields a
    /// record, so a batch always produces one verdict per input well.
    ///
    /// Wells without an id are named `line-<n>` after their 1-based line number.
    pub fn from_json_line(line: &str, line_no: usize) -> Self {
        match serde_json::from_str::<WellRecord>(line) {
            Ok(mut record) => {
                if record.well_id.trim().is_empty() {
                    record.well_id = format!("line-{line_no}");
                }
                record
            }
            Err(e) => {
                let well_id = serde_json::from_str::<serde_json::Value>(line)
                    .ok()
                    .and_then(|v| match v.get("well_id")? {
                        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
                        serde_json::Value::Number(n) => Some(n.to_string()),
                        _ => None,
                    })
                    .unwrap_or_else(|| format!("line-{line_no}"));
                Self::unreadable(well_id, e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_documented_defaults() {
        let m: WellMetrics = serde_json::from_str("{}").unwrap();
        assert_eq!(m.amplitude(), 0.0);
        assert_eq!(m.r2(), 0.0);
        assert_eq!(m.steepness(), 0.0);
        assert_eq!(m.snr(), 0.0);
        assert_eq!(m.midpoint(), DEFAULT_MIDPOINT);
        assert_eq!(m.cq, CqValue::Missing);
    }

    #[test]
    fn test_garbage_numeric_fields_coerce_instead_of_failing() {
        let m: WellMetrics = serde_json::from_str(
            r#"{"amplitude": "oops", "r2": "0.95", "steepness": [1, 2], "midpoint": null}"#,
        )
        .unwrap();
        assert_eq!(m.amplitude(), 0.0);
        assert!((m.r2() - 0.95).abs() < 1e-12);
        assert_eq!(m.steepness(), 0.0);
        assert_eq!(m.midpoint(), DEFAULT_MIDPOINT);
    }

    #[test]
    fn test_non_finite_values_are_treated_as_missing() {
        let mut m = WellMetrics::curve(f64::NAN, 0.9, f64::INFINITY, f64::NAN);
        m.snr = Some(f64::NEG_INFINITY);
        assert_eq!(m.amplitude(), 0.0);
        assert_eq!(m.steepness(), 0.0);
        assert_eq!(m.snr(), 0.0);
        assert_eq!(m.midpoint(), DEFAULT_MIDPOINT);
        assert_eq!(CqValue::from_number(f64::NAN), CqValue::Missing);
    }

    #[test]
    fn test_cq_markers() {
        let na: CqValue = serde_json::from_str(r#""N/A""#).unwrap();
        assert_eq!(na, CqValue::NotAvailable);
        let sentinel: CqValue = serde_json::from_str("-999").unwrap();
        assert_eq!(sentinel, CqValue::NotAvailable);
        let text: CqValue = serde_json::from_str(r#"" 21.5 ""#).unwrap();
        assert_eq!(text, CqValue::Value(21.5));
        let junk: CqValue = serde_json::from_str(r#""undetermined""#).unwrap();
        assert_eq!(junk, CqValue::Missing);
    }

    #[test]
    fn test_cq_status_boundaries() {
        assert_eq!(CqValue::Value(5.0).status(5.0), CqStatus::Valid(5.0));
        assert_eq!(CqValue::Value(4.99).status(5.0), CqStatus::SuspiciousEarly(4.99));
        assert_eq!(CqValue::Value(48.0).status(5.0), CqStatus::Valid(48.0));
        assert_eq!(CqValue::NotAvailable.status(5.0), CqStatus::Invalid);
        assert_eq!(CqValue::Missing.status(5.0), CqStatus::Invalid);
    }

    #[test]
    fn test_well_record_flattens_metrics() {
        let rec: WellRecord = serde_json::from_str(
            r#"{"well_id": "A1", "pathogen": "FAM", "amplitude": 800, "cq": 20,
                "curve": {"cycles": [1, 2], "rfu": [10, 12]}}"#,
        )
        .unwrap();
        assert_eq!(rec.well_id, "A1");
        assert_eq!(rec.assay_target.as_deref(), Some("FAM"));
        assert_eq!(rec.metrics.amplitude(), 800.0);
        assert_eq!(rec.metrics.cq, CqValue::Value(20.0));
        assert!(!rec.curve.is_empty());
        assert!(rec.parse_error.is_none());
    }

    #[test]
    fn test_numeric_identity_fields_are_stringified() {
        let rec = WellRecord::from_json_line(r#"{"well_id": 7, "amplitude": 800, "sample_name": 42, "target": 3}"#, 1);
        assert_eq!(rec.well_id, "7");
        assert_eq!(rec.metrics.sample_name, "42");
        assert_eq!(rec.assay_target.as_deref(), Some("3"));
        assert_eq!(rec.metrics.amplitude(), 800.0);
        assert!(rec.parse_error.is_none());
    }

    #[test]
    fn test_malformed_curve_is_dropped_not_fatal() {
        let rec = WellRecord::from_json_line(
            r#"{"well_id": "A1", "amplitude": 800, "curve": {"cycles": [1, "x"], "rfu": [10, 12]}}"#,
            1,
        );
        assert_eq!(rec.well_id, "A1");
        assert!(rec.curve.is_empty());
        assert_eq!(rec.metrics.amplitude(), 800.0);
        assert!(rec.parse_error.is_none());

        let rec = WellRecord::from_json_line(r#"{"well_id": "A2", "curve": "n/a", "sample_name": {"a": 1}}"#, 2);
        assert!(rec.curve.is_empty());
        assert_eq!(rec.metrics.sample_name, "");
        assert!(rec.parse_error.is_none());
    }

    #[test]
    fn test_missing_well_id_uses_line_number() {
        let rec = WellRecord::from_json_line(r#"{"amplitude": 50}"#, 12);
        assert_eq!(rec.well_id, "line-12");
        assert!(rec.parse_error.is_none());
    }

    #[test]
    fn test_unparseable_line_still_yields_a_record() {
        let rec = WellRecord::from_json_line("{not json", 4);
        assert_eq!(rec.well_id, "line-4");
        assert!(rec.parse_error.is_some());

        let rec = WellRecord::from_json_line("[1, 2, 3]", 5);
        assert_eq!(rec.well_id, "line-5");
        assert!(rec.parse_error.is_some());
    }
}
