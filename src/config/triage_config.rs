//! Triage Configuration - classifier thresholds and pipeline tuning as TOML
//!
//! Every threshold the rule classifier uses is a field in this module. Each
//! struct implements `Default` with the validated laboratory values, so a
//! deployment without a config file classifies exactly as documented.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "QPCR_TRIAGE_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "triage_config.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for a triage deployment.
///
/// Load with `TriageConfig::load()` which searches:
/// 1. `$QPCR_TRIAGE_CONFIG`
/// 2. `./triage_config.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriageConfig {
    /// Laboratory identification
    #[serde(default)]
    pub lab: LabInfo,

    /// Rule classifier thresholds
    #[serde(default)]
    pub thresholds: ClassifierThresholds,

    /// Edge-case routing policy
    #[serde(default)]
    pub routing: RoutingConfig,

    /// Rule / secondary merge policy
    #[serde(default)]
    pub merge: MergeConfig,

    /// Secondary classifier call site
    #[serde(default)]
    pub secondary: SecondaryConfig,

    /// Expert feedback handling
    #[serde(default)]
    pub feedback: FeedbackConfig,

    /// Decision store location
    #[serde(default)]
    pub storage: StorageConfig,
}

impl TriageConfig {
    /// Load configuration using the standard search order. Never fails:
    /// unreadable or invalid files are logged and skipped.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), lab = %config.lab.name, "Loaded triage config from {}", CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", CONFIG_ENV_VAR);
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!(lab = %config.lab.name, "Loaded triage config from ./{}", LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", LOCAL_CONFIG_FILE);
                }
            }
        }

        info!("No {} found, using built-in defaults", LOCAL_CONFIG_FILE);
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate a TOML document. Unknown keys only warn.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(PathBuf::from("<inline>"), e))?;
        config.validate()?;

        let (range_errors, range_warnings) = super::validation::validate_ranges(&config);
        if !range_errors.is_empty() {
            return Err(ConfigError::Validation(range_errors));
        }
        for w in range_warnings {
            warn!("{}", w);
        }
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate internal consistency.
    ///
    /// Rules:
    /// - All numeric values must be finite
    /// - Confidences must lie in [0, 1]
    /// - Strong-positive gates must be at least as strict as positive gates
    /// - Concurrency and timeouts must be non-zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.thresholds;
        let mut errors: Vec<String> = Vec::new();

        let routing = [
            ("routing.low_confidence_floor", self.routing.low_confidence_floor),
            ("routing.confident_min", self.routing.confident_min),
        ];
        for (name, value) in t.numeric_fields().into_iter().chain(routing) {
            if !value.is_finite() {
                errors.push(format!("{name} must be finite (got {value})"));
            }
        }

        Self::check_escalation(t.positive.min_amplitude, t.positive.strong_min_amplitude, "positive.amplitude", &mut errors);
        Self::check_escalation(t.positive.min_r2, t.positive.strong_min_r2, "positive.r2", &mut errors);
        Self::check_escalation(t.positive.min_steepness, t.positive.strong_min_steepness, "positive.steepness", &mut errors);
        Self::check_escalation(t.negative.max_amplitude, t.positive.min_amplitude, "negative/positive amplitude band", &mut errors);
        Self::check_escalation(t.negative.max_r2, t.positive.min_r2, "negative/positive r2 band", &mut errors);
        Self::check_escalation(t.negative.max_steepness, t.positive.min_steepness, "negative/positive steepness band", &mut errors);

        let confidences = [
            ("anomaly.confidence", t.anomaly.confidence),
            ("positive.strong_confidence", t.positive.strong_confidence),
            ("positive.confidence", t.positive.confidence),
            ("negative.confidence", t.negative.confidence),
            ("no_cq.good_curve_confidence", t.no_cq.good_curve_confidence),
            ("no_cq.borderline_confidence", t.no_cq.borderline_confidence),
            ("edge.confidence", t.edge.confidence),
            ("routing.low_confidence_floor", self.routing.low_confidence_floor),
            ("routing.confident_min", self.routing.confident_min),
        ];
        for (name, value) in confidences {
            if !(0.0..=1.0).contains(&value) {
                errors.push(format!("{name}: confidence must be within [0, 1] (got {value})"));
            }
        }

        if !self.merge.min_confidence_margin.is_finite() || self.merge.min_confidence_margin < 0.0 {
            errors.push(format!(
                "merge.min_confidence_margin must be a non-negative number (got {})",
                self.merge.min_confidence_margin
            ));
        }
        if self.secondary.max_concurrency == 0 {
            errors.push("secondary.max_concurrency must be > 0".to_string());
        }
        if self.secondary.timeout_ms == 0 {
            errors.push("secondary.timeout_ms must be > 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_escalation(lower: f64, upper: f64, name: &str, errors: &mut Vec<String>) {
        // NaN/Inf comparisons silently pass, so catch them explicitly
        if !lower.is_finite() || !upper.is_finite() {
            errors.push(format!(
                "{name}: values must be finite (got lower={lower}, upper={upper})"
            ));
            return;
        }
        if upper < lower {
            errors.push(format!(
                "{name}: upper bound ({upper:.3}) must be >= lower bound ({lower:.3})"
            ));
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {1}", .0.display())]
    Io(PathBuf, std::io::Error),
    #[error("Config parse error ({}): {1}", .0.display())]
    Parse(PathBuf, toml::de::Error),
    #[error("Config serialization error: {0}")]
    Serialize(toml::ser::Error),
    #[error("Config validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}

// ============================================================================
// Lab Info
// ============================================================================

/// Identification metadata. Appears in logs and reports only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LabInfo {
    #[serde(default = "default_lab_name")]
    pub name: String,

    #[serde(default)]
    pub site: String,

    /// Instrument model the thresholds were validated on
    #[serde(default)]
    pub instrument: String,
}

fn default_lab_name() -> String {
    "DEFAULT".to_string()
}

impl Default for LabInfo {
    fn default() -> Self {
        Self {
            name: default_lab_name(),
            site: String::new(),
            instrument: String::new(),
        }
    }
}

// ============================================================================
// Classifier Thresholds (master container)
// ============================================================================

/// All rule-classifier thresholds, grouped by decision step.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ClassifierThresholds {
    #[serde(default)]
    pub cq: CqThresholds,

    #[serde(default)]
    pub anomaly: AnomalyThresholds,

    #[serde(default)]
    pub positive: PositiveThresholds,

    #[serde(default)]
    pub negative: NegativeThresholds,

    #[serde(default)]
    pub no_cq: NoCqThresholds,

    #[serde(default)]
    pub edge: EdgeThresholds,
}

impl ClassifierThresholds {
    /// Every numeric threshold, named by its TOML path.
    pub fn numeric_fields(&self) -> Vec<(&'static str, f64)> {
        let (cq, a, p, n, nc, e) = (&self.cq, &self.anomaly, &self.positive, &self.negative, &self.no_cq, &self.edge);
        vec![
            ("thresholds.cq.min_valid_cycle", cq.min_valid_cycle),
            ("thresholds.anomaly.poor_fit_amplitude", a.poor_fit_amplitude),
            ("thresholds.anomaly.poor_fit_r2", a.poor_fit_r2),
            ("thresholds.anomaly.max_plausible_steepness", a.max_plausible_steepness),
            ("thresholds.anomaly.early_crossing_midpoint", a.early_crossing_midpoint),
            ("thresholds.anomaly.early_crossing_amplitude", a.early_crossing_amplitude),
            ("thresholds.anomaly.early_cq_amplitude", a.early_cq_amplitude),
            ("thresholds.anomaly.no_growth_amplitude", a.no_growth_amplitude),
            ("thresholds.anomaly.no_growth_steepness", a.no_growth_steepness),
            ("thresholds.anomaly.confidence", a.confidence),
            ("thresholds.positive.min_amplitude", p.min_amplitude),
            ("thresholds.positive.min_r2", p.min_r2),
            ("thresholds.positive.min_steepness", p.min_steepness),
            ("thresholds.positive.min_midpoint", p.min_midpoint),
            ("thresholds.positive.strong_min_amplitude", p.strong_min_amplitude),
            ("thresholds.positive.strong_min_r2", p.strong_min_r2),
            ("thresholds.positive.strong_min_steepness", p.strong_min_steepness),
            ("thresholds.positive.strong_confidence", p.strong_confidence),
            ("thresholds.positive.confidence", p.confidence),
            ("thresholds.negative.max_amplitude", n.max_amplitude),
            ("thresholds.negative.max_r2", n.max_r2),
            ("thresholds.negative.max_steepness", n.max_steepness),
            ("thresholds.negative.max_midpoint", n.max_midpoint),
            ("thresholds.negative.confidence", n.confidence),
            ("thresholds.no_cq.good_curve_amplitude", nc.good_curve_amplitude),
            ("thresholds.no_cq.good_curve_r2", nc.good_curve_r2),
            ("thresholds.no_cq.good_curve_steepness", nc.good_curve_steepness),
            ("thresholds.no_cq.good_curve_confidence", nc.good_curve_confidence),
            ("thresholds.no_cq.borderline_confidence", nc.borderline_confidence),
            ("thresholds.edge.snr_floor", e.snr_floor),
            ("thresholds.edge.weak_positive_amplitude", e.weak_positive_amplitude),
            ("thresholds.edge.weak_positive_r2", e.weak_positive_r2),
            ("thresholds.edge.confidence", e.confidence),
        ]
    }
}

/// CQ validity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CqThresholds {
    /// CQ below this cycle is suspicious-early rather than valid
    #[serde(default = "default_min_valid_cycle")]
    pub min_valid_cycle: f64,
}

fn default_min_valid_cycle() -> f64 { 5.0 }

impl Default for CqThresholds {
    fn default() -> Self {
        Self {
            min_valid_cycle: default_min_valid_cycle(),
        }
    }
}

/// Instrument-artifact patterns (checked before anything else).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnomalyThresholds {
    /// high_amplitude_poor_fit: amplitude above this ...
    #[serde(default = "default_poor_fit_amplitude")]
    pub poor_fit_amplitude: f64,

    /// ... with r2 below this
    #[serde(default = "default_poor_fit_r2")]
    pub poor_fit_r2: f64,

    /// impossible_steepness: steepness above this
    #[serde(default = "default_max_plausible_steepness")]
    pub max_plausible_steepness: f64,

    /// impossible_early_crossing: midpoint below this ...
    #[serde(default = "default_early_crossing_midpoint")]
    pub early_crossing_midpoint: f64,

    /// ... with amplitude above this
    #[serde(default = "default_early_crossing_amplitude")]
    pub early_crossing_amplitude: f64,

    /// suspicious_early_cqj: suspicious-early CQ with amplitude above this
    #[serde(default = "default_early_cq_amplitude")]
    pub early_cq_amplitude: f64,

    /// high_amp_no_growth: amplitude above this ...
    #[serde(default = "default_no_growth_amplitude")]
    pub no_growth_amplitude: f64,

    /// ... with steepness below this
    #[serde(default = "default_no_growth_steepness")]
    pub no_growth_steepness: f64,

    #[serde(default = "default_anomaly_confidence")]
    pub confidence: f64,
}

fn default_poor_fit_amplitude() -> f64 { 500.0 }
fn default_poor_fit_r2() -> f64 { 0.5 }
fn default_max_plausible_steepness() -> f64 { 1.0 }
fn default_early_crossing_midpoint() -> f64 { 3.0 }
fn default_early_crossing_amplitude() -> f64 { 100.0 }
fn default_early_cq_amplitude() -> f64 { 300.0 }
fn default_no_growth_amplitude() -> f64 { 1000.0 }
fn default_no_growth_steepness() -> f64 { 0.05 }
fn default_anomaly_confidence() -> f64 { 0.90 }

impl Default for AnomalyThresholds {
    fn default() -> Self {
        Self {
            poor_fit_amplitude: default_poor_fit_amplitude(),
            poor_fit_r2: default_poor_fit_r2(),
            max_plausible_steepness: default_max_plausible_steepness(),
            early_crossing_midpoint: default_early_crossing_midpoint(),
            early_crossing_amplitude: default_early_crossing_amplitude(),
            early_cq_amplitude: default_early_cq_amplitude(),
            no_growth_amplitude: default_no_growth_amplitude(),
            no_growth_steepness: default_no_growth_steepness(),
            confidence: default_anomaly_confidence(),
        }
    }
}

/// Confident-positive gate and strong-positive sub-tier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PositiveThresholds {
    #[serde(default = "default_positive_amplitude")]
    pub min_amplitude: f64,

    #[serde(default = "default_positive_r2")]
    pub min_r2: f64,

    #[serde(default = "default_positive_steepness")]
    pub min_steepness: f64,

    /// Midpoint earlier than this cannot be a confident positive
    #[serde(default = "default_positive_midpoint")]
    pub min_midpoint: f64,

    #[serde(default = "default_strong_amplitude")]
    pub strong_min_amplitude: f64,

    #[serde(default = "default_strong_r2")]
    pub strong_min_r2: f64,

    #[serde(default = "default_strong_steepness")]
    pub strong_min_steepness: f64,

    #[serde(default = "default_strong_confidence")]
    pub strong_confidence: f64,

    #[serde(default = "default_positive_confidence")]
    pub confidence: f64,
}

fn default_positive_amplitude() -> f64 { 600.0 }
fn default_positive_r2() -> f64 { 0.90 }
fn default_positive_steepness() -> f64 { 0.2 }
fn default_positive_midpoint() -> f64 { 5.0 }
fn default_strong_amplitude() -> f64 { 1000.0 }
fn default_strong_r2() -> f64 { 0.95 }
fn default_strong_steepness() -> f64 { 0.5 }
fn default_strong_confidence() -> f64 { 0.95 }
fn default_positive_confidence() -> f64 { 0.90 }

impl Default for PositiveThresholds {
    fn default() -> Self {
        Self {
            min_amplitude: default_positive_amplitude(),
            min_r2: default_positive_r2(),
            min_steepness: default_positive_steepness(),
            min_midpoint: default_positive_midpoint(),
            strong_min_amplitude: default_strong_amplitude(),
            strong_min_r2: default_strong_r2(),
            strong_min_steepness: default_strong_steepness(),
            strong_confidence: default_strong_confidence(),
            confidence: default_positive_confidence(),
        }
    }
}

/// Confident-negative gate. Any single condition is sufficient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NegativeThresholds {
    /// Amplitude below this is negative
    #[serde(default = "default_negative_amplitude")]
    pub max_amplitude: f64,

    /// r2 below this is negative
    #[serde(default = "default_negative_r2")]
    pub max_r2: f64,

    /// Steepness below this is negative
    #[serde(default = "default_negative_steepness")]
    pub max_steepness: f64,

    /// Midpoint later than this is negative
    #[serde(default = "default_negative_midpoint")]
    pub max_midpoint: f64,

    #[serde(default = "default_negative_confidence")]
    pub confidence: f64,
}

fn default_negative_amplitude() -> f64 { 200.0 }
fn default_negative_r2() -> f64 { 0.70 }
fn default_negative_steepness() -> f64 { 0.1 }
fn default_negative_midpoint() -> f64 { 42.0 }
fn default_negative_confidence() -> f64 { 0.90 }

impl Default for NegativeThresholds {
    fn default() -> Self {
        Self {
            max_amplitude: default_negative_amplitude(),
            max_r2: default_negative_r2(),
            max_steepness: default_negative_steepness(),
            max_midpoint: default_negative_midpoint(),
            confidence: default_negative_confidence(),
        }
    }
}

/// Handling of curves without a valid CQ.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NoCqThresholds {
    /// A curve this good should have crossed the threshold
    #[serde(default = "default_good_curve_amplitude")]
    pub good_curve_amplitude: f64,

    #[serde(default = "default_good_curve_r2")]
    pub good_curve_r2: f64,

    #[serde(default = "default_good_curve_steepness")]
    pub good_curve_steepness: f64,

    #[serde(default = "default_good_curve_confidence")]
    pub good_curve_confidence: f64,

    #[serde(default = "default_borderline_confidence")]
    pub borderline_confidence: f64,
}

fn default_good_curve_amplitude() -> f64 { 300.0 }
fn default_good_curve_r2() -> f64 { 0.80 }
fn default_good_curve_steepness() -> f64 { 0.15 }
fn default_good_curve_confidence() -> f64 { 0.70 }
fn default_borderline_confidence() -> f64 { 0.60 }

impl Default for NoCqThresholds {
    fn default() -> Self {
        Self {
            good_curve_amplitude: default_good_curve_amplitude(),
            good_curve_r2: default_good_curve_r2(),
            good_curve_steepness: default_good_curve_steepness(),
            good_curve_confidence: default_good_curve_confidence(),
            borderline_confidence: default_borderline_confidence(),
        }
    }
}

/// Fallback edge-case tagging. Intermediate bands reuse the negative and
/// positive gates as their lower and upper bounds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EdgeThresholds {
    /// SNR below this (with real signal) adds `moderate_snr`
    #[serde(default = "default_snr_floor")]
    pub snr_floor: f64,

    /// WEAK_POSITIVE rather than INDETERMINATE from this amplitude ...
    #[serde(default = "default_weak_positive_amplitude")]
    pub weak_positive_amplitude: f64,

    /// ... and this r2
    #[serde(default = "default_weak_positive_r2")]
    pub weak_positive_r2: f64,

    #[serde(default = "default_edge_confidence")]
    pub confidence: f64,
}

fn default_snr_floor() -> f64 { 2.0 }
fn default_weak_positive_amplitude() -> f64 { 300.0 }
fn default_weak_positive_r2() -> f64 { 0.75 }
fn default_edge_confidence() -> f64 { 0.50 }

impl Default for EdgeThresholds {
    fn default() -> Self {
        Self {
            snr_floor: default_snr_floor(),
            weak_positive_amplitude: default_weak_positive_amplitude(),
            weak_positive_r2: default_weak_positive_r2(),
            confidence: default_edge_confidence(),
        }
    }
}

// ============================================================================
// Routing
// ============================================================================

/// How SUSPICIOUS verdicts that the classifier sent to human review are routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SuspiciousRouting {
    /// Apply the router's rule order literally: SUSPICIOUS goes to the secondary classifier
    #[default]
    Secondary,
    /// Verdicts flagged for review with `ml_recommended = false` skip the secondary classifier
    HumanReviewOnly,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoutingConfig {
    /// Anything below this confidence is routed
    #[serde(default = "default_low_confidence_floor")]
    pub low_confidence_floor: f64,

    /// Confident labels at or above this are never routed
    #[serde(default = "default_confident_min")]
    pub confident_min: f64,

    #[serde(default)]
    pub suspicious: SuspiciousRouting,
}

fn default_low_confidence_floor() -> f64 { 0.75 }
fn default_confident_min() -> f64 { 0.85 }

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            low_confidence_floor: default_low_confidence_floor(),
            confident_min: default_confident_min(),
            suspicious: SuspiciousRouting::default(),
        }
    }
}

// ============================================================================
// Merge
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MergeConfig {
    /// Secondary verdict must beat the rule confidence by strictly more than this
    #[serde(default = "default_min_confidence_margin")]
    pub min_confidence_margin: f64,
}

fn default_min_confidence_margin() -> f64 { 0.10 }

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            min_confidence_margin: default_min_confidence_margin(),
        }
    }
}

// ============================================================================
// Secondary classifier
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SecondaryConfig {
    /// HTTP endpoint of the learned classifier; disabled when unset
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Per-call timeout (milliseconds). A timeout counts as a failure.
    #[serde(default = "default_secondary_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum in-flight secondary calls per batch
    #[serde(default = "default_secondary_max_concurrency")]
    pub max_concurrency: usize,
}

fn default_secondary_timeout_ms() -> u64 { 5_000 }
fn default_secondary_max_concurrency() -> usize { 4 }

impl Default for SecondaryConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_ms: default_secondary_timeout_ms(),
            max_concurrency: default_secondary_max_concurrency(),
        }
    }
}

// ============================================================================
// Feedback & storage
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedbackConfig {
    /// How long a recent expert correction short-circuits re-classification (seconds)
    #[serde(default = "default_recent_correction_ttl")]
    pub recent_correction_ttl_secs: u64,
}

fn default_recent_correction_ttl() -> u64 { 3_600 }

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            recent_correction_ttl_secs: default_recent_correction_ttl(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data/triage.db")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}
