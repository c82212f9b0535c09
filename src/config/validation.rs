//! Config validation: unknown-key detection with Levenshtein suggestions
//! and plausibility range checks.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Warnings never break existing configs.

use std::collections::HashSet;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for TriageConfig.
///
/// Maintained by hand to match the struct hierarchy in triage_config.rs.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [lab]
        "lab",
        "lab.name",
        "lab.site",
        "lab.instrument",
        // [thresholds]
        "thresholds",
        "thresholds.cq",
        "thresholds.cq.min_valid_cycle",
        "thresholds.anomaly",
        "thresholds.anomaly.poor_fit_amplitude",
        "thresholds.anomaly.poor_fit_r2",
        "thresholds.anomaly.max_plausible_steepness",
        "thresholds.anomaly.early_crossing_midpoint",
        "thresholds.anomaly.early_crossing_amplitude",
        "thresholds.anomaly.early_cq_amplitude",
        "thresholds.anomaly.no_growth_amplitude",
        "thresholds.anomaly.no_growth_steepness",
        "thresholds.anomaly.confidence",
        "thresholds.positive",
        "thresholds.positive.min_amplitude",
        "thresholds.positive.min_r2",
        "thresholds.positive.min_steepness",
        "thresholds.positive.min_midpoint",
        "thresholds.positive.strong_min_amplitude",
        "thresholds.positive.strong_min_r2",
        "thresholds.positive.strong_min_steepness",
        "thresholds.positive.strong_confidence",
        "thresholds.positive.confidence",
        "thresholds.negative",
        "thresholds.negative.max_amplitude",
        "thresholds.negative.max_r2",
        "thresholds.negative.max_steepness",
        "thresholds.negative.max_midpoint",
        "thresholds.negative.confidence",
        "thresholds.no_cq",
        "thresholds.no_cq.good_curve_amplitude",
        "thresholds.no_cq.good_curve_r2",
        "thresholds.no_cq.good_curve_steepness",
        "thresholds.no_cq.good_curve_confidence",
        "thresholds.no_cq.borderline_confidence",
        "thresholds.edge",
        "thresholds.edge.snr_floor",
        "thresholds.edge.weak_positive_amplitude",
        "thresholds.edge.weak_positive_r2",
        "thresholds.edge.confidence",
        // [routing]
        "routing",
        "routing.low_confidence_floor",
        "routing.confident_min",
        "routing.suspicious",
        // [merge]
        "merge",
        "merge.min_confidence_margin",
        // [secondary]
        "secondary",
        "secondary.endpoint",
        "secondary.timeout_ms",
        "secondary.max_concurrency",
        // [feedback]
        "feedback",
        "feedback.recent_correction_ttl_secs",
        // [storage]
        "storage",
        "storage.data_dir",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = 2 } }` yields:
/// `["a", "a.b", "a.c"]`
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
/// Ties resolve to the lexicographically smallest key so output is stable.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    let mut candidates: Vec<(usize, &str)> = known
        .iter()
        .map(|k| (levenshtein(unknown, k), *k))
        .filter(|(dist, _)| *dist <= 3)
        .collect();
    candidates.sort_unstable();
    candidates.first().map(|(_, k)| (*k).to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// This does NOT fail on unknown keys; it only warns.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(), // parse errors are reported by serde later
    };

    let known = known_config_keys();
    let mut warnings = Vec::new();

    for key in walk_toml_keys(&value, "") {
        if !known.contains(key.as_str()) {
            let suggestion = suggest_correction(&key, &known);
            warnings.push(ValidationWarning {
                message: format!("Unknown config key '{key}'"),
                field: key,
                suggestion,
            });
        }
    }

    warnings
}

// ============================================================================
// Plausibility Range Validation
// ============================================================================

/// Check thresholds against ranges that make sense for curve-fit metrics.
///
/// Returns (errors, warnings). Errors are values no instrument can produce;
/// warnings are legal but unusual and worth a second look.
pub fn validate_ranges(config: &super::TriageConfig) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let t = &config.thresholds;

    // r2 thresholds are coefficients of determination
    for (field, value) in [
        ("thresholds.anomaly.poor_fit_r2", t.anomaly.poor_fit_r2),
        ("thresholds.positive.min_r2", t.positive.min_r2),
        ("thresholds.positive.strong_min_r2", t.positive.strong_min_r2),
        ("thresholds.negative.max_r2", t.negative.max_r2),
        ("thresholds.no_cq.good_curve_r2", t.no_cq.good_curve_r2),
        ("thresholds.edge.weak_positive_r2", t.edge.weak_positive_r2),
    ] {
        if !(0.0..=1.0).contains(&value) {
            errors.push(format!("{field} = {value} is outside the r2 range (0-1)"));
        }
    }

    // Cycle numbers: standard runs are 40-50 cycles
    for (field, value) in [
        ("thresholds.cq.min_valid_cycle", t.cq.min_valid_cycle),
        ("thresholds.positive.min_midpoint", t.positive.min_midpoint),
        ("thresholds.negative.max_midpoint", t.negative.max_midpoint),
    ] {
        if value < 0.0 {
            errors.push(format!("{field} = {value} cannot be a negative cycle number"));
        } else if value > 60.0 {
            warnings.push(ValidationWarning {
                field: field.to_string(),
                message: format!("{field} = {value:.1} is beyond a typical run length (60 cycles)"),
                suggestion: None,
            });
        }
    }

    if config.routing.confident_min < config.routing.low_confidence_floor {
        warnings.push(ValidationWarning {
            field: "routing.confident_min".to_string(),
            message: format!(
                "routing.confident_min = {:.2} is below routing.low_confidence_floor = {:.2}; \
                 the floor decides first",
                config.routing.confident_min, config.routing.low_confidence_floor
            ),
            suggestion: None,
        });
    }

    if config.merge.min_confidence_margin > 0.5 {
        warnings.push(ValidationWarning {
            field: "merge.min_confidence_margin".to_string(),
            message: format!(
                "merge.min_confidence_margin = {:.2} means the secondary classifier can almost never override",
                config.merge.min_confidence_margin
            ),
            suggestion: None,
        });
    }

    (errors, warnings)
}
