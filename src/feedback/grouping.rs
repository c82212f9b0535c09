//! Classification groups and correction semantics
//!
//! Accuracy is judged on coarse groups, not label text: moving a well from
//! POSITIVE to STRONG_POSITIVE refines the call and is not an error, while
//! moving it from WEAK_POSITIVE to NEGATIVE is.
//!
//! Grouping is total. Labels the classifier never produces (legacy "REDO",
//! free text from older records) are accepted on purpose so the accuracy
//! computation can never fail on historical data; anything unrecognised lands
//! in `Unknown`, which makes any transition involving it a correction.

use serde::{Deserialize, Serialize};

use crate::types::Classification;

/// Coarse bucket used to decide whether a relabel is a true correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClassificationGroup {
    Positive,
    Redo,
    Negative,
    Unknown,
}

impl ClassificationGroup {
    /// Group for a classifier label.
    pub fn of(classification: Classification) -> Self {
        match classification {
            Classification::StrongPositive | Classification::Positive | Classification::WeakPositive => {
                ClassificationGroup::Positive
            }
            Classification::Indeterminate | Classification::Suspicious => ClassificationGroup::Redo,
            Classification::Negative => ClassificationGroup::Negative,
        }
    }
}

impl std::fmt::Display for ClassificationGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClassificationGroup::Positive => write!(f, "POSITIVE"),
            ClassificationGroup::Redo => write!(f, "REDO"),
            ClassificationGroup::Negative => write!(f, "NEGATIVE"),
            ClassificationGroup::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Group for a free-text label. Case-insensitive; never fails.
pub fn classification_group(label: &str) -> ClassificationGroup {
    let label = label.trim();
    if label.eq_ignore_ascii_case("REDO") {
        return ClassificationGroup::Redo;
    }
    Classification::parse(label).map_or(ClassificationGroup::Unknown, ClassificationGroup::of)
}

/// True when an expert relabel crosses groups. Blank labels are never corrections.
pub fn is_correction(original: &str, corrected: &str) -> bool {
    if original.trim().is_empty() || corrected.trim().is_empty() {
        return false;
    }
    classification_group(original) != classification_group(corrected)
}
