//! qpcr-triage: Tiered qPCR well classification
//!
//! Deterministic rules settle most wells; a learned secondary classifier is
//! consulted only for the edge cases; expert reviews feed back as ground
//! truth for accuracy tracking.
//!
//! ## Architecture
//!
//! - **Rule Classifier**: threshold rules with anomaly detection first
//! - **Edge-Case Router**: picks the wells worth a secondary opinion
//! - **Secondary tier**: async classifier client plus the merge policy
//! - **Pipeline**: batch orchestration with bounded concurrency
//! - **Feedback**: correction grouping, accuracy, per-well review state

pub mod classifier;
pub mod config;
pub mod feedback;
pub mod pipeline;
pub mod routing;
pub mod secondary;
pub mod storage;
pub mod types;

// Re-export configuration
pub use config::TriageConfig;

// Re-export commonly used types
pub use types::{
    AccuracyAggregate, Classification, ClassificationVerdict, CqValue, CurveSamples, EdgeCaseReason,
    ExpertDecisionRecord, ReviewState, StoredClassification, WellMetrics, WellRecord,
};

// Re-export tiers
pub use classifier::{classify, RuleClassifier};
pub use routing::{EdgeCaseRouter, RoutingStats};
pub use secondary::{
    DisabledSecondaryClassifier, HttpSecondaryClassifier, MergePolicy, SecondaryClassifier, SecondaryVerdict,
};
pub use pipeline::{TriageBatch, TriageOutcome, TriagePipeline};

// Re-export feedback and storage
pub use feedback::{classification_group, is_correction, ClassificationGroup, CorrectionTracker, TriageReport};
pub use storage::{BatchRecord, DecisionStore, InMemoryDecisionStore, SledDecisionStore, StorageError, VerdictRecord};
