//! Secondary classifier interface
//!
//! The learned model that reviews edge cases lives outside this crate. It is
//! consumed through [`SecondaryClassifier`]; any failure is reported as a
//! [`SecondaryError`] and handled by the caller as "no second opinion".

mod http;
pub mod merge;

pub use http::HttpSecondaryClassifier;
pub use merge::MergePolicy;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::{CurveSamples, WellMetrics};

/// Opinion returned by a secondary classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecondaryVerdict {
    /// Free-text label; only labels that parse to a known classification can be adopted
    pub classification: String,
    pub confidence: f64,
    /// Model identifier reported by the classifier
    #[serde(default)]
    pub method: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SecondaryError {
    #[error("secondary classifier unavailable: {0}")]
    Unavailable(String),
    #[error("secondary classifier timed out after {0} ms")]
    Timeout(u64),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned status {0}")]
    Server(reqwest::StatusCode),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Learned classifier consulted for routed wells.
#[async_trait]
pub trait SecondaryClassifier: Send + Sync {
    async fn classify(
        &self,
        curve: &CurveSamples,
        metrics: &WellMetrics,
        assay_target: Option<&str>,
    ) -> Result<SecondaryVerdict, SecondaryError>;

    /// Name for logging
    fn name(&self) -> &str;
}

/// Stand-in when no secondary classifier is configured. Every call fails, so
/// routed wells keep their rule verdict marked `unavailable`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledSecondaryClassifier;

#[async_trait]
impl SecondaryClassifier for DisabledSecondaryClassifier {
    async fn classify(
        &self,
        _curve: &CurveSamples,
        _metrics: &WellMetrics,
        _assay_target: Option<&str>,
    ) -> Result<SecondaryVerdict, SecondaryError> {
        Err(SecondaryError::Unavailable("no secondary classifier configured".to_string()))
    }

    fn name(&self) -> &str {
        "disabled"
    }
}
