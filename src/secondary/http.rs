//! HTTP client for a secondary classifier exposed as a service
//!
//! POSTs `{curve, metrics, assay_target}` as JSON to the configured endpoint
//! and expects `{classification, confidence, method}` back.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use super::{SecondaryClassifier, SecondaryError, SecondaryVerdict};
use crate::types::{CurveSamples, WellMetrics};

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    curve: &'a CurveSamples,
    metrics: &'a WellMetrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    assay_target: Option<&'a str>,
}

#[derive(Clone)]
pub struct HttpSecondaryClassifier {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpSecondaryClassifier {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, SecondaryError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn check_verdict(verdict: SecondaryVerdict) -> Result<SecondaryVerdict, SecondaryError> {
    if !verdict.confidence.is_finite() || !(0.0..=1.0).contains(&verdict.confidence) {
        return Err(SecondaryError::InvalidResponse(format!(
            "confidence {} outside [0, 1]",
            verdict.confidence
        )));
    }
    if verdict.classification.trim().is_empty() {
        return Err(SecondaryError::InvalidResponse("empty classification".to_string()));
    }
    Ok(verdict)
}

#[async_trait]
impl SecondaryClassifier for HttpSecondaryClassifier {
    async fn classify(
        &self,
        curve: &CurveSamples,
        metrics: &WellMetrics,
        assay_target: Option<&str>,
    ) -> Result<SecondaryVerdict, SecondaryError> {
        let resp = self
            .http
            .post(&self.endpoint)
            .json(&ClassifyRequest {
                curve,
                metrics,
                assay_target,
            })
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(SecondaryError::Server(resp.status()));
        }

        let verdict: SecondaryVerdict = resp
            .json()
            .await
            .map_err(|e| SecondaryError::InvalidResponse(e.to_string()))?;
        check_verdict(verdict)
    }

    fn name(&self) -> &str {
        "http"
    }
}
