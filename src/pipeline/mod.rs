//! Triage pipeline: rules → router → secondary → merge
//!
//! ```text
//! WellRecord[] ──► RuleClassifier (rayon, blocking pool) ──► EdgeCaseRouter
//!                                               │
//!                     confident ◄───────────────┤
//!                                               ▼ routed
//!                           SecondaryClassifier (Semaphore-bounded tasks,
//!                                                per-call timeout)
//!                                               │
//!                                               ▼
//!                                          MergePolicy
//! ```
//!
//! The batch never aborts: a failed or timed-out secondary call keeps the
//! rule verdict with `secondary_review = unavailable`, and an input line that
//! could not be read becomes an INDETERMINATE verdict held for review.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::classifier::RuleClassifier;
use crate::config::TriageConfig;
use crate::feedback::RecentCorrections;
use crate::routing::{EdgeCaseRouter, RoutingStats};
use crate::secondary::merge::mark_unavailable;
use crate::secondary::{MergePolicy, SecondaryClassifier, SecondaryError, SecondaryVerdict};
use crate::types::{ClassificationVerdict, WellRecord};

/// Final result for one well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageOutcome {
    pub well_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assay_target: Option<String>,
    /// Verdict from the rule tier (or expert short-circuit)
    pub rule_verdict: ClassificationVerdict,
    /// Verdict after routing and merge
    pub final_verdict: ClassificationVerdict,
    /// Whether the well was sent to the secondary classifier
    pub routed: bool,
}

/// One processed batch, outcomes in input order.
#[derive(Debug, Clone)]
pub struct TriageBatch {
    pub outcomes: Vec<TriageOutcome>,
    pub stats: RoutingStats,
}

impl TriageBatch {
    /// Routing counts per uppercased assay target. Wells without a target
    /// only count towards the batch total.
    pub fn stats_by_target(&self) -> BTreeMap<String, RoutingStats> {
        let mut by_target: BTreeMap<String, RoutingStats> = BTreeMap::new();
        for outcome in &self.outcomes {
            let Some(target) = outcome.assay_target.as_deref() else {
                continue;
            };
            let entry = by_target.entry(target.to_ascii_uppercase()).or_default();
            let one = if outcome.routed {
                RoutingStats::new(1, 0)
            } else {
                RoutingStats::new(0, 1)
            };
            *entry = entry.combine(one);
        }
        by_target
    }
}

pub struct TriagePipeline {
    classifier: RuleClassifier,
    router: EdgeCaseRouter,
    merge: MergePolicy,
    secondary: Arc<dyn SecondaryClassifier>,
    max_concurrency: usize,
    timeout: Duration,
}

impl TriagePipeline {
    pub fn new(config: &TriageConfig, secondary: Arc<dyn SecondaryClassifier>) -> Self {
        Self {
            classifier: RuleClassifier::new(config.thresholds.clone()),
            router: EdgeCaseRouter::new(config.routing.clone()),
            merge: MergePolicy::new(config.merge.min_confidence_margin),
            secondary,
            max_concurrency: config.secondary.max_concurrency.max(1),
            timeout: Duration::from_millis(config.secondary.timeout_ms),
        }
    }

    /// Build from the process-wide configuration.
    pub fn from_config(secondary: Arc<dyn SecondaryClassifier>) -> Self {
        Self::new(crate::config::get(), secondary)
    }

    /// Classify a batch end to end.
    ///
    /// `recent` short-circuits wells with an unexpired expert correction;
    /// `now` is the unix time used for its expiry check.
    pub async fn run(&self, records: &[WellRecord], recent: Option<&RecentCorrections>, now: u64) -> TriageBatch {
        let rule_verdicts = {
            let classifier = self.classifier.clone();
            let owned = records.to_vec();
            let recent_owned = recent.cloned();
            let handle = tokio::task::spawn_blocking(move || {
                classify_records(&classifier, &owned, recent_owned.as_ref(), now)
            });
            match handle.await {
                Ok(verdicts) => verdicts,
                Err(e) => {
                    warn!("Rule tier worker failed, classifying inline: {}", e);
                    classify_records(&self.classifier, records, recent, now)
                }
            }
        };

        let partition = self.router.partition(&rule_verdicts);
        let stats = partition.stats();
        info!(
            wells = stats.total,
            routed = stats.routed,
            confident = stats.confident,
            "Rule tier complete"
        );

        let mut final_verdicts: Vec<ClassificationVerdict> = rule_verdicts.clone();
        let mut routed = vec![false; records.len()];

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut handles = Vec::with_capacity(partition.edge_cases.len());

        for &idx in &partition.edge_cases {
            routed[idx] = true;
            let record = records[idx].clone();
            let secondary = Arc::clone(&self.secondary);
            let sem = semaphore.clone();
            let timeout = self.timeout;

            handles.push((
                idx,
                tokio::spawn(async move {
                    let _permit = match sem.acquire().await {
                        Ok(permit) => permit,
                        Err(e) => {
                            return Err(SecondaryError::Unavailable(format!("concurrency limiter closed: {e}")));
                        }
                    };
                    call_secondary(secondary.as_ref(), &record, timeout).await
                }),
            ));
        }

        let mut unavailable = 0usize;
        for (idx, handle) in handles {
            let well_id = &records[idx].well_id;
            let rule = &rule_verdicts[idx];
            let result = handle
                .await
                .map_err(|e| SecondaryError::Unavailable(format!("task failed: {e}")))
                .and_then(|r| r);

            final_verdicts[idx] = match result {
                Ok(opinion) => {
                    let merged = self.merge.merge(rule, &opinion);
                    debug!(
                        well_id = %well_id,
                        rule = %rule.classification,
                        secondary = %opinion.classification,
                        confidence = opinion.confidence,
                        review = ?merged.secondary_review,
                        "Secondary opinion merged"
                    );
                    merged
                }
                Err(e) => {
                    unavailable += 1;
                    warn!(well_id = %well_id, classifier = %self.secondary.name(), "Secondary review unavailable: {}", e);
                    mark_unavailable(rule)
                }
            };
        }

        if unavailable > 0 {
            warn!(unavailable, routed = stats.routed, "Some routed wells kept their rule verdict");
        }

        let outcomes = records
            .iter()
            .zip(rule_verdicts)
            .zip(final_verdicts)
            .zip(routed)
            .map(|(((record, rule_verdict), final_verdict), routed)| TriageOutcome {
                well_id: record.well_id.clone(),
                assay_target: record.assay_target.clone(),
                rule_verdict,
                final_verdict,
                routed,
            })
            .collect();

        TriageBatch { outcomes, stats }
    }
}

/// Rule tier over a whole batch. CPU-bound; run off the async workers.
fn classify_records(
    classifier: &RuleClassifier,
    records: &[WellRecord],
    recent: Option<&RecentCorrections>,
    now: u64,
) -> Vec<ClassificationVerdict> {
    records
        .par_iter()
        .map(|r| {
            if let Some(err) = &r.parse_error {
                return ClassificationVerdict::unreadable(err);
            }
            match recent {
                Some(lookup) => classifier.classify_with_feedback(&r.well_id, &r.metrics, lookup, now),
                None => classifier.classify(&r.metrics),
            }
        })
        .collect()
}

async fn call_secondary(
    secondary: &dyn SecondaryClassifier,
    record: &WellRecord,
    timeout: Duration,
) -> Result<SecondaryVerdict, SecondaryError> {
    let call = secondary.classify(&record.curve, &record.metrics, record.assay_target.as_deref());
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(SecondaryError::Timeout(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX))),
    }
}
