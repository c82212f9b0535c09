//! Recent expert corrections, keyed by well
//!
//! A caller-owned, time-bounded lookup handed to
//! [`RuleClassifier::classify_with_feedback`](crate::classifier::RuleClassifier::classify_with_feedback).
//! Nothing here is global: whoever runs a batch decides which corrections
//! count as "recent" and when to prune.

use std::collections::HashMap;

use crate::types::ExpertDecisionRecord;

/// Most recent expert label for one well.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentCorrection {
    pub label: String,
    pub timestamp: u64,
}

/// Well id → most recent expert label, valid for `ttl_secs` after the review.
#[derive(Debug, Clone, Default)]
pub struct RecentCorrections {
    ttl_secs: u64,
    entries: HashMap<String, RecentCorrection>,
}

impl RecentCorrections {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            ttl_secs,
            entries: HashMap::new(),
        }
    }

    /// Seed from stored decisions; the latest decision per well wins.
    pub fn from_records<'a>(
        ttl_secs: u64,
        records: impl IntoIterator<Item = &'a ExpertDecisionRecord>,
    ) -> Self {
        let mut recent = Self::new(ttl_secs);
        for record in records {
            recent.record(record);
        }
        recent
    }

    /// Remember a decision unless a later one for the same well is already held.
    pub fn record(&mut self, record: &ExpertDecisionRecord) {
        if record.expert_correction.trim().is_empty() {
            return;
        }
        let candidate = RecentCorrection {
            label: record.expert_correction.clone(),
            timestamp: record.timestamp,
        };
        self.entries
            .entry(record.well_id.clone())
            .and_modify(|existing| {
                if candidate.timestamp >= existing.timestamp {
                    *existing = candidate.clone();
                }
            })
            .or_insert(candidate);
    }

    /// Unexpired correction for `well_id` as of `now` (unix seconds).
    pub fn lookup(&self, well_id: &str, now: u64) -> Option<&RecentCorrection> {
        self.entries
            .get(well_id)
            .filter(|c| now.saturating_sub(c.timestamp) <= self.ttl_secs)
    }

    /// Drop expired entries; returns how many were removed.
    pub fn prune(&mut self, now: u64) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl_secs;
        self.entries
            .retain(|_, c| now.saturating_sub(c.timestamp) <= ttl);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
