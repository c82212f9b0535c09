//! qpcr-triage - tiered qPCR well classification
//!
//! # Usage
//!
//! ```bash
//! # Classify a plate (JSON lines, one well per line)
//! qpcr-triage classify --input plate.jsonl
//!
//! # With a secondary classifier service for edge cases
//! qpcr-triage classify --input plate.jsonl --secondary-url http://localhost:9000/classify
//!
//! # Record an expert review (original label and metrics default to the stored verdict)
//! qpcr-triage review --well-id A7 --target FAM --correction NEGATIVE --reviewed-at 1735693200
//!
//! # Or spell them out
//! qpcr-triage review --well-id A7 --target FAM --original WEAK_POSITIVE --correction NEGATIVE \
//!     --reviewed-at 1735693200 --feature amplitude=812.5 --feature r2=0.78
//!
//! # Accuracy report
//! qpcr-triage report --target FAM --since 1735689600
//! ```
//!
//! # Environment Variables
//!
//! - `QPCR_TRIAGE_CONFIG`: Path to triage_config.toml
//! - `RUST_LOG`: Logging level (default: info)

use std::collections::BTreeMap;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{info, warn};

use qpcr_triage::config::{self, TriageConfig};
use qpcr_triage::feedback::{CorrectionTracker, DecisionFilter};
use qpcr_triage::{
    DisabledSecondaryClassifier, HttpSecondaryClassifier, SecondaryClassifier, SledDecisionStore, TriagePipeline,
    WellRecord,
};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "qpcr-triage")]
#[command(about = "Tiered qPCR well classification with expert-feedback accuracy tracking")]
#[command(version)]
struct CliArgs {
    /// Config file (overrides QPCR_TRIAGE_CONFIG and ./triage_config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Decision store directory (overrides [storage] data_dir)
    #[arg(long, global = true, value_name = "DIR")]
    store: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Classify wells from JSON lines and print one result per line
    Classify {
        /// Input file; stdin when omitted
        #[arg(long, value_name = "FILE")]
        input: Option<PathBuf>,

        /// Secondary classifier endpoint (overrides [secondary] endpoint)
        #[arg(long, value_name = "URL")]
        secondary_url: Option<String>,
    },

    /// Record an expert review decision
    Review {
        #[arg(long)]
        well_id: String,

        /// Assay target (pathogen / channel)
        #[arg(long)]
        target: String,

        /// Label the system produced; defaults to the stored verdict
        #[arg(long)]
        original: Option<String>,

        /// Label the expert assigned
        #[arg(long)]
        correction: String,

        /// When the review was made (unix seconds). Resubmitting with the
        /// same value is a no-op.
        #[arg(long, value_name = "SECS")]
        reviewed_at: u64,

        /// Metric the expert saw, as key=value (repeatable); defaults to the
        /// metrics stored with the verdict
        #[arg(long = "feature", value_name = "KEY=VALUE")]
        features: Vec<String>,
    },

    /// Print an accuracy report as JSON
    Report {
        #[arg(long)]
        target: Option<String>,

        /// Inclusive lower bound (unix seconds)
        #[arg(long)]
        since: Option<u64>,

        /// Inclusive upper bound (unix seconds)
        #[arg(long)]
        until: Option<u64>,
    },
}

// ============================================================================
// Helpers
// ============================================================================

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn unix_now() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0)
}

/// Parse `key=value`; the value is read as JSON when possible, else kept as text.
fn parse_feature(raw: &str) -> Result<(String, serde_json::Value)> {
    let Some((key, value)) = raw.split_once('=') else {
        bail!("feature {raw:?} is not KEY=VALUE");
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("feature {raw:?} has an empty key");
    }
    let value = value.trim();
    let parsed = serde_json::from_str(value).unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((key.to_string(), parsed))
}

fn read_records(input: Option<&PathBuf>) -> Result<Vec<WellRecord>> {
    let reader: Box<dyn BufRead> = match input {
        Some(path) => {
            let file = std::fs::File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(std::io::stdin())),
    };

    let mut records = Vec::new();
    for (n, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read input")?;
        if line.trim().is_empty() {
            continue;
        }
        let record = WellRecord::from_json_line(&line, n + 1);
        if let Some(err) = &record.parse_error {
            warn!(line = n + 1, well_id = %record.well_id, "Unreadable well record: {}", err);
        }
        records.push(record);
    }
    Ok(records)
}

fn open_tracker(cfg: &TriageConfig, store: Option<&PathBuf>) -> Result<CorrectionTracker> {
    let path = store.unwrap_or(&cfg.storage.data_dir);
    let store = SledDecisionStore::open(path)
        .with_context(|| format!("Failed to open decision store at {}", path.display()))?;
    CorrectionTracker::new(Arc::new(store), cfg.feedback.recent_correction_ttl_secs)
        .context("Failed to load expert decisions")
}

// ============================================================================
// Subcommands
// ============================================================================

async fn run_classify(
    cfg: &TriageConfig,
    tracker: &CorrectionTracker,
    input: Option<&PathBuf>,
    secondary_url: Option<String>,
) -> Result<()> {
    let records = read_records(input)?;
    info!(wells = records.len(), lab = %cfg.lab.name, "Classifying batch");

    let endpoint = secondary_url.or_else(|| cfg.secondary.endpoint.clone());
    let secondary: Arc<dyn SecondaryClassifier> = match endpoint {
        Some(url) => {
            info!(endpoint = %url, "Secondary classifier enabled");
            Arc::new(
                HttpSecondaryClassifier::new(&url, Duration::from_millis(cfg.secondary.timeout_ms))
                    .context("Failed to build secondary classifier client")?,
            )
        }
        None => {
            warn!("No secondary classifier configured; edge cases keep their rule verdict");
            Arc::new(DisabledSecondaryClassifier)
        }
    };

    let now = unix_now();
    let recent = tracker.recent_corrections(now)?;
    let pipeline = TriagePipeline::from_config(secondary);
    let batch = pipeline.run(&records, Some(&recent), now).await;

    for (record, outcome) in records.iter().zip(&batch.outcomes) {
        let features = if record.parse_error.is_some() {
            BTreeMap::new()
        } else {
            record.metrics.feature_map()
        };
        tracker
            .open_reanalysis(&outcome.well_id, &outcome.final_verdict, features, now)
            .with_context(|| format!("Failed to store verdict for {}", outcome.well_id))?;
        println!("{}", serde_json::to_string(outcome)?);
    }

    tracker
        .record_batch(batch.stats, batch.stats_by_target(), now)
        .context("Failed to store batch routing stats")?;
    eprintln!("{}", serde_json::to_string(&batch.stats)?);
    info!(
        routed = batch.stats.routed,
        confident = batch.stats.confident,
        routed_fraction = batch.stats.routed_fraction,
        "Batch complete"
    );
    Ok(())
}

struct ReviewArgs {
    well_id: String,
    target: String,
    original: Option<String>,
    correction: String,
    reviewed_at: u64,
    features: Vec<String>,
}

fn run_review(tracker: &CorrectionTracker, args: ReviewArgs) -> Result<()> {
    let stored = tracker
        .stored_verdict(&args.well_id)
        .context("Failed to read stored verdict")?;

    let original = match (args.original, &stored) {
        (Some(label), _) => label,
        (None, Some(record)) => record.verdict.class.as_str().to_string(),
        (None, None) => bail!("no stored verdict for {}; pass --original", args.well_id),
    };

    let mut features_used = args
        .features
        .iter()
        .map(String::as_str)
        .map(parse_feature)
        .collect::<Result<BTreeMap<_, _>>>()?;
    if features_used.is_empty() {
        if let Some(record) = stored {
            features_used = record.features;
        }
    }

    let receipt = tracker
        .submit_review(
            &args.well_id,
            &args.target,
            &original,
            &args.correction,
            features_used,
            args.reviewed_at,
        )
        .context("Failed to record review")?;
    if receipt.stale {
        warn!(well_id = %args.well_id, "Review recorded but superseded by a newer decision or analysis");
    }
    println!("{}", serde_json::to_string(&receipt)?);
    Ok(())
}

fn run_report(
    cfg: &TriageConfig,
    tracker: &CorrectionTracker,
    target: Option<String>,
    since: Option<u64>,
    until: Option<u64>,
) -> Result<()> {
    let filter = DecisionFilter {
        assay_target: target,
        since,
        until,
    };
    let report = tracker.report(&cfg.lab, &filter).context("Failed to build report")?;
    info!(
        decisions = report.global.total_decisions,
        corrections = report.corrections(),
        pending = report.pending_reviews.len(),
        "Report built"
    );
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(args.json_logs);

    let cfg = match &args.config {
        Some(path) => TriageConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => TriageConfig::load(),
    };
    config::init(cfg);
    let cfg = config::get();

    let tracker = open_tracker(cfg, args.store.as_ref())?;

    match args.command {
        SubCommand::Classify { input, secondary_url } => {
            run_classify(cfg, &tracker, input.as_ref(), secondary_url).await
        }
        SubCommand::Review {
            well_id,
            target,
            original,
            correction,
            reviewed_at,
            features,
        } => run_review(
            &tracker,
            ReviewArgs {
                well_id,
                target,
                original,
                correction,
                reviewed_at,
                features,
            },
        ),
        SubCommand::Report { target, since, until } => run_report(cfg, &tracker, target, since, until),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_feature_values() {
        assert_eq!(parse_feature("amplitude=812.5").unwrap(), ("amplitude".to_string(), serde_json::json!(812.5)));
        assert_eq!(parse_feature("cq=N/A").unwrap(), ("cq".to_string(), serde_json::json!("N/A")));
        assert!(parse_feature("novalue").is_err());
        assert!(parse_feature("=3").is_err());
    }

    #[test]
    fn test_cli_parses_review() {
        let args = CliArgs::try_parse_from([
            "qpcr-triage",
            "review",
            "--well-id",
            "A7",
            "--target",
            "FAM",
            "--original",
            "WEAK_POSITIVE",
            "--correction",
            "NEGATIVE",
            "--reviewed-at",
            "1735693200",
            "--feature",
            "r2=0.78",
        ])
        .unwrap();
        assert!(matches!(
            args.command,
            SubCommand::Review { ref features, reviewed_at: 1_735_693_200, .. } if features.len() == 1
        ));
    }

    #[test]
    fn test_review_requires_timestamp() {
        let parsed = CliArgs::try_parse_from([
            "qpcr-triage",
            "review",
            "--well-id",
            "A7",
            "--target",
            "FAM",
            "--correction",
            "NEGATIVE",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_review_defaults_to_stored_verdict() {
        use qpcr_triage::types::{Classification, ClassificationVerdict};
        use qpcr_triage::InMemoryDecisionStore;

        let tracker = CorrectionTracker::new(Arc::new(InMemoryDecisionStore::new()), 3_600).unwrap();
        let verdict = ClassificationVerdict::confident(Classification::WeakPositive, 0.8, "late rise");
        let mut features = BTreeMap::new();
        features.insert("amplitude".to_string(), serde_json::json!(812.5));
        tracker.open_reanalysis("A7", &verdict, features, 100).unwrap();

        run_review(
            &tracker,
            ReviewArgs {
                well_id: "A7".to_string(),
                target: "FAM".to_string(),
                original: None,
                correction: "NEGATIVE".to_string(),
                reviewed_at: 200,
                features: Vec::new(),
            },
        )
        .unwrap();

        let agg = tracker.accuracy(&DecisionFilter::all()).unwrap();
        assert_eq!(agg.total_decisions, 1);
        assert_eq!(agg.corrections, 1);
        assert_eq!(tracker.current_label("A7").unwrap().as_deref(), Some("NEGATIVE"));

        let missing = ReviewArgs {
            well_id: "Z9".to_string(),
            target: "FAM".to_string(),
            original: None,
            correction: "NEGATIVE".to_string(),
            reviewed_at: 200,
            features: Vec::new(),
        };
        assert!(run_review(&tracker, missing).is_err());
    }
}
