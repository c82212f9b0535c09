//! Triage Configuration Module
//!
//! Classifier thresholds, routing policy and secondary-classifier settings
//! loaded from TOML.
//!
//! ## Loading Order
//!
//! 1. `QPCR_TRIAGE_CONFIG` environment variable (path to TOML file)
//! 2. `triage_config.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! ```ignore
//! // In main():
//! config::init(TriageConfig::load());
//!
//! // Anywhere in the codebase:
//! let margin = config::get().merge.min_confidence_margin;
//! ```
//!
//! Library entry points that must stay pure take their thresholds as
//! arguments; the global is a convenience for the binary and for
//! `TriagePipeline::from_config()`.

mod triage_config;
pub mod validation;

pub use triage_config::*;

use std::sync::OnceLock;

/// Global triage configuration, initialized once at startup.
static TRIAGE_CONFIG: OnceLock<TriageConfig> = OnceLock::new();

/// Initialize the global configuration. Later calls are ignored with a warning.
pub fn init(config: TriageConfig) {
    if TRIAGE_CONFIG.set(config).is_err() {
        tracing::warn!("config::init() called more than once, ignoring");
    }
}

/// Get the global configuration, or the built-in defaults if `init()` was
/// never called.
pub fn get() -> &'static TriageConfig {
    static DEFAULTS: OnceLock<TriageConfig> = OnceLock::new();
    TRIAGE_CONFIG
        .get()
        .unwrap_or_else(|| DEFAULTS.get_or_init(TriageConfig::default))
}
