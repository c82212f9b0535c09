//! Shared domain types for the triage pipeline.

mod feedback;
mod metrics;
mod verdict;

pub use feedback::*;
pub use metrics::*;
pub use verdict::*;
