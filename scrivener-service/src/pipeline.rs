//! The two queue-driven stages of the extraction pipeline:
//! - submission: upload events in, extraction jobs out
//! - results: job-status notifications in, artifacts out
//!
//! Both stages process each batch sequentially and acknowledge a message
//! only once its work fully succeeded; everything else is left for broker
//! redelivery.

pub mod results;
pub mod submission;
pub mod workers;

/// Outcome of one batch: a failed message stayed on the queue for
/// redelivery, it never aborts its siblings.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub handled: usize,
    pub failed: usize,
}
