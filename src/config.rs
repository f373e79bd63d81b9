//! Pipeline settings.
//!
//! Defaults mirror the production deployment; the binary overrides them from
//! command-line flags or environment variables.

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_TABLE: &str = "payment-events";
pub const DEFAULT_QUEUE: &str = "payment-events-queue";
pub const DEFAULT_INGRESS_SOURCE: &str = "payment-events-processor-ReceiveMessage";
pub const DEFAULT_CONTINUATION_SOURCE: &str = "payment-events-processor-PublishMessage";
pub const DEFAULT_EXTERNAL_LATENCY_MS: u64 = 2000;

/// What to do when a record in a batch fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Abort the batch on the first failure and surface it to the caller.
    #[default]
    FailFast,
    /// Record the failure in the batch result and continue with the next record.
    BestEffort,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Durable store table receiving the audit trail.
    pub table: String,
    /// Queue the async flow publishes to.
    pub queue_destination: String,
    pub failure_policy: FailurePolicy,
    /// Overall budget for one batch. `None` means unbounded.
    pub deadline: Option<Duration>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            table: DEFAULT_TABLE.to_string(),
            queue_destination: DEFAULT_QUEUE.to_string(),
            failure_policy: FailurePolicy::default(),
            deadline: None,
        }
    }
}

impl PipelineConfig {
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}
