//! Service configuration.
//!
//! Loaded once at startup from an optional `config` file plus
//! `SCRIVENER`-prefixed environment variables; a missing required value
//! aborts before any message is touched.

use serde::Deserialize;

use crate::textract::ExtractionApi;

#[derive(Debug, Clone, Deserialize)]
pub struct StaticConfig {
    pub pipeline: PipelineConfig,
    pub queues: QueueConfig,
    #[serde(default = "default_worker")]
    pub worker: WorkerConfig,
}

/// Extraction job parameters shared by every submission.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Which Textract operation to run for uploaded documents.
    #[serde(default = "default_api")]
    pub api: ExtractionApi,

    /// Role the provider assumes to publish job-status notifications.
    pub notification_role_arn: String,

    /// Topic the provider publishes job-status notifications to.
    pub notification_topic_arn: String,

    /// Comma-separated analysis feature types; ignored for text detection.
    #[serde(default = "default_feature_types")]
    pub feature_types: String,
}

impl PipelineConfig {
    /// Feature types as individual tokens, empty entries dropped.
    pub fn feature_types(&self) -> Vec<String> {
        self.feature_types
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// The two SQS queues the pipeline consumes.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    /// Receives S3 object-created events for uploaded documents.
    pub upload_queue_url: String,

    /// Receives job-status notifications after jobs complete.
    pub job_status_queue_url: String,
}

/// Polling behavior for both worker loops.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerConfig {
    /// Messages per receive call (SQS caps this at 10).
    #[serde(default = "default_batch_size")]
    pub batch_size: i32,

    /// Long-poll wait per receive call, in seconds.
    #[serde(default = "default_wait_time_secs")]
    pub wait_time_secs: i32,

    /// Sleep after a failed receive before polling again, in seconds.
    #[serde(default = "default_error_backoff_secs")]
    pub error_backoff_secs: u64,
}

impl WorkerConfig {
    pub fn error_backoff(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.error_backoff_secs)
    }
}

// ==================== Default Value Functions ====================

fn default_api() -> ExtractionApi {
    ExtractionApi::TextDetection
}

fn default_feature_types() -> String {
    "TABLES,FORMS".to_string()
}

fn default_worker() -> WorkerConfig {
    WorkerConfig {
        batch_size: default_batch_size(),
        wait_time_secs: default_wait_time_secs(),
        error_backoff_secs: default_error_backoff_secs(),
    }
}

fn default_batch_size() -> i32 {
    10
}

fn default_wait_time_secs() -> i32 {
    20
}

fn default_error_backoff_secs() -> u64 {
    5
}
