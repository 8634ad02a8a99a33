//! Error types for the extraction pipeline.
//!
//! External calls return explicit results so the handlers can decide, per
//! message, whether to acknowledge or leave it for broker redelivery. AWS
//! SDK failures are captured as the service error's rendered message along
//! with enough context to identify the call.

use thiserror::Error;

use crate::textract::ExtractionApi;

/// Event queue (SQS) errors.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("failed to receive from queue {queue_url}: {message}")]
    Receive { queue_url: String, message: String },

    #[error("failed to delete message from queue {queue_url}: {message}")]
    Delete { queue_url: String, message: String },
}

/// Extraction service (Textract) errors.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("failed to start {api} job for s3://{bucket}/{key}: {message}")]
    StartJob {
        api: ExtractionApi,
        bucket: String,
        key: String,
        message: String,
    },

    #[error("job started but the provider returned no job id")]
    MissingJobId,

    #[error("failed to fetch result page for job {job_id}: {message}")]
    ResultPage { job_id: String, message: String },

    #[error("invalid job parameters: {message}")]
    InvalidParameters { message: String },
}

/// Artifact store (S3) errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to write artifact s3://{bucket}/{key}: {message}")]
    Put {
        bucket: String,
        key: String,
        message: String,
    },
}

/// Anything that can fail while processing one queue message.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("queue operation failed")]
    Queue(#[from] QueueError),

    #[error("extraction service call failed")]
    Extraction(#[from] ExtractionError),

    #[error("artifact write failed")]
    Store(#[from] StoreError),

    #[error("undecodable message payload")]
    Payload(#[from] serde_json::Error),
}
