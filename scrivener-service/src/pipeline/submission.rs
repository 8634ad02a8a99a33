//! Job submission: turn uploaded-object events into extraction jobs.

use tracing::{debug, error, info, warn};

use super::BatchSummary;
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::events::{UploadEvent, parse_upload_event};
use crate::queue::{EventQueue, QueueMessage};
use crate::textract::client::{ExtractionClient, StartJobRequest};

/// Consumes upload-queue messages and starts one extraction job per object
/// record, attaching the notification channel so the provider reports
/// completion asynchronously.
///
/// Submission is not idempotent: a message redelivered after a partial
/// failure resubmits jobs for records that already started. That is an
/// accepted consequence of at-least-once delivery.
pub struct SubmissionHandler<E, Q> {
    pipeline: PipelineConfig,
    extraction: E,
    queue: Q,
}

impl<E, Q> SubmissionHandler<E, Q>
where
    E: ExtractionClient,
    Q: EventQueue,
{
    pub fn new(pipeline: PipelineConfig, extraction: E, queue: Q) -> Self {
        Self {
            pipeline,
            extraction,
            queue,
        }
    }

    pub fn queue(&self) -> &Q {
        &self.queue
    }

    /// Process a batch in delivery order. A message that fails stays on the
    /// queue; its siblings still get their turn.
    pub async fn handle_batch(&self, messages: &[QueueMessage]) -> BatchSummary {
        let mut summary = BatchSummary::default();
        for message in messages {
            match self.handle_message(message).await {
                Ok(()) => summary.handled += 1,
                Err(e) => {
                    warn!(
                        message_id = message.message_id.as_deref().unwrap_or("<none>"),
                        error = %e,
                        "Upload message left for redelivery"
                    );
                    summary.failed += 1;
                }
            }
        }
        summary
    }

    async fn handle_message(&self, message: &QueueMessage) -> Result<(), PipelineError> {
        let event = match parse_upload_event(&message.body) {
            Ok(event) => event,
            Err(e) => {
                // Poison: redelivering an undecodable body can never
                // succeed, so drop it instead of letting it loop.
                error!(
                    message_id = message.message_id.as_deref().unwrap_or("<none>"),
                    error = %e,
                    "Undecodable upload event; dropping message"
                );
                self.queue.delete(message).await?;
                return Ok(());
            }
        };

        match event {
            UploadEvent::ConnectivityTest => {
                debug!("Skipping s3:TestEvent on upload queue");
                self.queue.delete(message).await?;
            }
            UploadEvent::ObjectCreated(records) => {
                for record in &records {
                    let request = StartJobRequest {
                        bucket: record.bucket.clone(),
                        key: record.key.clone(),
                        job_tag: record.key.clone(),
                        notification_role_arn: self.pipeline.notification_role_arn.clone(),
                        notification_topic_arn: self.pipeline.notification_topic_arn.clone(),
                        feature_types: self.pipeline.feature_types(),
                    };
                    let job_id = self.extraction.start_job(self.pipeline.api, &request).await?;
                    info!(
                        job_id = %job_id,
                        key = %record.key,
                        api = %self.pipeline.api,
                        "Started extraction job"
                    );
                }
                // Every record submitted; only now is the message done.
                self.queue.delete(message).await?;
            }
        }
        Ok(())
    }
}
