//! Background workers polling the two pipeline queues.
//!
//! One spawned task per stage, started once at startup. Each iteration
//! long-polls its queue for a batch and hands it to the stage's handler;
//! receive failures back off briefly instead of spinning.

use tracing::{debug, error, info, warn};

use super::results::ResultHandler;
use super::submission::SubmissionHandler;
use crate::config::WorkerConfig;
use crate::queue::{EventQueue, SqsEventQueue};
use crate::store::S3ArtifactStore;
use crate::textract::client::TextractClient;

/// Start the job-submission worker. Should be called once on startup.
pub fn start_submission_worker(
    handler: SubmissionHandler<TextractClient, SqsEventQueue>,
    config: WorkerConfig,
) {
    tokio::spawn(async move {
        info!(queue_url = %handler.queue().queue_url(), "Job submission worker started");
        loop {
            match handler
                .queue()
                .receive(config.batch_size, config.wait_time_secs)
                .await
            {
                Ok(messages) if messages.is_empty() => {}
                Ok(messages) => {
                    let summary = handler.handle_batch(&messages).await;
                    if summary.failed > 0 {
                        warn!(
                            handled = summary.handled,
                            failed = summary.failed,
                            "Upload batch finished with failures"
                        );
                    } else {
                        debug!(handled = summary.handled, "Upload batch finished");
                    }
                }
                Err(e) => {
                    error!(error = %e, "Failed to receive upload events");
                    tokio::time::sleep(config.error_backoff()).await;
                }
            }
        }
    });
}

/// Start the job-result worker. Should be called once on startup.
pub fn start_result_worker(
    handler: ResultHandler<TextractClient, SqsEventQueue, S3ArtifactStore>,
    config: WorkerConfig,
) {
    tokio::spawn(async move {
        info!(queue_url = %handler.queue().queue_url(), "Job result worker started");
        loop {
            match handler
                .queue()
                .receive(config.batch_size, config.wait_time_secs)
                .await
            {
                Ok(messages) if messages.is_empty() => {}
                Ok(messages) => {
                    let summary = handler.handle_batch(&messages).await;
                    if summary.failed > 0 {
                        warn!(
                            handled = summary.handled,
                            failed = summary.failed,
                            "Job-status batch finished with failures"
                        );
                    } else {
                        debug!(handled = summary.handled, "Job-status batch finished");
                    }
                }
                Err(e) => {
                    error!(error = %e, "Failed to receive job-status events");
                    tokio::time::sleep(config.error_backoff()).await;
                }
            }
        }
    });
}
