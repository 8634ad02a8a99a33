//! Job results: turn completion notifications into persisted artifacts.

use futures::future::try_join_all;
use tracing::{debug, error, info, warn};

use super::BatchSummary;
use crate::error::PipelineError;
use crate::events::{JobStatus, JobStatusEvent, JobStatusNotification, parse_job_status_event};
use crate::queue::{EventQueue, QueueMessage};
use crate::store::{Artifact, ArtifactKind, ArtifactStore};
use crate::textract::client::ExtractionClient;
use crate::textract::fetch::fetch_all_blocks;
use crate::textract::model::{Block, BlockMap};
use crate::textract::reconstruct::{extract_form_data, extract_tables, extract_text};

/// Consumes job-status messages: successful jobs get their block graph
/// fetched, reconstructed into up to three artifacts, and written; anything
/// else is acknowledged without output.
///
/// Reconstruction is pure and writes are keyed overwrites, so redelivering
/// a completion message reproduces identical artifacts.
pub struct ResultHandler<E, Q, S> {
    extraction: E,
    queue: Q,
    store: S,
}

impl<E, Q, S> ResultHandler<E, Q, S>
where
    E: ExtractionClient,
    Q: EventQueue,
    S: ArtifactStore,
{
    pub fn new(extraction: E, queue: Q, store: S) -> Self {
        Self {
            extraction,
            queue,
            store,
        }
    }

    pub fn queue(&self) -> &Q {
        &self.queue
    }

    /// Process a batch in delivery order; failed messages stay queued while
    /// siblings proceed.
    pub async fn handle_batch(&self, messages: &[QueueMessage]) -> BatchSummary {
        let mut summary = BatchSummary::default();
        for message in messages {
            match self.handle_message(message).await {
                Ok(()) => summary.handled += 1,
                Err(e) => {
                    warn!(
                        message_id = message.message_id.as_deref().unwrap_or("<none>"),
                        error = %e,
                        "Job-status message left for redelivery"
                    );
                    summary.failed += 1;
                }
            }
        }
        summary
    }

    async fn handle_message(&self, message: &QueueMessage) -> Result<(), PipelineError> {
        let event = match parse_job_status_event(&message.body) {
            Ok(event) => event,
            Err(e) => {
                error!(
                    message_id = message.message_id.as_deref().unwrap_or("<none>"),
                    error = %e,
                    "Undecodable job-status payload; dropping message"
                );
                self.queue.delete(message).await?;
                return Ok(());
            }
        };

        match event {
            JobStatusEvent::ConnectivityTest => {
                debug!("Skipping connectivity test on job-status queue");
            }
            JobStatusEvent::Notification(notification) => match notification.status {
                JobStatus::Succeeded => self.process_succeeded_job(&notification).await?,
                JobStatus::Failed | JobStatus::Error => {
                    // Not a pipeline error: the job is terminal, there is
                    // nothing to retry and nothing to write.
                    warn!(
                        job_id = %notification.job_id,
                        status = ?notification.status,
                        key = %notification.document_location.object_name,
                        "Extraction job did not succeed; no artifacts"
                    );
                }
            },
        }

        self.queue.delete(message).await?;
        Ok(())
    }

    async fn process_succeeded_job(
        &self,
        notification: &JobStatusNotification,
    ) -> Result<(), PipelineError> {
        debug!(
            job_id = %notification.job_id,
            job_tag = notification.job_tag.as_deref().unwrap_or("<none>"),
            completed_at = ?notification.timestamp(),
            "Processing completed extraction job"
        );
        let blocks =
            fetch_all_blocks(&self.extraction, notification.api, &notification.job_id).await?;
        let artifacts = build_artifacts(notification, &blocks)?;

        if artifacts.is_empty() {
            info!(
                job_id = %notification.job_id,
                blocks = blocks.len(),
                "Job completed but produced no artifact content"
            );
            return Ok(());
        }

        // Writes target distinct keys; issue them together and require all
        // of them before the message is acknowledged.
        try_join_all(artifacts.iter().map(|artifact| self.store.put(artifact))).await?;

        info!(
            job_id = %notification.job_id,
            key = %notification.document_location.object_name,
            artifacts = artifacts.len(),
            "Wrote extraction artifacts"
        );
        Ok(())
    }
}

/// Reconstruct a job's artifacts from its block graph. Pure; only kinds
/// with non-empty content yield an artifact.
fn build_artifacts(
    notification: &JobStatusNotification,
    blocks: &[Block],
) -> Result<Vec<Artifact>, serde_json::Error> {
    let map = BlockMap::new(blocks);
    let location = &notification.document_location;
    let mut artifacts = Vec::new();

    let lines = extract_text(blocks);
    if !lines.is_empty() {
        artifacts.push(Artifact::for_source(
            &location.bucket,
            &location.object_name,
            notification.api,
            ArtifactKind::Text,
            lines.join("\n").into_bytes(),
        ));
    }

    let form = extract_form_data(blocks, &map);
    if !form.is_empty() {
        artifacts.push(Artifact::for_source(
            &location.bucket,
            &location.object_name,
            notification.api,
            ArtifactKind::Form,
            serde_json::to_vec(&form)?,
        ));
    }

    if let Some(tables) = extract_tables(blocks, &map) {
        artifacts.push(Artifact::for_source(
            &location.bucket,
            &location.object_name,
            notification.api,
            ArtifactKind::Table,
            tables.into_bytes(),
        ));
    }

    Ok(artifacts)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::error::{ExtractionError, QueueError, StoreError};
    use crate::textract::ExtractionApi;
    use crate::textract::client::{ResultPage, StartJobRequest};
    use crate::textract::model::{BlockKind, EntityType, Relationship, RelationshipKind};

    struct RecordingQueue {
        deleted: Mutex<Vec<String>>,
    }

    impl RecordingQueue {
        fn new() -> Self {
            Self {
                deleted: Mutex::new(Vec::new()),
            }
        }

        fn deleted(&self) -> Vec<String> {
            self.deleted.lock().unwrap().clone()
        }
    }

    impl EventQueue for RecordingQueue {
        async fn receive(
            &self,
            _max_messages: i32,
            _wait_time_secs: i32,
        ) -> Result<Vec<QueueMessage>, QueueError> {
            unreachable!("handler tests inject batches directly")
        }

        async fn delete(&self, message: &QueueMessage) -> Result<(), QueueError> {
            self.deleted
                .lock()
                .unwrap()
                .push(message.receipt_handle.clone());
            Ok(())
        }
    }

    /// Serves the same fixed pages on every fetch; page cursors are the
    /// page's index rendered as a string.
    struct FixedResults {
        pages: Vec<ResultPage>,
        fail: bool,
    }

    impl FixedResults {
        fn single_page(blocks: Vec<Block>) -> Self {
            Self {
                pages: vec![ResultPage {
                    blocks,
                    next_token: None,
                }],
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                pages: Vec::new(),
                fail: true,
            }
        }
    }

    impl ExtractionClient for FixedResults {
        async fn start_job(
            &self,
            _api: ExtractionApi,
            _request: &StartJobRequest,
        ) -> Result<String, ExtractionError> {
            unreachable!("result handling never starts jobs")
        }

        async fn result_page(
            &self,
            _api: ExtractionApi,
            job_id: &str,
            next_token: Option<&str>,
        ) -> Result<ResultPage, ExtractionError> {
            if self.fail {
                return Err(ExtractionError::ResultPage {
                    job_id: job_id.to_string(),
                    message: "unavailable".to_string(),
                });
            }
            let index = next_token.map_or(0, |t| t.parse::<usize>().unwrap());
            Ok(self.pages[index].clone())
        }
    }

    struct RecordingStore {
        puts: Mutex<Vec<Artifact>>,
        fail: bool,
    }

    impl RecordingStore {
        fn new() -> Self {
            Self {
                puts: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                puts: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        fn puts(&self) -> Vec<Artifact> {
            self.puts.lock().unwrap().clone()
        }
    }

    impl ArtifactStore for RecordingStore {
        async fn put(&self, artifact: &Artifact) -> Result<(), StoreError> {
            if self.fail {
                return Err(StoreError::Put {
                    bucket: artifact.bucket.clone(),
                    key: artifact.key.clone(),
                    message: "denied".to_string(),
                });
            }
            self.puts.lock().unwrap().push(artifact.clone());
            Ok(())
        }
    }

    fn status_message(receipt: &str, status: &str) -> QueueMessage {
        QueueMessage {
            message_id: Some(format!("id-{receipt}")),
            receipt_handle: receipt.to_string(),
            body: serde_json::json!({
                "JobId": "job-1",
                "Status": status,
                "API": "StartDocumentAnalysis",
                "JobTag": "contracts/lease.pdf",
                "DocumentLocation": {
                    "S3ObjectName": "contracts/lease.pdf",
                    "S3Bucket": "uploads"
                }
            })
            .to_string(),
        }
    }

    fn line(id: &str, text: &str) -> Block {
        let mut b = Block::new(id, BlockKind::Line);
        b.text = Some(text.to_string());
        b
    }

    fn word(id: &str, text: &str) -> Block {
        let mut b = Block::new(id, BlockKind::Word);
        b.text = Some(text.to_string());
        b
    }

    /// Lines, one form field, and a one-cell table.
    fn full_result_blocks() -> Vec<Block> {
        let mut key = Block::new("k", BlockKind::KeyValueSet);
        key.entity_types.push(EntityType::Key);
        key.relationships.push(Relationship {
            kind: RelationshipKind::Child,
            ids: vec!["kw".to_string()],
        });
        key.relationships.push(Relationship {
            kind: RelationshipKind::Value,
            ids: vec!["v".to_string()],
        });
        let mut value = Block::new("v", BlockKind::KeyValueSet);
        value.entity_types.push(EntityType::Value);
        value.relationships.push(Relationship {
            kind: RelationshipKind::Child,
            ids: vec!["vw".to_string()],
        });

        let mut table = Block::new("t", BlockKind::Table);
        table.relationships.push(Relationship {
            kind: RelationshipKind::Child,
            ids: vec!["c".to_string()],
        });
        let mut cell = Block::new("c", BlockKind::Cell);
        cell.row_index = Some(1);
        cell.column_index = Some(1);
        cell.relationships.push(Relationship {
            kind: RelationshipKind::Child,
            ids: vec!["cw".to_string()],
        });

        vec![
            line("l1", "Lease Agreement"),
            line("l2", "Page 1"),
            key,
            value,
            table,
            cell,
            word("kw", "Name"),
            word("vw", "Jane"),
            word("cw", "Rent"),
        ]
    }

    fn handler(
        extraction: FixedResults,
        store: RecordingStore,
    ) -> ResultHandler<FixedResults, RecordingQueue, RecordingStore> {
        ResultHandler::new(extraction, RecordingQueue::new(), store)
    }

    #[tokio::test]
    async fn test_succeeded_job_writes_all_three_artifacts() {
        let handler = handler(
            FixedResults::single_page(full_result_blocks()),
            RecordingStore::new(),
        );

        let summary = handler
            .handle_batch(&[status_message("r1", "SUCCEEDED")])
            .await;
        assert_eq!(summary, BatchSummary { handled: 1, failed: 0 });
        assert_eq!(handler.queue().deleted(), vec!["r1"]);

        let puts = handler.store.puts();
        let keys: Vec<&str> = puts.iter().map(|a| a.key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "contracts/lease-StartDocumentAnalysis.txt",
                "contracts/lease-StartDocumentAnalysis.json",
                "contracts/lease-StartDocumentAnalysis.csv",
            ]
        );

        assert_eq!(puts[0].body, b"Lease Agreement\nPage 1".to_vec());
        assert_eq!(puts[1].body, br#"{"Name":"Jane"}"#.to_vec());
        let table = String::from_utf8(puts[2].body.clone()).unwrap();
        assert!(table.contains("Table: Table_1"));
        assert!(table.contains("Rent\n"));
    }

    #[tokio::test]
    async fn test_failed_status_acknowledged_without_artifacts() {
        let handler = handler(FixedResults::single_page(Vec::new()), RecordingStore::new());

        let summary = handler.handle_batch(&[status_message("r1", "FAILED")]).await;
        assert_eq!(summary, BatchSummary { handled: 1, failed: 0 });
        assert_eq!(handler.queue().deleted(), vec!["r1"]);
        assert!(handler.store.puts().is_empty());
    }

    #[tokio::test]
    async fn test_empty_results_acknowledged_without_artifacts() {
        let handler = handler(FixedResults::single_page(Vec::new()), RecordingStore::new());

        let summary = handler
            .handle_batch(&[status_message("r1", "SUCCEEDED")])
            .await;
        assert_eq!(summary, BatchSummary { handled: 1, failed: 0 });
        assert_eq!(handler.queue().deleted(), vec!["r1"]);
        assert!(handler.store.puts().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_leaves_message_unacknowledged() {
        let handler = handler(FixedResults::failing(), RecordingStore::new());

        let summary = handler
            .handle_batch(&[status_message("r1", "SUCCEEDED")])
            .await;
        assert_eq!(summary, BatchSummary { handled: 0, failed: 1 });
        assert!(handler.queue().deleted().is_empty());
    }

    #[tokio::test]
    async fn test_write_failure_leaves_message_unacknowledged() {
        let handler = handler(
            FixedResults::single_page(full_result_blocks()),
            RecordingStore::failing(),
        );

        let summary = handler
            .handle_batch(&[status_message("r1", "SUCCEEDED")])
            .await;
        assert_eq!(summary, BatchSummary { handled: 0, failed: 1 });
        assert!(handler.queue().deleted().is_empty());
    }

    #[tokio::test]
    async fn test_redelivery_reproduces_identical_artifacts() {
        let handler = handler(
            FixedResults::single_page(full_result_blocks()),
            RecordingStore::new(),
        );

        handler.handle_batch(&[status_message("r1", "SUCCEEDED")]).await;
        handler.handle_batch(&[status_message("r1", "SUCCEEDED")]).await;

        let puts = handler.store.puts();
        assert_eq!(puts.len(), 6);
        for (first, second) in puts[..3].iter().zip(&puts[3..]) {
            assert_eq!(first.key, second.key);
            assert_eq!(first.body, second.body);
        }
    }

    #[tokio::test]
    async fn test_poison_payload_is_dropped() {
        let handler = handler(FixedResults::single_page(Vec::new()), RecordingStore::new());

        let message = QueueMessage {
            message_id: None,
            receipt_handle: "r1".to_string(),
            body: "{\"JobId\": 42}".to_string(),
        };
        let summary = handler.handle_batch(&[message]).await;

        assert_eq!(summary, BatchSummary { handled: 1, failed: 0 });
        assert_eq!(handler.queue().deleted(), vec!["r1"]);
    }
}
