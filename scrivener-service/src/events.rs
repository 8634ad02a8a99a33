//! Queue message payloads: S3 object-created events on the upload queue and
//! Textract job-status notifications on the result queue.
//!
//! The job-status queue is subscribed to the notification topic with raw
//! message delivery, so bodies arrive as bare provider notifications with no
//! SNS envelope. Both queues can also receive an `s3:TestEvent` connectivity
//! payload, which the handlers acknowledge without doing any work.

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

use crate::textract::ExtractionApi;

/// One `s3://bucket/key` reference from an object-created event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRecord {
    pub bucket: String,
    pub key: String,
}

/// Decoded upload-queue message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadEvent {
    /// `s3:TestEvent`, emitted when bucket notifications are configured.
    ConnectivityTest,
    ObjectCreated(Vec<ObjectRecord>),
}

/// Decoded job-status-queue message body.
#[derive(Debug, Clone)]
pub enum JobStatusEvent {
    ConnectivityTest,
    Notification(JobStatusNotification),
}

/// Terminal status reported for an extraction job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Succeeded,
    Failed,
    Error,
}

/// A Textract job-status notification, as published to the topic.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct JobStatusNotification {
    pub job_id: String,
    pub status: JobStatus,
    #[serde(rename = "API")]
    pub api: ExtractionApi,
    /// Set by the submission handler to the source object key.
    #[serde(default)]
    pub job_tag: Option<String>,
    /// Epoch milliseconds.
    #[serde(default)]
    pub timestamp: Option<i64>,
    pub document_location: NotificationDocumentLocation,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationDocumentLocation {
    #[serde(rename = "S3Bucket")]
    pub bucket: String,
    #[serde(rename = "S3ObjectName")]
    pub object_name: String,
}

impl JobStatusNotification {
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp?).single()
    }
}

#[derive(Debug, Deserialize)]
struct ConnectivityTestPayload {
    #[serde(rename = "Event")]
    event: String,
}

#[derive(Debug, Deserialize)]
struct S3EventDocument {
    #[serde(rename = "Records", default)]
    records: Vec<S3EventRecord>,
}

#[derive(Debug, Deserialize)]
struct S3EventRecord {
    s3: S3Entity,
}

#[derive(Debug, Deserialize)]
struct S3Entity {
    bucket: S3BucketRef,
    object: S3ObjectRef,
}

#[derive(Debug, Deserialize)]
struct S3BucketRef {
    name: String,
}

#[derive(Debug, Deserialize)]
struct S3ObjectRef {
    key: String,
}

fn is_connectivity_test(body: &str) -> bool {
    serde_json::from_str::<ConnectivityTestPayload>(body)
        .map(|p| p.event == "s3:TestEvent")
        .unwrap_or(false)
}

/// Decode an upload-queue message body.
pub fn parse_upload_event(body: &str) -> Result<UploadEvent, serde_json::Error> {
    if is_connectivity_test(body) {
        return Ok(UploadEvent::ConnectivityTest);
    }
    let event: S3EventDocument = serde_json::from_str(body)?;
    let records = event
        .records
        .into_iter()
        .map(|r| ObjectRecord {
            bucket: r.s3.bucket.name,
            key: r.s3.object.key,
        })
        .collect();
    Ok(UploadEvent::ObjectCreated(records))
}

/// Decode a job-status-queue message body.
pub fn parse_job_status_event(body: &str) -> Result<JobStatusEvent, serde_json::Error> {
    if is_connectivity_test(body) {
        return Ok(JobStatusEvent::ConnectivityTest);
    }
    Ok(JobStatusEvent::Notification(serde_json::from_str(body)?))
}
