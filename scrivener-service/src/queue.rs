//! Event queue seam and its SQS implementation.
//!
//! Delivery is at-least-once and unordered across distinct source objects; a
//! message only stops being redelivered once it is explicitly deleted, so
//! the handlers delete only after a message's work has fully succeeded.

use crate::error::QueueError;

/// One received queue message.
#[derive(Debug, Clone)]
pub struct QueueMessage {
    pub message_id: Option<String>,
    /// Per-delivery handle required to delete the message.
    pub receipt_handle: String,
    pub body: String,
}

/// Seam over one SQS queue, mocked in handler tests.
pub trait EventQueue {
    /// Receive up to `max_messages`, long-polling for `wait_time_secs`.
    async fn receive(
        &self,
        max_messages: i32,
        wait_time_secs: i32,
    ) -> Result<Vec<QueueMessage>, QueueError>;

    /// Acknowledge a message so the broker stops redelivering it.
    async fn delete(&self, message: &QueueMessage) -> Result<(), QueueError>;
}

/// Production queue backed by `aws-sdk-sqs`.
#[derive(Clone)]
pub struct SqsEventQueue {
    client: aws_sdk_sqs::Client,
    queue_url: String,
}

impl SqsEventQueue {
    pub fn new(client: aws_sdk_sqs::Client, queue_url: impl Into<String>) -> Self {
        Self {
            client,
            queue_url: queue_url.into(),
        }
    }

    pub fn queue_url(&self) -> &str {
        &self.queue_url
    }
}

impl EventQueue for SqsEventQueue {
    async fn receive(
        &self,
        max_messages: i32,
        wait_time_secs: i32,
    ) -> Result<Vec<QueueMessage>, QueueError> {
        let output = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(max_messages)
            .wait_time_seconds(wait_time_secs)
            .send()
            .await
            .map_err(|e| QueueError::Receive {
                queue_url: self.queue_url.clone(),
                message: e.into_service_error().to_string(),
            })?;

        let messages = output
            .messages
            .unwrap_or_default()
            .into_iter()
            .filter_map(|m| {
                // A message without a receipt handle could never be deleted;
                // skip it and let the broker redeliver a complete one.
                Some(QueueMessage {
                    message_id: m.message_id,
                    receipt_handle: m.receipt_handle?,
                    body: m.body.unwrap_or_default(),
                })
            })
            .collect();
        Ok(messages)
    }

    async fn delete(&self, message: &QueueMessage) -> Result<(), QueueError> {
        self.client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(&message.receipt_handle)
            .send()
            .await
            .map_err(|e| QueueError::Delete {
                queue_url: self.queue_url.clone(),
                message: e.into_service_error().to_string(),
            })?;
        Ok(())
    }
}
