//! Extraction client seam and its AWS Textract implementation.

use aws_sdk_textract::types as sdk;

use super::ExtractionApi;
use super::model::{
    Block, BlockKind, EntityType, Relationship, RelationshipKind, SelectionStatus,
};
use crate::error::ExtractionError;

/// Everything needed to start one extraction job for one uploaded object.
#[derive(Debug, Clone)]
pub struct StartJobRequest {
    pub bucket: String,
    pub key: String,
    /// Job tag carried through to the status notification; the pipeline uses
    /// the object key.
    pub job_tag: String,
    pub notification_role_arn: String,
    pub notification_topic_arn: String,
    /// Analysis feature types (`TABLES`, `FORMS`, ...); ignored for text
    /// detection.
    pub feature_types: Vec<String>,
}

/// One page of a job's results.
#[derive(Debug, Clone)]
pub struct ResultPage {
    pub blocks: Vec<Block>,
    /// Continuation cursor; absent on the final page.
    pub next_token: Option<String>,
}

/// Seam over the asynchronous extraction service, mocked in handler tests.
pub trait ExtractionClient {
    /// Start a job and return the provider's job id.
    async fn start_job(
        &self,
        api: ExtractionApi,
        request: &StartJobRequest,
    ) -> Result<String, ExtractionError>;

    /// Fetch one page of results for a job.
    async fn result_page(
        &self,
        api: ExtractionApi,
        job_id: &str,
        next_token: Option<&str>,
    ) -> Result<ResultPage, ExtractionError>;
}

/// Production client backed by `aws-sdk-textract`.
#[derive(Clone)]
pub struct TextractClient {
    client: aws_sdk_textract::Client,
}

impl TextractClient {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_textract::Client::new(config),
        }
    }
}

impl ExtractionClient for TextractClient {
    async fn start_job(
        &self,
        api: ExtractionApi,
        request: &StartJobRequest,
    ) -> Result<String, ExtractionError> {
        let location = sdk::DocumentLocation::builder()
            .s3_object(
                sdk::S3Object::builder()
                    .bucket(&request.bucket)
                    .name(&request.key)
                    .build(),
            )
            .build();
        let channel = sdk::NotificationChannel::builder()
            .sns_topic_arn(&request.notification_topic_arn)
            .role_arn(&request.notification_role_arn)
            .build()
            .map_err(|e| ExtractionError::InvalidParameters {
                message: e.to_string(),
            })?;

        let start_error = |message: String| ExtractionError::StartJob {
            api,
            bucket: request.bucket.clone(),
            key: request.key.clone(),
            message,
        };

        let job_id = match api {
            ExtractionApi::TextDetection => self
                .client
                .start_document_text_detection()
                .document_location(location)
                .job_tag(&request.job_tag)
                .notification_channel(channel)
                .send()
                .await
                .map_err(|e| start_error(e.into_service_error().to_string()))?
                .job_id,
            ExtractionApi::Analysis => {
                let mut call = self
                    .client
                    .start_document_analysis()
                    .document_location(location)
                    .job_tag(&request.job_tag)
                    .notification_channel(channel);
                for feature in &request.feature_types {
                    call = call.feature_types(sdk::FeatureType::from(feature.as_str()));
                }
                call.send()
                    .await
                    .map_err(|e| start_error(e.into_service_error().to_string()))?
                    .job_id
            }
        };

        job_id.ok_or(ExtractionError::MissingJobId)
    }

    async fn result_page(
        &self,
        api: ExtractionApi,
        job_id: &str,
        next_token: Option<&str>,
    ) -> Result<ResultPage, ExtractionError> {
        let page_error = |message: String| ExtractionError::ResultPage {
            job_id: job_id.to_string(),
            message,
        };

        match api {
            ExtractionApi::TextDetection => {
                let mut call = self.client.get_document_text_detection().job_id(job_id);
                if let Some(token) = next_token {
                    call = call.next_token(token);
                }
                let output = call
                    .send()
                    .await
                    .map_err(|e| page_error(e.into_service_error().to_string()))?;
                Ok(ResultPage {
                    blocks: output.blocks().iter().map(block_from_sdk).collect(),
                    next_token: output.next_token,
                })
            }
            ExtractionApi::Analysis => {
                let mut call = self.client.get_document_analysis().job_id(job_id);
                if let Some(token) = next_token {
                    call = call.next_token(token);
                }
                let output = call
                    .send()
                    .await
                    .map_err(|e| page_error(e.into_service_error().to_string()))?;
                Ok(ResultPage {
                    blocks: output.blocks().iter().map(block_from_sdk).collect(),
                    next_token: output.next_token,
                })
            }
        }
    }
}

/// Convert an SDK block into the pipeline's model. Total: unrecognized
/// block, entity, and relationship types land in `Other` and are skipped by
/// the reconstructors.
fn block_from_sdk(block: &sdk::Block) -> Block {
    let kind = match block.block_type() {
        Some(sdk::BlockType::Line) => BlockKind::Line,
        Some(sdk::BlockType::Word) => BlockKind::Word,
        Some(sdk::BlockType::SelectionElement) => BlockKind::SelectionElement,
        Some(sdk::BlockType::KeyValueSet) => BlockKind::KeyValueSet,
        Some(sdk::BlockType::Table) => BlockKind::Table,
        Some(sdk::BlockType::Cell) => BlockKind::Cell,
        Some(other) => BlockKind::Other(other.as_str().to_string()),
        None => BlockKind::Other(String::new()),
    };

    let mut out = Block::new(block.id().unwrap_or_default(), kind);
    out.text = block.text().map(str::to_string);
    out.selection_status = match block.selection_status() {
        Some(sdk::SelectionStatus::Selected) => Some(SelectionStatus::Selected),
        Some(sdk::SelectionStatus::NotSelected) => Some(SelectionStatus::NotSelected),
        _ => None,
    };
    out.entity_types = block
        .entity_types()
        .iter()
        .filter_map(|e| match e {
            sdk::EntityType::Key => Some(EntityType::Key),
            sdk::EntityType::Value => Some(EntityType::Value),
            _ => None,
        })
        .collect();
    out.row_index = block.row_index().and_then(|i| u32::try_from(i).ok());
    out.column_index = block.column_index().and_then(|i| u32::try_from(i).ok());
    out.relationships = block
        .relationships()
        .iter()
        .map(|r| Relationship {
            kind: match r.r#type() {
                Some(sdk::RelationshipType::Child) => RelationshipKind::Child,
                Some(sdk::RelationshipType::Value) => RelationshipKind::Value,
                Some(other) => RelationshipKind::Other(other.as_str().to_string()),
                None => RelationshipKind::Other(String::new()),
            },
            ids: r.ids().to_vec(),
        })
        .collect();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_from_sdk_maps_known_kinds() {
        let block = sdk::Block::builder()
            .id("cell-1")
            .block_type(sdk::BlockType::Cell)
            .row_index(2)
            .column_index(3)
            .relationships(
                sdk::Relationship::builder()
                    .r#type(sdk::RelationshipType::Child)
                    .ids("word-1")
                    .build(),
            )
            .build();

        let converted = block_from_sdk(&block);
        assert_eq!(converted.id, "cell-1");
        assert_eq!(converted.kind, BlockKind::Cell);
        assert_eq!(converted.row_index, Some(2));
        assert_eq!(converted.column_index, Some(3));
        assert_eq!(converted.relationships.len(), 1);
        assert_eq!(converted.relationships[0].kind, RelationshipKind::Child);
        assert_eq!(converted.relationships[0].ids, vec!["word-1".to_string()]);
    }

    #[test]
    fn test_block_from_sdk_keeps_unknown_kinds_as_other() {
        let block = sdk::Block::builder()
            .id("page-1")
            .block_type(sdk::BlockType::Page)
            .build();

        let converted = block_from_sdk(&block);
        assert_eq!(converted.kind, BlockKind::Other("PAGE".to_string()));
    }
}
