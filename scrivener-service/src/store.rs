//! Artifact store seam and its S3 implementation.

use aws_sdk_s3::primitives::ByteStream;

use crate::error::StoreError;
use crate::textract::ExtractionApi;

/// The three artifact kinds a completed job can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Plain extracted line text.
    Text,
    /// Key/value form data as JSON.
    Form,
    /// Comma-delimited table text.
    Table,
}

impl ArtifactKind {
    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactKind::Text => "txt",
            ArtifactKind::Form => "json",
            ArtifactKind::Table => "csv",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ArtifactKind::Text => "text/plain",
            ArtifactKind::Form => "application/json",
            ArtifactKind::Table => "application/csv",
        }
    }
}

/// One output file derived from a completed job. Writes are keyed
/// overwrites, so repeating them on redelivery is safe.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub bucket: String,
    pub key: String,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Artifact {
    /// Build an artifact next to the source object: the source key minus
    /// its extension, plus `-<API>.<ext>` for the kind.
    pub fn for_source(
        bucket: impl Into<String>,
        source_key: &str,
        api: ExtractionApi,
        kind: ArtifactKind,
        body: Vec<u8>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            key: format!("{}-{}.{}", strip_extension(source_key), api, kind.extension()),
            content_type: kind.content_type(),
            body,
        }
    }
}

/// Strip the extension from the final path segment, leaving directory
/// segments (which may themselves contain dots) untouched.
fn strip_extension(key: &str) -> &str {
    let segment_start = key.rfind('/').map_or(0, |i| i + 1);
    match key.rfind('.') {
        Some(i) if i > segment_start => &key[..i],
        _ => key,
    }
}

/// Seam over the artifact store, mocked in handler tests.
pub trait ArtifactStore {
    async fn put(&self, artifact: &Artifact) -> Result<(), StoreError>;
}

/// Production store backed by `aws-sdk-s3`.
#[derive(Clone)]
pub struct S3ArtifactStore {
    client: aws_sdk_s3::Client,
}

impl S3ArtifactStore {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_s3::Client::new(config),
        }
    }
}

impl ArtifactStore for S3ArtifactStore {
    async fn put(&self, artifact: &Artifact) -> Result<(), StoreError> {
        self.client
            .put_object()
            .bucket(&artifact.bucket)
            .key(&artifact.key)
            .content_type(artifact.content_type)
            .body(ByteStream::from(artifact.body.clone()))
            .send()
            .await
            .map_err(|e| StoreError::Put {
                bucket: artifact.bucket.clone(),
                key: artifact.key.clone(),
                message: e.into_service_error().to_string(),
            })?;
        Ok(())
    }
}
