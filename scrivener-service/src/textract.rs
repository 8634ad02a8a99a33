//! Textract integration: job client, block graph model, paginated result
//! fetch, and document reconstruction.

pub mod client;
pub mod fetch;
pub mod model;
pub mod reconstruct;

use serde::{Deserialize, Serialize};

/// Which asynchronous Textract operation the pipeline drives.
///
/// Configuration uses the snake_case names; job-status notifications carry
/// the provider operation names, accepted as aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractionApi {
    /// `StartDocumentTextDetection` / `GetDocumentTextDetection`.
    #[serde(rename = "text_detection", alias = "StartDocumentTextDetection")]
    TextDetection,
    /// `StartDocumentAnalysis` / `GetDocumentAnalysis` (tables and forms).
    #[serde(rename = "analysis", alias = "StartDocumentAnalysis")]
    Analysis,
}

impl ExtractionApi {
    /// The provider's start-operation name; also used in artifact keys.
    pub fn wire_name(&self) -> &'static str {
        match self {
            ExtractionApi::TextDetection => "StartDocumentTextDetection",
            ExtractionApi::Analysis => "StartDocumentAnalysis",
        }
    }
}

impl std::fmt::Display for ExtractionApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}
