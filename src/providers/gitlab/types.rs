use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A pipeline row from `GET /projects/:id/pipelines`.
///
/// Only the fields the report needs are kept. `status` is optional so that a
/// malformed row surfaces as a validation error at the record boundary
/// instead of failing the whole page decode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitLabPipeline {
    /// Numeric pipeline ID
    pub id: u64,
    /// Final pipeline status (e.g. "success", "failed")
    pub status: Option<String>,
    /// Git reference that triggered the pipeline
    #[serde(rename = "ref")]
    pub ref_: Option<String>,
    /// When the pipeline was created
    pub created_at: DateTime<Utc>,
    /// Direct link to the pipeline's web page
    pub web_url: Option<String>,
}

/// One entry from `GET /projects/:id/pipelines/:pipeline_id/variables`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitLabVariable {
    pub key: String,
    pub value: String,
}
