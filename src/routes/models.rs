use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::error::{ApiError, ApiResult};
use crate::storage::Collection;

fn default_list_limit() -> usize {
    200
}

fn default_summaries_limit() -> usize {
    1000
}

fn default_force_limit() -> usize {
    2000
}

fn default_true() -> bool {
    true
}

/// Parse a `kind` parameter into its collection
pub fn parse_kind(kind: &str) -> ApiResult<Collection> {
    kind.parse::<Collection>()
        .map_err(|_| ApiError::InvalidKind(kind.to_string()))
}

/// `filename` wins over `name`; one of them is required
pub fn pick_name(filename: Option<String>, name: Option<String>) -> ApiResult<String> {
    filename
        .filter(|n| !n.is_empty())
        .or(name.filter(|n| !n.is_empty()))
        .ok_or(ApiError::MissingName)
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    /// Whether the `/public` aliases are mounted
    pub public: bool,
    /// Whether mutating routes require `X-Api-Secret`
    pub auth: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct WriteRequest {
    /// `entries` or `summaries`
    pub kind: String,
    pub name: Option<String>,
    pub filename: Option<String>,
    pub content: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WriteResponse {
    pub ok: bool,
    pub path: String,
    pub kind: Collection,
    pub filename: String,
    /// Summary text (or a failure marker) when auto-summary ran
    pub summary: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReadQuery {
    pub kind: String,
    pub name: Option<String>,
    pub filename: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReadResponse {
    pub filename: String,
    pub content: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    pub kind: String,
    #[serde(default = "default_list_limit")]
    pub limit: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListResponse {
    pub files: Vec<String>,
}

/// Multipart form accepted by `/upload`
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    pub kind: String,
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    pub ok: bool,
    pub kind: Collection,
    pub filename: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SummariesQuery {
    #[serde(default = "default_summaries_limit")]
    pub limit: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SummariesResponse {
    pub summaries: Vec<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ForceSummarizeQuery {
    #[serde(default = "default_true")]
    pub all: bool,
    #[serde(default = "default_force_limit")]
    pub limit: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ForceSummarizeResponse {
    pub ok: bool,
    pub created: usize,
}
