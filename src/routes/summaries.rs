use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use tracing::debug;

use super::auth::ApiSecret;
use super::error::ApiResult;
use super::models::{
    ForceSummarizeQuery, ForceSummarizeResponse, SummariesQuery, SummariesResponse,
};
use crate::{commands::force_summarize::force_summarize, storage::Collection, AppState};

#[utoipa::path(
    get,
    path = "/get_all_summaries",
    tag = "summaries",
    params(SummariesQuery),
    responses(
        (status = 200, description = "Contents of every readable summary", body = SummariesResponse)
    )
)]
pub async fn get_all_summaries(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SummariesQuery>,
) -> ApiResult<Json<SummariesResponse>> {
    let names = state.store.list(Collection::Summaries, query.limit).await?;

    let mut summaries = Vec::with_capacity(names.len());
    for name in names {
        match state.store.read_text(Collection::Summaries, &name).await {
            Ok(content) => summaries.push(content),
            Err(e) => debug!("Skipping unreadable summary '{}': {}", name, e),
        }
    }

    Ok(Json(SummariesResponse { summaries }))
}

#[utoipa::path(
    post,
    path = "/api/v1/force-summarize",
    tag = "summaries",
    params(
        ForceSummarizeQuery,
        ("X-Api-Secret" = Option<String>, Header, description = "Required when an API secret is configured")
    ),
    responses(
        (status = 200, description = "Number of summaries created", body = ForceSummarizeResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn force_summarize_all(
    State(state): State<Arc<AppState>>,
    _secret: ApiSecret,
    Query(query): Query<ForceSummarizeQuery>,
) -> ApiResult<Json<ForceSummarizeResponse>> {
    if !query.all {
        return Ok(Json(ForceSummarizeResponse { ok: true, created: 0 }));
    }

    let created = force_summarize(&state.store, state.summarizer.as_ref(), query.limit).await?;
    Ok(Json(ForceSummarizeResponse { ok: true, created }))
}
