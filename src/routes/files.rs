use std::sync::Arc;

use axum::{
    extract::{Multipart, Query, State},
    Json,
};
use tracing::{debug, info};

use super::auth::ApiSecret;
use super::error::{ApiError, ApiResult};
use super::models::{
    parse_kind, pick_name, ListQuery, ListResponse, ReadQuery, ReadResponse, UploadForm, UploadResponse,
    WriteRequest, WriteResponse,
};
use crate::{
    services::{pdf_extractor, summarizer::summarize_and_store},
    storage::Collection,
    AppState,
};

fn auto_summary_applies(state: &AppState, collection: Collection) -> bool {
    state.config.auto_summary_on_write && collection == Collection::Entries
}

/// Uploads keep their bytes; this is only the text handed to the summarizer
async fn upload_text(state: &AppState, filename: &str, data: &[u8]) -> String {
    if pdf_extractor::is_pdf(filename, data) {
        return pdf_extractor::extract_text(data, state.config.pdf_max_pages).await;
    }
    match std::str::from_utf8(data) {
        Ok(text) => text.to_string(),
        // latin-1: every byte maps to the code point of the same value
        Err(_) => data.iter().map(|&b| b as char).collect(),
    }
}

#[utoipa::path(
    post,
    path = "/write-file",
    tag = "files",
    request_body = WriteRequest,
    params(
        ("X-Api-Secret" = Option<String>, Header, description = "Required when an API secret is configured")
    ),
    responses(
        (status = 200, description = "Document stored", body = WriteResponse),
        (status = 400, description = "Invalid kind or file name"),
        (status = 401, description = "Unauthorized"),
        (status = 422, description = "Neither 'filename' nor 'name' given"),
        (status = 500, description = "Storage failure")
    )
)]
pub async fn write_file(
    State(state): State<Arc<AppState>>,
    _secret: ApiSecret,
    Json(req): Json<WriteRequest>,
) -> ApiResult<Json<WriteResponse>> {
    let collection = parse_kind(&req.kind)?;
    let filename = pick_name(req.filename, req.name)?;

    let receipt = state
        .store
        .write(collection, &filename, req.content.as_bytes())
        .await?;

    let summary = if auto_summary_applies(&state, collection) {
        Some(summarize_and_store(&state.store, state.summarizer.as_ref(), &filename, &req.content).await)
    } else {
        None
    };

    Ok(Json(WriteResponse {
        ok: true,
        path: receipt.path,
        kind: collection,
        filename,
        summary,
        error: None,
    }))
}

#[utoipa::path(
    get,
    path = "/read-file",
    tag = "files",
    params(ReadQuery),
    responses(
        (status = 200, description = "Document content", body = ReadResponse),
        (status = 400, description = "Invalid kind or file name"),
        (status = 404, description = "File not found"),
        (status = 422, description = "Neither 'filename' nor 'name' given")
    )
)]
pub async fn read_file(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReadQuery>,
) -> ApiResult<Json<ReadResponse>> {
    let collection = parse_kind(&query.kind)?;
    let filename = pick_name(query.filename, query.name)?;

    let content = state.store.read_text(collection, &filename).await?;
    Ok(Json(ReadResponse { filename, content }))
}

#[utoipa::path(
    get,
    path = "/list-files",
    tag = "files",
    params(ListQuery),
    responses(
        (status = 200, description = "Sorted file names", body = ListResponse),
        (status = 400, description = "Invalid kind")
    )
)]
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<ListResponse>> {
    let collection = parse_kind(&query.kind)?;
    let files = state.store.list(collection, query.limit).await?;
    Ok(Json(ListResponse { files }))
}

#[utoipa::path(
    post,
    path = "/upload",
    tag = "files",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    params(
        ("X-Api-Secret" = Option<String>, Header, description = "Required when an API secret is configured")
    ),
    responses(
        (status = 200, description = "File stored", body = UploadResponse),
        (status = 400, description = "Invalid form, kind or file name"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Storage failure")
    )
)]
pub async fn upload(
    State(state): State<Arc<AppState>>,
    _secret: ApiSecret,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let mut kind: Option<String> = None;
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidInput(format!("Invalid multipart body: {}", e)))?
    {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("kind") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::InvalidInput(format!("Invalid 'kind' field: {}", e)))?;
                kind = Some(value);
            }
            Some("file") => {
                let filename = field.file_name().map(str::to_string).unwrap_or_default();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::InvalidInput(format!("Invalid 'file' field: {}", e)))?;
                file = Some((filename, data.to_vec()));
            }
            other => debug!("Ignoring multipart field {:?}", other),
        }
    }

    let kind = kind.ok_or_else(|| ApiError::InvalidInput("Missing 'kind' field".to_string()))?;
    let collection = parse_kind(&kind)?;
    let (filename, data) =
        file.ok_or_else(|| ApiError::InvalidInput("Missing 'file' field".to_string()))?;
    if filename.is_empty() {
        return Err(ApiError::MissingName);
    }

    state.store.write(collection, &filename, &data).await?;
    info!("Uploaded {}/{} ({} bytes)", collection, filename, data.len());

    if auto_summary_applies(&state, collection) {
        let text = upload_text(&state, &filename, &data).await;
        summarize_and_store(&state.store, state.summarizer.as_ref(), &filename, &text).await;
    }

    Ok(Json(UploadResponse {
        ok: true,
        kind: collection,
        filename,
    }))
}
