//! HTTP surface of the relay

pub mod auth;
pub mod error;
pub mod files;
pub mod health;
pub mod models;
pub mod summaries;
pub mod ui;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::AppState;

#[derive(OpenApi)]
#[openapi(
    info(title = "Backbrain API", description = "File relay with WebDAV storage and local fallback"),
    paths(
        health::health,
        files::write_file,
        files::read_file,
        files::list_files,
        files::upload,
        summaries::get_all_summaries,
        summaries::force_summarize_all,
    ),
    components(schemas(
        models::HealthResponse,
        models::WriteRequest,
        models::WriteResponse,
        models::ReadResponse,
        models::ListResponse,
        models::UploadForm,
        models::UploadResponse,
        models::SummariesResponse,
        models::ForceSummarizeResponse,
        crate::storage::Collection,
    )),
    tags(
        (name = "health", description = "Liveness"),
        (name = "files", description = "Write, read and list documents"),
        (name = "summaries", description = "Derived summary documents"),
    )
)]
pub struct ApiDoc;

/// Routes that stay available under `/public` when the alias is enabled
fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health))
        .route("/list-files", get(files::list_files))
        .route("/read-file", get(files::read_file))
        .route("/write-file", post(files::write_file))
}

pub fn router(enable_public_alias: bool) -> Router<Arc<AppState>> {
    let mut router = public_routes()
        .route("/upload", post(files::upload))
        .route("/get_all_summaries", get(summaries::get_all_summaries))
        .route("/api/v1/force-summarize", post(summaries::force_summarize_all))
        .route("/ui", get(ui::upload_page));

    if enable_public_alias {
        router = router.nest("/public", public_routes());
    }

    router.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

/// The complete application, ready to serve
pub fn create_app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    router(state.config.enable_public_alias)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
