use axum::{extract::State, Json};
use std::sync::Arc;

use super::models::HealthResponse;
use crate::AppState;

#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        public: state.config.enable_public_alias,
        auth: state.config.auth_enabled(),
    })
}
