use axum::{extract::FromRequestParts, http::request::Parts};
use std::sync::Arc;
use tracing::warn;

use super::error::ApiError;
use crate::{utils::security::secrets_match, AppState};

pub const API_SECRET_HEADER: &str = "X-Api-Secret";

/// Admits a request when no secret is configured, or when `X-Api-Secret` matches it
pub struct ApiSecret;

impl FromRequestParts<Arc<AppState>> for ApiSecret {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.config.api_secret.as_deref() else {
            return Ok(ApiSecret);
        };

        let supplied = parts
            .headers
            .get(API_SECRET_HEADER)
            .and_then(|value| value.to_str().ok());

        match supplied {
            Some(supplied) if secrets_match(supplied, expected) => Ok(ApiSecret),
            _ => {
                warn!("Rejected {} {}: missing or wrong API secret", parts.method, parts.uri.path());
                Err(ApiError::Unauthorized)
            }
        }
    }
}
