use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::app::AppState;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{CreateUrlRequest, CreateUrlResponse, StatsResponse};
use crate::service::EXISTING_URL_MESSAGE;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Create a short URL.
///
/// 201 for a new code, 200 when the URL was already shortened.
pub async fn create_url(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateUrlRequest>, JsonRejection>,
) -> ServiceResult<(StatusCode, Json<CreateUrlResponse>)> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection, "rejected create request body");
        ServiceError::Validation(format!("Invalid request body: {}", rejection.body_text()))
    })?;

    let shortened = state.service.shorten(request).await?;

    let (status, message) = if shortened.is_existing {
        (StatusCode::OK, Some(EXISTING_URL_MESSAGE.to_string()))
    } else {
        (StatusCode::CREATED, None)
    };

    Ok((
        status,
        Json(CreateUrlResponse {
            short_link: shortened.short_link,
            expires_at: shortened.expires_at,
            message,
        }),
    ))
}

/// Click statistics for a short code
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> ServiceResult<Json<StatsResponse>> {
    state.service.stats(&code).await.map(Json)
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
    })
}
