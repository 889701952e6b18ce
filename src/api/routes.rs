use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::app::AppState;

use super::handlers::{create_url, get_stats, health_check};

pub fn create_api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/shorturls", post(create_url))
        .route("/{code}", get(get_stats))
        .with_state(state)
}
