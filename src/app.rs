use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::config::RedirectMode;
use crate::redirect;
use crate::service::ShortenerService;

/// Shared state handed to every handler
pub struct AppState {
    pub service: Arc<ShortenerService>,
    pub redirect_mode: RedirectMode,
}

impl AppState {
    pub fn new(service: Arc<ShortenerService>, redirect_mode: RedirectMode) -> Arc<Self> {
        Arc::new(Self {
            service,
            redirect_mode,
        })
    }
}

/// The full HTTP surface: shortening and stats API plus redirects under `/r`
pub fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(redirect::routes::create_redirect_router(Arc::clone(&state)))
        .merge(api::routes::create_api_router(state))
        .layer(TraceLayer::new_for_http())
}
