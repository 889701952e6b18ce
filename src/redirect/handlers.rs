use axum::{
    extract::{ConnectInfo, Path, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use std::sync::Arc;

use crate::analytics::ClientAddress;
use crate::app::AppState;
use crate::error::ServiceResult;

/// Redirect to the original URL, recording the click on the way
pub async fn redirect_url(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> ServiceResult<Response> {
    let referrer = headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_owned);
    let address = ClientAddress::from_request(&headers, Some(addr.ip()));

    let location = state.service.follow(&code, referrer, &address).await?;

    Ok((
        state.redirect_mode.status_code(),
        [(header::LOCATION, location)],
    )
        .into_response())
}
