//! Header guard middleware.
//! Rejects requests whose control headers fail validation.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::borrow::Cow;
use std::sync::Arc;

use crate::guard::ProxyGuard;
use crate::headers::AggregateResult;
use crate::http::server::AppState;

/// Validation result attached to requests that passed the guard.
#[derive(Clone, Debug)]
pub struct ValidatedHeaders(pub Arc<AggregateResult>);

/// Validate an HTTP header map against the guard's required list.
///
/// Values that are not valid UTF-8 are converted lossily, so they always
/// fail their header's format check instead of being skipped.
pub fn validate_header_map(guard: &ProxyGuard, headers: &HeaderMap) -> AggregateResult {
    let pairs: Vec<(&str, Cow<'_, str>)> = headers
        .iter()
        .map(|(name, value)| {
            let value = value
                .to_str()
                .map(Cow::Borrowed)
                .unwrap_or_else(|_| String::from_utf8_lossy(value.as_bytes()));
            (name.as_str(), value)
        })
        .collect();

    guard.validate_request(pairs.iter().map(|(name, value)| (*name, value.as_ref())))
}

/// 401 when a credential failed, 400 for every other failure.
pub fn rejection_status(result: &AggregateResult) -> StatusCode {
    if result.has_auth_failure() {
        StatusCode::UNAUTHORIZED
    } else {
        StatusCode::BAD_REQUEST
    }
}

pub async fn header_guard_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let result = validate_header_map(&state.guard, request.headers());

    if !result.valid {
        let status = rejection_status(&result);
        tracing::info!(
            status = %status,
            errors = result.errors.len(),
            path = %request.uri().path(),
            "Request rejected by header guard"
        );
        return (status, Json(result)).into_response();
    }

    request
        .extensions_mut()
        .insert(ValidatedHeaders(Arc::new(result)));
    next.run(request).await
}
