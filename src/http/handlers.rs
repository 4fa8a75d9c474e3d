//! Route handlers for the guard's own endpoints.

use axum::{
    extract::{Extension, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::dns::DnsStats;
use crate::http::middleware::ValidatedHeaders;
use crate::http::server::AppState;
use crate::observability::metrics::{ResolutionMetricsSnapshot, ValidationMetricsSnapshot};

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub validation: ValidationMetricsSnapshot,
    pub resolution: ResolutionMetricsSnapshot,
}

#[derive(Debug, Deserialize)]
pub struct ResolveParams {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    pub url: String,
    /// Control headers that passed the guard for this request.
    pub validated_headers: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

pub async fn validation_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        validation: state.guard.validation_stats(),
        resolution: state.guard.resolution_stats(),
    })
}

pub async fn dns_stats(State(state): State<AppState>) -> Json<DnsStats> {
    Json(state.guard.dns_stats())
}

/// Rewrite `url`'s host into a resolved address.
///
/// Resolution failures map to 502; malformed URLs map to 400.
pub async fn resolve_proxy_url(
    State(state): State<AppState>,
    Extension(validated): Extension<ValidatedHeaders>,
    Query(params): Query<ResolveParams>,
) -> Response {
    let validated_headers: Vec<String> = validated
        .0
        .per_header
        .iter()
        .filter(|(_, outcome)| outcome.valid)
        .map(|(name, _)| name.clone())
        .collect();
    tracing::debug!(url = %params.url, headers = ?validated_headers, "Resolving proxy URL");

    match state.guard.resolve_proxy_url(&params.url).await {
        Ok(url) => Json(ResolveResponse {
            url,
            validated_headers,
        })
        .into_response(),
        Err(e) => {
            let status = if e.is_resolution_failure() {
                StatusCode::BAD_GATEWAY
            } else {
                StatusCode::BAD_REQUEST
            };
            tracing::warn!(url = %params.url, error = %e, "Proxy URL resolution failed");
            (status, Json(ErrorBody { error: e.to_string() })).into_response()
        }
    }
}
