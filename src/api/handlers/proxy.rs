//! Read-only proxy listing endpoint

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::api::server::AppState;
use crate::error::PoolError;
use crate::models::ActiveProxyFilters;

const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 20;

#[derive(Debug, Deserialize, Default)]
pub struct ListProxiesQuery {
    pub protocol: Option<String>,
    pub country: Option<String>,
    pub anonymity: Option<String>,
    pub limit: Option<i64>,
}

/// `GET /api/proxies` — currently-active proxies, optionally filtered by
/// protocol/country/anonymity. `limit` is clamped to `[1, 20]`.
pub async fn list_proxies(
    State(state): State<AppState>,
    Query(query): Query<ListProxiesQuery>,
) -> Result<impl IntoResponse, PoolError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let filters = ActiveProxyFilters {
        protocol: query.protocol,
        country: query.country,
        anonymity: query.anonymity,
    };

    let proxies = state.service.get_active_proxies(&filters, limit).await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "data": proxies,
    })))
}
