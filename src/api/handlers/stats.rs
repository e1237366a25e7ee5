//! Aggregate pool statistics endpoint

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::api::server::AppState;
use crate::error::PoolError;

/// `GET /api/stats` — counts by status/protocol/country/anonymity plus
/// the average measured speed of active proxies.
pub async fn get_stats(State(state): State<AppState>) -> Result<impl IntoResponse, PoolError> {
    let stats = state.service.stats().await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "data": stats,
    })))
}
