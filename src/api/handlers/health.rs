//! Health and status endpoints

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use serde_json::json;

use crate::api::server::AppState;
use crate::error::PoolError;

/// Liveness probe: no downstream checks, just "the process is up".
pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "proxypool"
        })),
    )
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    version: &'static str,
    uptime_secs: u64,
    database: bool,
    cache: bool,
}

impl StatusResponse {
    fn overall_status(&self) -> &'static str {
        if self.database {
            "healthy"
        } else {
            "degraded"
        }
    }
}

/// Readiness/status endpoint: version, uptime, and downstream
/// connectivity. The database is load-bearing (its absence fails the
/// check); the cache is advisory (its absence is reported but does not
/// fail the check, since the system degrades gracefully without it).
pub async fn status(State(state): State<AppState>) -> Result<impl IntoResponse, PoolError> {
    let database = state.db.health_check().await.is_ok();
    let cache = state.cache.ping().await.is_ok();

    let response = StatusResponse {
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.started_at.elapsed().as_secs(),
        database,
        cache,
    };

    let status_code = if database {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    Ok((status_code, Json(json!({
        "status": response.overall_status(),
        "version": response.version,
        "uptime_secs": response.uptime_secs,
        "database": response.database,
        "cache": response.cache,
    }))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overall_status_degrades_without_database() {
        let healthy = StatusResponse {
            version: "0.1.0",
            uptime_secs: 10,
            database: true,
            cache: true,
        };
        assert_eq!(healthy.overall_status(), "healthy");

        let degraded = StatusResponse {
            version: "0.1.0",
            uptime_secs: 10,
            database: false,
            cache: true,
        };
        assert_eq!(degraded.overall_status(), "degraded");
    }
}
