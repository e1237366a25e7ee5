//! Prometheus text-exposition endpoint

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use std::fmt::Write as _;

use crate::api::server::AppState;
use crate::error::PoolError;

/// `GET /api/metrics` — pool composition as Prometheus gauges. Errors
/// fetching stats surface as a 503 rather than a partial scrape.
pub async fn metrics(State(state): State<AppState>) -> Result<impl IntoResponse, PoolError> {
    let stats = state.service.stats().await?;

    let mut body = String::new();

    let _ = writeln!(body, "# HELP proxypool_proxies_total Total proxies in the store");
    let _ = writeln!(body, "# TYPE proxypool_proxies_total gauge");
    let _ = writeln!(body, "proxypool_proxies_total {}", stats.total);

    let _ = writeln!(body, "# HELP proxypool_proxies_by_status Proxies by lifecycle status");
    let _ = writeln!(body, "# TYPE proxypool_proxies_by_status gauge");
    let _ = writeln!(body, "proxypool_proxies_by_status{{status=\"active\"}} {}", stats.active);
    let _ = writeln!(body, "proxypool_proxies_by_status{{status=\"inactive\"}} {}", stats.inactive);
    let _ = writeln!(body, "proxypool_proxies_by_status{{status=\"pending\"}} {}", stats.pending);

    let _ = writeln!(body, "# HELP proxypool_proxies_by_anonymity Active proxies by anonymity level");
    let _ = writeln!(body, "# TYPE proxypool_proxies_by_anonymity gauge");
    let _ = writeln!(body, "proxypool_proxies_by_anonymity{{level=\"transparent\"}} {}", stats.transparent);
    let _ = writeln!(body, "proxypool_proxies_by_anonymity{{level=\"anonymous\"}} {}", stats.anonymous);
    let _ = writeln!(body, "proxypool_proxies_by_anonymity{{level=\"elite\"}} {}", stats.elite);

    let _ = writeln!(body, "# HELP proxypool_distinct_protocols Distinct protocols observed");
    let _ = writeln!(body, "# TYPE proxypool_distinct_protocols gauge");
    let _ = writeln!(body, "proxypool_distinct_protocols {}", stats.protocols);

    let _ = writeln!(body, "# HELP proxypool_distinct_countries Distinct countries observed");
    let _ = writeln!(body, "# TYPE proxypool_distinct_countries gauge");
    let _ = writeln!(body, "proxypool_distinct_countries {}", stats.countries);

    if let Some(avg_speed) = stats.avg_speed {
        let _ = writeln!(body, "# HELP proxypool_avg_speed_seconds Average measured response time of active proxies");
        let _ = writeln!(body, "# TYPE proxypool_avg_speed_seconds gauge");
        let _ = writeln!(body, "proxypool_avg_speed_seconds {avg_speed}");
    }

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    ))
}
