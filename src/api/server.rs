//! API server using Axum
//!
//! Provides the thin read API over the proxy pool: health, listing,
//! stats, task status, and a Prometheus scrape endpoint.

use std::net::SocketAddr;
use std::time::Instant;

use axum::Router;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tracing::{info, instrument};

use crate::cache::Cache;
use crate::config::{AppConfig, Config};
use crate::database::Database;
use crate::error::{PoolError, Result};
use crate::services::ProxyService;

use super::middleware::cors_layer;
use super::routes;

/// Shared state for API handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub cache: Cache,
    pub service: ProxyService,
    pub config: Config,
    pub started_at: Instant,
}

/// API server
pub struct ApiServer {
    config: AppConfig,
    state: AppState,
}

impl ApiServer {
    pub fn new(config: Config, db: Database, cache: Cache, service: ProxyService) -> Self {
        let app_config = config.app.clone();
        let state = AppState {
            db,
            cache,
            service,
            config,
            started_at: Instant::now(),
        };

        Self {
            config: app_config,
            state,
        }
    }

    fn build_router(&self) -> Router {
        let cors = cors_layer(&self.config.cors_origins);

        routes::create_router(self.state.clone())
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the API server until `shutdown` signals true.
    #[instrument(skip(self, shutdown))]
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .map_err(|e| PoolError::InvalidConfig(format!("invalid API bind address: {e}")))?;

        let router = self.build_router();

        info!("API server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.changed().await;
            })
            .await
            .map_err(|e| PoolError::Internal(e.to_string()))?;

        info!("API server shut down");
        Ok(())
    }
}
