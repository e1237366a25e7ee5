//! proxypool daemon entry point
//!
//! Runs the scheduler (crawl, validation, cleanup, country lookup) and
//! the read API side by side, with graceful shutdown support.

use std::sync::Arc;

use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod cache;
mod config;
mod crawl;
mod database;
mod error;
mod models;
mod scheduler;
mod services;
mod validator;

use api::ApiServer;
use cache::Cache;
use config::Config;
use crawl::sources::PlainTextAdapter;
use crawl::{Adapter, CrawlCoordinator};
use database::{Database, ProxyStore};
use models::ProxyProtocol;
use scheduler::Scheduler;
use services::jobs::{CleanupJob, CrawlJob, UpdateCountryJob, ValidatePendingJob, ValidateSuccessJob};
use services::ProxyService;
use validator::Validator;

const STALE_DAYS: i64 = 14;

#[tokio::main]
async fn main() -> error::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "proxypool=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("starting proxypool");

    let config = Config::from_env()?;
    info!("configuration loaded");

    let db = Database::new(&config).await?;
    info!("connected to database");

    db.run_migrations().await?;
    info!("database migrations complete");

    let cache = Cache::new(&config)?;

    let store = ProxyStore::new(db.pool().clone());
    let service = ProxyService::new(store.clone());

    let adapters = build_adapters();
    info!(count = adapters.len(), "registered crawl source adapters");
    let coordinator = Arc::new(CrawlCoordinator::new(store.clone(), config.crawl.clone(), adapters));

    let validator = Arc::new(Validator::new(store.clone(), config.validator.clone()));

    let jobs: Vec<Arc<dyn scheduler::ScheduledJob>> = vec![
        Arc::new(CrawlJob::new(coordinator, &config.scheduler)),
        Arc::new(ValidatePendingJob::new(
            service.clone(),
            validator.clone(),
            &config.scheduler,
            &config.validator,
        )),
        Arc::new(ValidateSuccessJob::new(
            service.clone(),
            validator.clone(),
            &config.scheduler,
            &config.validator,
        )),
        Arc::new(CleanupJob::new(service.clone(), &config.scheduler, &config.validator, STALE_DAYS)),
        Arc::new(UpdateCountryJob::new(
            service.clone(),
            &config.scheduler,
            config.validator.validate_batch_limit,
        )),
    ];

    let scheduler = Scheduler::new(cache.clone(), jobs);
    let running_jobs = scheduler.start().await;
    info!(count = running_jobs.len(), "scheduler started");

    let api_server = ApiServer::new(config.clone(), db.clone(), cache, service);

    let (shutdown_tx, _) = watch::channel(false);
    let api_shutdown = shutdown_tx.subscribe();

    let api_task = tokio::spawn(async move {
        if let Err(e) = api_server.run(api_shutdown).await {
            error!("API server error: {}", e);
        }
    });

    shutdown_signal().await;
    info!("shutdown signal received");

    let _ = shutdown_tx.send(true);
    for (handle, _) in &running_jobs {
        handle.shutdown();
    }

    let _ = api_task.await;
    for (_, join) in running_jobs {
        let _ = join.await;
    }

    db.close().await;
    info!("proxypool stopped");
    Ok(())
}

/// Build the crawl adapter set from `CRAWL_SOURCE_URLS`, a comma
/// separated list of plain-text `ip:port`-per-line source URLs. Empty
/// by default: operators register their real sources through this
/// variable in deployment rather than hardcoding upstream URLs here.
fn build_adapters() -> Vec<Arc<dyn Adapter>> {
    let raw = std::env::var("CRAWL_SOURCE_URLS").unwrap_or_default();
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .enumerate()
        .map(|(i, url)| {
            let adapter: Arc<dyn Adapter> = Arc::new(PlainTextAdapter::new(
                format!("source-{i}"),
                url.to_string(),
                ProxyProtocol::Http,
            ));
            adapter
        })
        .collect()
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
