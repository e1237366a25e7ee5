//! Crawl coordination: fan out across source adapters with bounded
//! concurrency, merge discovered candidates into the store per source,
//! and isolate one adapter's failure from the rest of the round.

pub mod sources;

use crate::config::CrawlConfig;
use crate::database::ProxyStore;
use crate::error::Result;
use crate::models::Candidate;
use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{info, instrument, warn};

/// A source of candidate proxies. Each adapter owns how it talks to its
/// upstream (scraping a listing page, calling an API, ...); the
/// coordinator only cares about the name and the resulting candidates.
#[async_trait]
pub trait Adapter: Send + Sync + 'static {
    /// Stable identifier stored as `proxies.source` for every candidate
    /// this adapter contributes.
    fn name(&self) -> &str;

    /// Fetch the current candidate list from this source. Errors here
    /// are isolated per-adapter: one failing source never aborts the
    /// round for the others.
    async fn fetch(&self) -> Result<Vec<Candidate>>;
}

/// Outcome of running one source adapter through the coordinator.
#[derive(Debug, Clone)]
pub struct AdapterRunResult {
    pub source: String,
    pub fetched: usize,
    pub inserted: u64,
    pub error: Option<String>,
}

/// Coordinates a single crawl round across all registered adapters.
pub struct CrawlCoordinator {
    store: ProxyStore,
    config: CrawlConfig,
    adapters: Vec<Arc<dyn Adapter>>,
}

impl CrawlCoordinator {
    pub fn new(store: ProxyStore, config: CrawlConfig, adapters: Vec<Arc<dyn Adapter>>) -> Self {
        CrawlCoordinator {
            store,
            config,
            adapters,
        }
    }

    /// Run every registered adapter concurrently (bounded by
    /// `max_concurrent_spiders`), merge its candidates into the store,
    /// and return a per-adapter summary for logging/metrics.
    #[instrument(skip(self))]
    pub async fn run_all(&self) -> Vec<AdapterRunResult> {
        let concurrency = self.config.max_concurrent_spiders.max(1);

        let semaphore = Arc::new(Semaphore::new(concurrency));
        let mut futs = FuturesUnordered::new();
        for adapter in self.adapters.iter().cloned() {
            let store = self.store.clone();
            let semaphore = semaphore.clone();
            futs.push(async move {
                let _permit = semaphore.acquire_owned().await.expect("semaphore closed");
                run_one(adapter, store).await
            });
        }
        let results: Vec<AdapterRunResult> = futs.collect().await;

        let total_inserted: u64 = results.iter().map(|r| r.inserted).sum();
        info!(
            adapters = results.len(),
            total_inserted, "crawl round complete"
        );

        results
    }
}

async fn run_one(adapter: Arc<dyn Adapter>, store: ProxyStore) -> AdapterRunResult {
    let name = adapter.name().to_string();

    match adapter.fetch().await {
        Ok(candidates) => {
            let fetched = candidates.len();
            match store.upsert_candidates(&name, &candidates).await {
                Ok(inserted) => AdapterRunResult {
                    source: name,
                    fetched,
                    inserted,
                    error: None,
                },
                Err(e) => {
                    warn!(source = %name, error = %e, "failed to store candidates");
                    AdapterRunResult {
                        source: name,
                        fetched,
                        inserted: 0,
                        error: Some(e.to_string()),
                    }
                }
            }
        }
        Err(e) => {
            warn!(source = %name, error = %e, "adapter fetch failed");
            AdapterRunResult {
                source: name,
                fetched: 0,
                inserted: 0,
                error: Some(e.to_string()),
            }
        }
    }
}
