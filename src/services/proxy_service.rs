//! Thin orchestration layer between the scheduled jobs / API handlers
//! and the durable store. Mirrors the teacher's repository-wrapping
//! service pattern: no business logic beyond composing store calls and
//! logging the outcome.

use crate::database::ProxyStore;
use crate::error::Result;
use crate::models::{ActiveProxyFilters, BatchVerdict, Candidate, PoolStats, Proxy, Verdict};
use tracing::info;

#[derive(Clone)]
pub struct ProxyService {
    store: ProxyStore,
}

impl ProxyService {
    pub fn new(store: ProxyStore) -> Self {
        ProxyService { store }
    }

    pub async fn add_batch(&self, source: &str, candidates: &[Candidate]) -> Result<u64> {
        self.store.upsert_candidates(source, candidates).await
    }

    pub async fn record_validation_result(&self, verdict: &Verdict) -> Result<()> {
        self.store.record_verdict(verdict).await
    }

    pub async fn record_batch(&self, batch: &BatchVerdict) -> Result<()> {
        for verdict in &batch.results {
            self.store.record_verdict(verdict).await?;
        }
        Ok(())
    }

    pub async fn get_active_proxies(&self, filters: &ActiveProxyFilters, limit: i64) -> Result<Vec<Proxy>> {
        self.store.iter_active(filters, limit).await
    }

    pub async fn get_pending_proxies(&self, limit: i64, max_fail_count: i32) -> Result<Vec<Proxy>> {
        self.store.iter_pending(limit, max_fail_count).await
    }

    pub async fn get_successful_proxies(&self, limit: i64) -> Result<Vec<Proxy>> {
        self.store.iter_successful(limit).await
    }

    pub async fn cleanup_failed_proxies(&self, max_fail_count: i32) -> Result<u64> {
        let deleted = self.store.cleanup_failed(max_fail_count).await?;
        if deleted > 0 {
            info!(deleted, "cleaned up failed proxies");
        }
        Ok(deleted)
    }

    pub async fn cleanup_stale_proxies(&self, stale_days: i64) -> Result<u64> {
        let deleted = self.store.cleanup_stale(stale_days).await?;
        if deleted > 0 {
            info!(deleted, "cleaned up stale proxies");
        }
        Ok(deleted)
    }

    pub async fn get_proxies_without_country(&self, limit: i64) -> Result<Vec<(i64, String)>> {
        self.store.proxies_without_country(limit).await
    }

    pub async fn batch_update_countries(&self, pairs: &[(i64, String)]) -> Result<u64> {
        self.store.batch_set_country(pairs).await
    }

    pub async fn stats(&self) -> Result<PoolStats> {
        self.store.stats().await
    }
}
