//! Concrete `ScheduledJob` implementations registered with the
//! scheduler: crawl, pending/successful revalidation, cleanup, and
//! country lookup.

use crate::config::{SchedulerConfig, ValidatorConfig};
use crate::crawl::CrawlCoordinator;
use crate::error::Result;
use crate::scheduler::ScheduledJob;
use crate::services::country::CountryResolver;
use crate::services::proxy_service::ProxyService;
use crate::validator::SharedValidator;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Runs every registered source adapter and merges discovered
/// candidates into the store. Marked `shared`: a single worker per
/// fleet is enough, the rest would just duplicate outbound requests.
pub struct CrawlJob {
    coordinator: Arc<CrawlCoordinator>,
    interval: Duration,
}

impl CrawlJob {
    pub fn new(coordinator: Arc<CrawlCoordinator>, scheduler_config: &SchedulerConfig) -> Self {
        CrawlJob {
            coordinator,
            interval: Duration::from_secs(scheduler_config.crawl_interval),
        }
    }
}

#[async_trait]
impl ScheduledJob for CrawlJob {
    fn name(&self) -> &str {
        "crawl"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn shared(&self) -> bool {
        true
    }

    async fn run(&self) -> Result<()> {
        let results = self.coordinator.run_all().await;
        let inserted: u64 = results.iter().map(|r| r.inserted).sum();
        info!(adapters = results.len(), inserted, "crawl job complete");
        Ok(())
    }
}

/// Validates proxies that have never succeeded, or have failed but are
/// still under the eviction threshold.
pub struct ValidatePendingJob {
    service: ProxyService,
    validator: SharedValidator,
    interval: Duration,
    max_fail_count: i32,
    batch_limit: i64,
}

impl ValidatePendingJob {
    pub fn new(
        service: ProxyService,
        validator: SharedValidator,
        scheduler_config: &SchedulerConfig,
        validator_config: &ValidatorConfig,
    ) -> Self {
        ValidatePendingJob {
            service,
            validator,
            interval: Duration::from_secs(scheduler_config.validate_interval),
            max_fail_count: validator_config.max_fail_count,
            batch_limit: validator_config.validate_batch_limit,
        }
    }
}

#[async_trait]
impl ScheduledJob for ValidatePendingJob {
    fn name(&self) -> &str {
        "validate_pending"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn run(&self) -> Result<()> {
        let proxies = self
            .service
            .get_pending_proxies(self.batch_limit, self.max_fail_count)
            .await?;
        if proxies.is_empty() {
            return Ok(());
        }

        let batch = self.validator.validate_batch(proxies).await?;
        info!(
            total = batch.total,
            success = batch.success,
            failed = batch.failed,
            "pending validation batch complete"
        );
        Ok(())
    }
}

/// Re-checks proxies currently marked successful, so stale "good"
/// proxies drop out of the active pool once they go dark. Marked
/// `shared`: one worker re-checking the successful set is enough.
pub struct ValidateSuccessJob {
    service: ProxyService,
    validator: SharedValidator,
    interval: Duration,
    batch_limit: i64,
}

impl ValidateSuccessJob {
    pub fn new(
        service: ProxyService,
        validator: SharedValidator,
        scheduler_config: &SchedulerConfig,
        validator_config: &ValidatorConfig,
    ) -> Self {
        ValidateSuccessJob {
            service,
            validator,
            interval: Duration::from_secs(scheduler_config.validate_success_interval),
            batch_limit: validator_config.validate_batch_limit,
        }
    }
}

#[async_trait]
impl ScheduledJob for ValidateSuccessJob {
    fn name(&self) -> &str {
        "validate_success"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn shared(&self) -> bool {
        true
    }

    async fn run(&self) -> Result<()> {
        let proxies = self.service.get_successful_proxies(self.batch_limit).await?;
        if proxies.is_empty() {
            return Ok(());
        }

        let batch = self.validator.validate_batch(proxies).await?;
        info!(
            total = batch.total,
            success = batch.success,
            failed = batch.failed,
            "successful-proxy revalidation batch complete"
        );
        Ok(())
    }
}

/// Evicts proxies that crossed the failure threshold or have sat idle
/// without ever succeeding past the staleness window.
pub struct CleanupJob {
    service: ProxyService,
    interval: Duration,
    max_fail_count: i32,
    stale_days: i64,
}

impl CleanupJob {
    pub fn new(service: ProxyService, scheduler_config: &SchedulerConfig, validator_config: &ValidatorConfig, stale_days: i64) -> Self {
        CleanupJob {
            service,
            interval: Duration::from_secs(scheduler_config.cleanup_interval),
            max_fail_count: validator_config.max_fail_count,
            stale_days,
        }
    }
}

#[async_trait]
impl ScheduledJob for CleanupJob {
    fn name(&self) -> &str {
        "cleanup"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn shared(&self) -> bool {
        true
    }

    async fn run(&self) -> Result<()> {
        let evicted_failed = self.service.cleanup_failed_proxies(self.max_fail_count).await?;
        let evicted_stale = self.service.cleanup_stale_proxies(self.stale_days).await?;
        info!(evicted_failed, evicted_stale, "cleanup job complete");
        Ok(())
    }
}

/// Backfills `country` for proxies that don't have one yet.
pub struct UpdateCountryJob {
    service: ProxyService,
    resolver: CountryResolver,
    interval: Duration,
    batch_limit: i64,
}

impl UpdateCountryJob {
    pub fn new(service: ProxyService, scheduler_config: &SchedulerConfig, batch_limit: i64) -> Self {
        UpdateCountryJob {
            service,
            resolver: CountryResolver::default(),
            interval: Duration::from_secs(scheduler_config.update_country_interval),
            batch_limit,
        }
    }
}

#[async_trait]
impl ScheduledJob for UpdateCountryJob {
    fn name(&self) -> &str {
        "update_country"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn shared(&self) -> bool {
        true
    }

    async fn run(&self) -> Result<()> {
        let targets = self.service.get_proxies_without_country(self.batch_limit).await?;
        if targets.is_empty() {
            return Ok(());
        }

        let resolved = self.resolver.resolve(&targets).await;
        let updated = self.service.batch_update_countries(&resolved).await?;
        info!(requested = targets.len(), updated, "country lookup job complete");
        Ok(())
    }
}
