use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// One periodic unit of work the scheduler drives.
#[async_trait]
pub trait ScheduledJob: Send + Sync {
    /// Stable name, used as the cache key suffix for bookkeeping and
    /// leader election (`task:stats:{name}`, `task:leader:{name}`).
    fn name(&self) -> &str;

    /// Interval between scheduled fires.
    fn interval(&self) -> Duration;

    /// Whether this job must run at most once across the whole worker
    /// fleet per tick (leader-elected via the coordination cache), as
    /// opposed to running independently on every worker.
    fn shared(&self) -> bool {
        false
    }

    /// Execute one run of the job.
    async fn run(&self) -> Result<()>;
}
