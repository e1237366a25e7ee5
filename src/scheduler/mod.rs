//! Task scheduler: drift-free periodic execution of registered jobs,
//! with single-flight protection per worker and a one-time startup
//! leader election (via the coordination cache) that decides which
//! worker registers the shared task set.

pub mod drift;
pub mod task;

pub use task::ScheduledJob;

use crate::cache::Cache;
use crate::models::TaskState;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

const INIT_LOCK_KEY: &str = "scheduler:task_initialization";
const INIT_LOCK_TTL_SECS: u64 = 300;
const TASK_STATE_TTL_SECS: i64 = 86_400;

/// Known job names, used by `GET /api/tasks` to read back bookkeeping
/// for every registered job without needing a live job registry.
pub const JOB_NAMES: &[&str] = &[
    "crawl",
    "validate_pending",
    "validate_success",
    "cleanup",
    "update_country",
];

/// Guard for a single spawned task's lifecycle, generalizing the
/// teacher's per-service `*Handle` pattern into one reusable type.
pub struct TaskHandle {
    shutdown_tx: watch::Sender<bool>,
}

impl TaskHandle {
    pub fn new() -> (Self, watch::Receiver<bool>) {
        let (tx, rx) = watch::channel(false);
        (TaskHandle { shutdown_tx: tx }, rx)
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

/// Owns the set of registered jobs and spawns one supervising task per
/// job when started.
pub struct Scheduler {
    cache: Cache,
    jobs: Vec<Arc<dyn ScheduledJob>>,
}

impl Scheduler {
    pub fn new(cache: Cache, jobs: Vec<Arc<dyn ScheduledJob>>) -> Self {
        Scheduler { cache, jobs }
    }

    /// Elect a shared-task initialization leader, then spawn every
    /// registered job the current worker is responsible for: the
    /// per-worker task set unconditionally, and the shared task set only
    /// if this worker won the election. Returns a handle per spawned job
    /// plus its join handle, so the caller can wait for clean shutdown.
    pub async fn start(&self) -> Vec<(TaskHandle, tokio::task::JoinHandle<()>)> {
        let is_leader = self
            .cache
            .set_if_absent(INIT_LOCK_KEY, &uuid_like_token(), INIT_LOCK_TTL_SECS)
            .await;

        if is_leader {
            info!("elected as shared-task initialization leader");
        } else {
            info!("not elected as shared-task leader; registering per-worker tasks only");
        }

        self.jobs
            .iter()
            .filter(|job| !job.shared() || is_leader)
            .cloned()
            .map(|job| {
                let (handle, shutdown_rx) = TaskHandle::new();
                let cache = self.cache.clone();
                let join = tokio::spawn(run_job_loop(job, cache, shutdown_rx));
                (handle, join)
            })
            .collect()
    }
}

async fn run_job_loop(job: Arc<dyn ScheduledJob>, cache: Cache, mut shutdown: watch::Receiver<bool>) {
    let name = job.name().to_string();
    let interval = job.interval();
    let in_flight = Mutex::new(());

    let mut next_run = Utc::now() + chrono::Duration::from_std(interval).unwrap_or(chrono::Duration::seconds(1));

    loop {
        let now = Utc::now();
        let wait = (next_run - now).to_std().unwrap_or(std::time::Duration::ZERO);

        tokio::select! {
            _ = sleep(wait) => {}
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    info!(task = %name, "scheduler task shutting down");
                    break;
                }
            }
        }

        let fire_time = next_run;
        next_run = drift::next_fire(next_run, interval, Utc::now());

        let guard = match in_flight.try_lock() {
            Ok(g) => g,
            Err(_) => {
                warn!(task = %name, "previous run still in flight, skipping tick");
                continue;
            }
        };

        run_once(job.as_ref(), &cache, fire_time, next_run).await;
        drop(guard);
    }
}

#[instrument(skip(job, cache), fields(task = job.name()))]
async fn run_once(job: &dyn ScheduledJob, cache: &Cache, started_at: chrono::DateTime<Utc>, next_run: chrono::DateTime<Utc>) {
    let result = job.run().await;
    let finished_at = Utc::now();

    let mut state = TaskState::new(job.name());
    state.record_run(result.is_ok(), started_at, finished_at);
    state.next_run = Some(next_run);

    if let Err(e) = &result {
        error!(task = job.name(), error = %e, "scheduled task failed");
    }

    let key = format!("task:stats:{}", job.name());
    cache.write_hash(&key, &state.to_fields(), TASK_STATE_TTL_SECS as u64).await;
}

/// Lightweight, dependency-free unique token for leader lock ownership.
/// Not cryptographically random: collisions only cost a redundant run
/// in an already-rare race, never a correctness violation.
fn uuid_like_token() -> String {
    format!("{:x}-{:x}", std::process::id(), Utc::now().timestamp_nanos_opt().unwrap_or_default())
}
