//! Named periodic job scheduler.
//!
//! # Invariants
//! - `ensure_periodic` keeps an existing pending schedule and never
//!   replaces it.
//! - Each schedule runs on its own task with a child of the root token.
//! - A run is awaited before the next tick is taken; ticks missed during a
//!   long run are skipped.

use super::{JobError, JobOutcome, PeriodicJob, SchedulerError};
use log::{info, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::{CancellationToken, DropGuard};
use uuid::Uuid;

/// Result of [`JobScheduler::ensure_periodic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueue {
    Scheduled,
    AlreadyPending,
}

struct ScheduledJob {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owns the background tasks of every scheduled job.
///
/// Dropping the scheduler cancels all of them.
pub struct JobScheduler {
    root: CancellationToken,
    jobs: Mutex<HashMap<&'static str, ScheduledJob>>,
    _cancel_on_drop: DropGuard,
}

impl Default for JobScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl JobScheduler {
    pub fn new() -> Self {
        let root = CancellationToken::new();
        Self {
            _cancel_on_drop: root.clone().drop_guard(),
            root,
            jobs: Mutex::new(HashMap::new()),
        }
    }

    /// Schedules `job` every `every` unless a schedule with the same name is
    /// still pending. The first run starts immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn ensure_periodic(
        &self,
        job: Arc<dyn PeriodicJob>,
        every: Duration,
    ) -> Result<Enqueue, SchedulerError> {
        if every.is_zero() {
            return Err(SchedulerError::ZeroInterval);
        }
        if self.root.is_cancelled() {
            return Err(SchedulerError::ShutDown);
        }

        let name = job.name();
        let mut jobs = self.lock_jobs();
        if jobs
            .get(name)
            .is_some_and(|scheduled| !scheduled.handle.is_finished())
        {
            info!("event=job_schedule module=jobs status=skipped job={name} reason=already_pending");
            return Ok(Enqueue::AlreadyPending);
        }

        let token = self.root.child_token();
        let handle = tokio::spawn(run_periodic(job, every, token.clone()));
        jobs.insert(name, ScheduledJob { token, handle });
        info!(
            "event=job_schedule module=jobs status=ok job={name} interval_secs={}",
            every.as_secs()
        );
        Ok(Enqueue::Scheduled)
    }

    /// Returns whether a schedule for `name` is still running.
    pub fn is_pending(&self, name: &str) -> bool {
        self.lock_jobs()
            .get(name)
            .is_some_and(|scheduled| !scheduled.handle.is_finished())
    }

    /// Cancels the schedule for `name` and waits for its task to stop.
    ///
    /// A run in progress finishes its current unit of work first. Returns
    /// whether a schedule existed.
    pub async fn cancel(&self, name: &str) -> bool {
        let removed = self.lock_jobs().remove(name);
        match removed {
            Some(scheduled) => {
                scheduled.token.cancel();
                join(name, scheduled.handle).await;
                info!("event=job_cancel module=jobs status=ok job={name}");
                true
            }
            None => false,
        }
    }

    /// Cancels every schedule and waits for all tasks to stop. Later
    /// `ensure_periodic` calls fail with [`SchedulerError::ShutDown`].
    pub async fn shutdown(&self) {
        self.root.cancel();
        let drained: Vec<(&'static str, ScheduledJob)> = self.lock_jobs().drain().collect();
        let count = drained.len();
        for (name, scheduled) in drained {
            join(name, scheduled.handle).await;
        }
        info!("event=job_shutdown module=jobs status=ok jobs={count}");
    }

    fn lock_jobs(&self) -> MutexGuard<'_, HashMap<&'static str, ScheduledJob>> {
        // The map stays consistent even if a holder panicked.
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn join(name: &str, handle: JoinHandle<()>) {
    if let Err(err) = handle.await {
        warn!("event=job_join module=jobs status=error job={name} error={err}");
    }
}

async fn run_periodic(job: Arc<dyn PeriodicJob>, every: Duration, cancel: CancellationToken) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }
        let _ = run_job(job.as_ref(), &cancel).await;
    }
}

/// Runs `job` once with run-scoped logging.
pub async fn run_job(
    job: &dyn PeriodicJob,
    cancel: &CancellationToken,
) -> Result<JobOutcome, JobError> {
    let name = job.name();
    let run_id = Uuid::new_v4();
    info!("event=job_run module=jobs status=start job={name} run_id={run_id}");

    let result = job.run(cancel).await;
    match &result {
        Ok(outcome) => info!(
            "event=job_run module=jobs status=ok job={name} run_id={run_id} processed={} changed={} failed={} cancelled={}",
            outcome.processed, outcome.changed, outcome.failed, outcome.cancelled
        ),
        Err(err) => warn!("event=job_run module=jobs status=error job={name} run_id={run_id} error={err}"),
    }
    result
}
