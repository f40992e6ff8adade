//! Manages the state of long-running, asynchronous background jobs.
//!
//! Batch rendering, QR annotation and certificate delivery all run outside the
//! request/response cycle. Their handlers hand a blocking closure to
//! [`schedule_job`], return the `job_id` right away and let the client poll
//! `GET /api/jobs/{job_id}`.
//!
//! The main components are:
//! - `JobsState`: A clonable, thread-safe struct that holds the shared state of all jobs.
//!   It is injected into the Actix application state in `main.rs`.
//! - `JobUpdate`: A message struct used to communicate status changes from a background
//!   job back to the central state manager.
//! - `start_job_updater`: A long-running task that listens for `JobUpdate` messages
//!   on an MPSC channel and updates the shared `JobsState` accordingly.
//! - `ProgressReporter`: The handle a blocking worker uses to publish its progress.

use common::jobs::JobStatus;
use log::{debug, error};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

/// Capacity of the update channel between workers and the updater task.
pub const JOB_CHANNEL_CAPACITY: usize = 100;

/// A thread-safe, shareable container for the state of all background jobs.
#[derive(Clone)]
pub struct JobsState {
    /// A map from a unique job ID to its current `JobStatus`.
    ///
    /// Read by the status endpoint, written by `start_job_updater`.
    pub jobs: Arc<RwLock<HashMap<String, JobStatus>>>,

    /// Sender side of the update channel. Background tasks use clones of it to
    /// report progress and completion.
    pub tx: mpsc::Sender<JobUpdate>,
}

impl JobsState {
    /// Creates the state together with the receiver `start_job_updater` consumes.
    pub fn new() -> (Self, mpsc::Receiver<JobUpdate>) {
        let (tx, rx) = mpsc::channel(JOB_CHANNEL_CAPACITY);
        let state = Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            tx,
        };
        (state, rx)
    }

    pub async fn status(&self, job_id: &str) -> Option<JobStatus> {
        self.jobs.read().await.get(job_id).cloned()
    }

    /// Registers a new `Pending` job and returns its id.
    pub async fn register(&self) -> String {
        let job_id = Uuid::new_v4().to_string();
        self.jobs
            .write()
            .await
            .insert(job_id.clone(), JobStatus::Pending);
        job_id
    }

    /// Whether `job_id` is known and has not reached a final state.
    pub async fn is_running(&self, job_id: &str) -> bool {
        self.jobs
            .read()
            .await
            .get(job_id)
            .map(|status| !status.is_finished())
            .unwrap_or(false)
    }
}

/// Represents a status update for a specific background job.
#[derive(Debug)]
pub struct JobUpdate {
    /// The unique identifier of the job being updated.
    pub(crate) job_id: String,
    /// The new status of the job.
    pub(crate) status: JobStatus,
}

/// Starts the central job state updater task.
///
/// Spawned once from `main.rs`; runs until every sender is dropped.
pub async fn start_job_updater(state: JobsState, mut rx: mpsc::Receiver<JobUpdate>) {
    while let Some(update) = rx.recv().await {
        debug!("job {} -> {:?}", update.job_id, update.status);
        let mut jobs = state.jobs.write().await;
        jobs.insert(update.job_id, update.status);
    }
}

/// Publishes progress of one job from a blocking thread.
#[derive(Clone)]
pub struct ProgressReporter {
    job_id: String,
    tx: mpsc::Sender<JobUpdate>,
}

impl ProgressReporter {
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Must not be called from async context.
    pub fn report(&self, percent: u32) {
        let _ = self.tx.blocking_send(JobUpdate {
            job_id: self.job_id.clone(),
            status: JobStatus::InProgress(percent.min(100)),
        });
    }
}

/// Runs `work` on the blocking pool under an already registered `job_id`.
///
/// The closure's `Ok` message becomes `Completed`, its `Err` becomes `Failed`.
/// A panicking worker is reported as `Failed` too.
pub fn schedule_job<F>(state: &JobsState, job_id: String, work: F)
where
    F: FnOnce(&ProgressReporter) -> Result<String, String> + Send + 'static,
{
    let tx = state.tx.clone();
    let reporter = ProgressReporter {
        job_id: job_id.clone(),
        tx: tx.clone(),
    };

    tokio::spawn(async move {
        let _ = tx
            .send(JobUpdate {
                job_id: job_id.clone(),
                status: JobStatus::InProgress(0),
            })
            .await;

        let handle = tokio::task::spawn_blocking(move || work(&reporter));

        let status = match handle.await {
            Ok(Ok(message)) => JobStatus::Completed(message),
            Ok(Err(e)) => {
                error!("job {} failed: {}", job_id, e);
                JobStatus::Failed(e)
            }
            Err(e) => {
                error!("job {} panicked: {}", job_id, e);
                JobStatus::Failed(format!("Task join error: {}", e))
            }
        };
        let _ = tx.send(JobUpdate { job_id, status }).await;
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn wait_until_finished(state: &JobsState, job_id: &str) -> JobStatus {
        for _ in 0..200 {
            if let Some(status) = state.status(job_id).await {
                if status.is_finished() {
                    return status;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {job_id} did not finish");
    }

    #[actix_web::test]
    async fn completed_jobs_carry_their_message() {
        let (state, rx) = JobsState::new();
        tokio::spawn(start_job_updater(state.clone(), rx));

        let job_id = state.register().await;
        assert_eq!(state.status(&job_id).await, Some(JobStatus::Pending));

        schedule_job(&state, job_id.clone(), |progress| {
            progress.report(50);
            Ok("done".to_string())
        });

        assert_eq!(
            wait_until_finished(&state, &job_id).await,
            JobStatus::Completed("done".to_string())
        );
        assert!(!state.is_running(&job_id).await);
    }

    #[actix_web::test]
    async fn failures_and_panics_are_reported() {
        let (state, rx) = JobsState::new();
        tokio::spawn(start_job_updater(state.clone(), rx));

        let failing = state.register().await;
        schedule_job(&state, failing.clone(), |_| Err("no template".to_string()));
        assert_eq!(
            wait_until_finished(&state, &failing).await,
            JobStatus::Failed("no template".to_string())
        );

        let panicking = state.register().await;
        schedule_job(&state, panicking.clone(), |_| panic!("boom"));
        assert!(matches!(
            wait_until_finished(&state, &panicking).await,
            JobStatus::Failed(_)
        ));
    }
}
