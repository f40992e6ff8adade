use serde::{Deserialize, Serialize};

/// Lifecycle of a background job (batch rendering, QR annotation, delivery pass).
///
/// `InProgress` carries a percentage in `0..=100`. `Completed` carries a short
/// human-readable summary of the outcome.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    InProgress(u32),
    Completed(String),
    Failed(String),
}

impl JobStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, JobStatus::Completed(_) | JobStatus::Failed(_))
    }
}

/// Progress of `done` out of `total` items as `floor(done / total * 100)`, capped at 100.
///
/// An empty workload reports 100 since there is nothing left to do.
pub fn progress_percent(done: usize, total: usize) -> u32 {
    if total == 0 {
        return 100;
    }
    ((done as u64 * 100) / total as u64).min(100) as u32
}
