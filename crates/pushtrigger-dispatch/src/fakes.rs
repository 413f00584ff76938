//! In-memory fakes for the dispatch ports (testing only)
//!
//! Provides `MemoryLauncher`, which records every launched job and can be
//! told to reject specific job definitions.

use std::collections::HashSet;
use std::sync::Mutex;

use pushtrigger_core::DispatchedJob;

use crate::error::LaunchError;
use crate::launcher::Launcher;

/// Launcher that keeps launched jobs in a `Vec`, in launch order.
#[derive(Debug, Default)]
pub struct MemoryLauncher {
    launched: Mutex<Vec<DispatchedJob>>,
    attempts: Mutex<Vec<String>>,
    reject: HashSet<String>,
}

impl MemoryLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every launch of the job definition named `job`.
    pub fn rejecting(mut self, job: impl Into<String>) -> Self {
        self.reject.insert(job.into());
        self
    }

    /// Jobs accepted so far.
    pub fn launched(&self) -> Vec<DispatchedJob> {
        self.launched.lock().unwrap().clone()
    }

    /// Job definition names of every launch attempt, accepted or not.
    pub fn attempts(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }
}

impl Launcher for MemoryLauncher {
    fn launch(&self, job: DispatchedJob) -> Result<DispatchedJob, LaunchError> {
        self.attempts.lock().unwrap().push(job.spec.job.clone());
        if self.reject.contains(&job.spec.job) {
            return Err(LaunchError::Rejected {
                job: job.spec.job.clone(),
                reason: "rejected by MemoryLauncher".to_string(),
            });
        }
        self.launched.lock().unwrap().push(job.clone());
        Ok(job)
    }
}
