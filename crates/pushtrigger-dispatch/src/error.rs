//! Error types for job configuration, launching and dispatch.

use std::path::PathBuf;

use pushtrigger_core::PredicateError;
use thiserror::Error;

/// Errors loading or validating job configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read job config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse job config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid repository key {0:?}: expected \"org/repo\"")]
    InvalidRepoKey(String),

    #[error("invalid job {job:?} for {repo}: {reason}")]
    InvalidJob {
        repo: String,
        job: String,
        reason: String,
    },

    #[error("duplicate job {job:?} for {repo}")]
    DuplicateJob { repo: String, job: String },
}

/// Errors returned by a launcher.
#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("launcher rejected job {job}: {reason}")]
    Rejected { job: String, reason: String },

    #[error("job {0} already exists")]
    AlreadyExists(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors that stop or spoil dispatch of a push.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("failed to evaluate run predicate for job {job}: {source}")]
    PredicateEvaluation {
        job: String,
        #[source]
        source: PredicateError,
    },

    #[error("failed to launch job {job}: {source}")]
    Launch {
        job: String,
        #[source]
        source: LaunchError,
    },

    /// Every failure seen under [`crate::DispatchPolicy::CollectAll`].
    #[error("{} job(s) failed to dispatch ({} launched)", .failures.len(), .launched.len())]
    Batch {
        failures: Vec<DispatchError>,
        /// Names of the job definitions that were launched anyway.
        launched: Vec<String>,
    },
}

impl DispatchError {
    /// Job definition the failure belongs to, if it is a single failure.
    pub fn job(&self) -> Option<&str> {
        match self {
            DispatchError::PredicateEvaluation { job, .. } | DispatchError::Launch { job, .. } => {
                Some(job)
            }
            DispatchError::Batch { .. } => None,
        }
    }
}

/// Result type for dispatch operations.
pub type Result<T> = std::result::Result<T, DispatchError>;
