//! Dispatched job objects.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::labels::EVENT_GUID_LABEL;
use crate::postsubmit::{Annotations, Labels};
use crate::spec::JobSpec;

/// Lifecycle state of a dispatched job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Created and handed to a launcher; nothing has run yet.
    Triggered,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobStatus {
    pub state: JobState,
    pub start_time: DateTime<Utc>,
}

/// A job submitted to a launcher.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DispatchedJob {
    /// Unique object name.
    pub name: String,

    pub spec: JobSpec,

    pub labels: Labels,

    /// Shared with the job definition; never written through.
    pub annotations: Arc<Annotations>,

    pub status: JobStatus,
}

/// Create a fresh job in the triggered state.
pub fn new_job(spec: JobSpec, labels: Labels, annotations: Arc<Annotations>) -> DispatchedJob {
    DispatchedJob {
        name: Uuid::new_v4().to_string(),
        spec,
        labels,
        annotations,
        status: JobStatus {
            state: JobState::Triggered,
            start_time: Utc::now(),
        },
    }
}

impl DispatchedJob {
    /// Delivery identifier of the push that triggered this job.
    pub fn event_guid(&self) -> Option<&str> {
        self.labels.get(EVENT_GUID_LABEL).map(String::as_str)
    }

    /// Identifying fields used when logging about this job.
    pub fn fields(&self) -> JobFields<'_> {
        JobFields {
            job: &self.spec.job,
            name: &self.name,
            job_type: self.spec.job_type.as_str(),
            org: &self.spec.refs.org,
            repo: &self.spec.refs.repo,
            base_ref: &self.spec.refs.base_ref,
            base_sha: &self.spec.refs.base_sha,
            event_guid: self.event_guid().unwrap_or_default(),
        }
    }
}

/// Borrowed view of a job's identifying fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobFields<'a> {
    pub job: &'a str,
    pub name: &'a str,
    pub job_type: &'a str,
    pub org: &'a str,
    pub repo: &'a str,
    pub base_ref: &'a str,
    pub base_sha: &'a str,
    pub event_guid: &'a str,
}
