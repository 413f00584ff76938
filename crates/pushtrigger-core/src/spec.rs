//! Job specs built from a post-submit definition and a push's refs.

use serde::{Deserialize, Serialize};

use crate::postsubmit::{CloneSettings, Postsubmit};
use crate::refs::Refs;

/// Kind of trigger that produced a job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    Postsubmit,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::Postsubmit => "postsubmit",
        }
    }
}

impl std::fmt::Display for JobType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a launcher needs to run one job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobSpec {
    #[serde(rename = "type")]
    pub job_type: JobType,

    /// Name of the job definition.
    pub job: String,

    pub agent: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    pub context: String,

    #[serde(default)]
    pub max_concurrency: u32,

    /// Refs shared by every job from the same push.
    pub refs: Refs,

    /// Per-job clone settings.
    #[serde(default)]
    pub clone: CloneSettings,
}

impl JobSpec {
    /// Clone URI the job should use, honouring a per-job override.
    pub fn effective_clone_uri(&self) -> &str {
        self.clone
            .clone_uri
            .as_deref()
            .unwrap_or(&self.refs.clone_uri)
    }
}

/// Build the spec for a triggered post-submit job.
pub fn postsubmit_spec(job: &Postsubmit, refs: &Refs) -> JobSpec {
    JobSpec {
        job_type: JobType::Postsubmit,
        job: job.name.clone(),
        agent: job.agent.clone(),
        namespace: job.namespace.clone(),
        context: job.context().to_string(),
        max_concurrency: job.max_concurrency,
        refs: refs.clone(),
        clone: job.clone.clone(),
    }
}
