//! Post-submit dispatch for push events.

use std::sync::Arc;

use pushtrigger_core::obs::{
    emit_dispatch_finished, emit_job_created, emit_job_failed, emit_job_launched,
    emit_job_skipped, emit_push_branch_deleted, emit_push_received,
};
use pushtrigger_core::{
    assemble_labels, create_refs, list_push_event_changes, new_job, postsubmit_spec,
    ChangedFilesProvider, DispatchedJob, Postsubmit, PushEvent, PushSpan, Refs, RunPredicate,
};
use serde::{Deserialize, Serialize};

use crate::error::{DispatchError, Result};
use crate::launcher::Launcher;
use crate::store::JobConfigStore;

/// What to do when a job fails to evaluate or launch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchPolicy {
    /// Stop at the first failure and return it. Jobs launched before the
    /// failure stay launched; later jobs are never evaluated.
    #[default]
    AbortOnFirst,

    /// Evaluate every job, keep launching after failures, and report all
    /// failures together as [`DispatchError::Batch`].
    CollectAll,
}

/// Outcome of a push whose dispatch completed without error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// The push deleted its branch; no job was considered.
    pub branch_deleted: bool,

    /// Jobs accepted by the launcher, in dispatch order.
    pub launched: Vec<DispatchedJob>,

    /// Job definitions whose run predicate declined the push.
    pub skipped: Vec<String>,
}

impl DispatchReport {
    fn branch_deleted() -> Self {
        Self {
            branch_deleted: true,
            ..Default::default()
        }
    }

    /// Number of launched jobs.
    pub fn launched_count(&self) -> usize {
        self.launched.len()
    }

    /// Job definition names of the launched jobs.
    pub fn launched_names(&self) -> Vec<String> {
        self.launched.iter().map(|j| j.spec.job.clone()).collect()
    }
}

/// Dispatches post-submit jobs for push events.
///
/// Holds no mutable state; independent pushes may be handled concurrently
/// from several threads.
pub struct PushDispatcher {
    store: Arc<dyn JobConfigStore>,
    launcher: Arc<dyn Launcher>,
    policy: DispatchPolicy,
}

impl PushDispatcher {
    pub fn new(store: Arc<dyn JobConfigStore>, launcher: Arc<dyn Launcher>) -> Self {
        Self {
            store,
            launcher,
            policy: DispatchPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: DispatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> DispatchPolicy {
        self.policy
    }

    /// Launch every configured post-submit that applies to `event`.
    ///
    /// A branch deletion is a no-op. Under [`DispatchPolicy::AbortOnFirst`]
    /// an error means jobs before the failing one may have launched and no
    /// later job was attempted.
    pub fn handle_push(&self, event: &PushEvent) -> Result<DispatchReport> {
        let repo = event.repo.full_name();
        let _span = PushSpan::enter(&event.guid, &repo);

        if event.deleted {
            emit_push_branch_deleted(&repo, event.branch());
            return Ok(DispatchReport::branch_deleted());
        }
        emit_push_received(&repo, event.branch(), &event.after, event.commits.len());

        let jobs = self.store.postsubmits(&event.repo);
        dispatch_postsubmits(event, jobs, self.launcher.as_ref(), self.policy)
    }
}

/// Dispatch loop over an already-selected job list.
///
/// Jobs are evaluated strictly in slice order. The change set is only
/// computed for jobs whose predicate asks for it.
pub fn dispatch_postsubmits(
    event: &PushEvent,
    jobs: &[Postsubmit],
    launcher: &dyn Launcher,
    policy: DispatchPolicy,
) -> Result<DispatchReport> {
    if event.deleted {
        return Ok(DispatchReport::branch_deleted());
    }

    let branch = event.branch();
    let refs = create_refs(event);
    let changes = list_push_event_changes(event);

    let mut report = DispatchReport::default();
    let mut failures = Vec::new();

    for job in jobs {
        match dispatch_one(event, branch, &refs, &changes, job, launcher) {
            Ok(Some(launched)) => report.launched.push(launched),
            Ok(None) => report.skipped.push(job.name.clone()),
            Err(err) => {
                emit_job_failed(&job.name, &err);
                match policy {
                    DispatchPolicy::AbortOnFirst => return Err(err),
                    DispatchPolicy::CollectAll => failures.push(err),
                }
            }
        }
    }

    emit_dispatch_finished(report.launched.len(), report.skipped.len(), failures.len());

    if failures.is_empty() {
        Ok(report)
    } else {
        Err(DispatchError::Batch {
            failures,
            launched: report.launched_names(),
        })
    }
}

/// Evaluate one job and launch it if it applies. `Ok(None)` means skipped.
fn dispatch_one(
    event: &PushEvent,
    branch: &str,
    refs: &Refs,
    changes: &dyn ChangedFilesProvider,
    job: &Postsubmit,
    launcher: &dyn Launcher,
) -> Result<Option<DispatchedJob>> {
    let should_run =
        job.should_run(branch, changes)
            .map_err(|source| DispatchError::PredicateEvaluation {
                job: job.name.clone(),
                source,
            })?;
    if !should_run {
        emit_job_skipped(&job.name, branch);
        return Ok(None);
    }

    let labels = assemble_labels(&job.labels, &event.guid);
    let dispatched = new_job(
        postsubmit_spec(job, refs),
        labels,
        Arc::clone(&job.annotations),
    );

    emit_job_created(&dispatched);
    let launched = launcher
        .launch(dispatched)
        .map_err(|source| DispatchError::Launch {
            job: job.name.clone(),
            source,
        })?;
    emit_job_launched(&launched.spec.job, &launched.name);

    Ok(Some(launched))
}
