//! Structured observability hooks for push dispatch.
//!
//! This module provides:
//! - A push-scoped tracing span via the `PushSpan` RAII guard
//! - Emission functions for dispatch lifecycle events
//!
//! Events are emitted at `info!` level unless noted (filter with
//! `PUSHTRIGGER_LOG`). Every record carries an `event` field naming it.

use tracing::{debug, info, warn};

use crate::job::DispatchedJob;

/// RAII guard that enters a push-scoped tracing span while a push is handled.
///
/// # Example
///
/// ```ignore
/// let _span = PushSpan::enter("delivery-123", "acme/widgets");
/// // every record below carries event_guid and repo
/// ```
pub struct PushSpan {
    _span: tracing::span::EnteredSpan,
}

impl PushSpan {
    pub fn enter(event_guid: &str, repo: &str) -> Self {
        let span = tracing::info_span!("pushtrigger.push", event_guid = %event_guid, repo = %repo);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: push received for a branch.
pub fn emit_push_received(repo: &str, branch: &str, after: &str, commits: usize) {
    info!(
        event = "push.received",
        repo = %repo,
        branch = %branch,
        after = %after,
        commits = commits,
    );
}

/// Emit event: push deleted its branch, nothing is triggered.
pub fn emit_push_branch_deleted(repo: &str, branch: &str) {
    info!(event = "push.branch_deleted", repo = %repo, branch = %branch);
}

/// Emit event: job does not apply to this push (debug level).
pub fn emit_job_skipped(job: &str, branch: &str) {
    debug!(event = "job.skipped", job = %job, branch = %branch);
}

/// Emit event: a job object was created and is about to be launched.
pub fn emit_job_created(job: &DispatchedJob) {
    let f = job.fields();
    info!(
        event = "job.created",
        job = %f.job,
        name = %f.name,
        job_type = %f.job_type,
        org = %f.org,
        repo = %f.repo,
        base_ref = %f.base_ref,
        base_sha = %f.base_sha,
        event_guid = %f.event_guid,
        "Creating a new job."
    );
}

/// Emit event: launcher accepted the job (debug level).
pub fn emit_job_launched(job: &str, name: &str) {
    debug!(event = "job.launched", job = %job, name = %name);
}

/// Emit event: a job failed to dispatch (warning level).
pub fn emit_job_failed(job: &str, error: &dyn std::fmt::Display) {
    warn!(event = "job.failed", job = %job, error = %error);
}

/// Emit event: dispatch of a push finished.
pub fn emit_dispatch_finished(launched: usize, skipped: usize, failed: usize) {
    info!(
        event = "push.dispatched",
        launched = launched,
        skipped = skipped,
        failed = failed,
    );
}
