//! Observability tests for push dispatch logging.

use std::sync::Arc;

use pushtrigger_core::obs::{
    emit_dispatch_finished, emit_job_created, emit_job_failed, emit_push_branch_deleted,
    emit_push_received,
};
use pushtrigger_core::{
    assemble_labels, create_refs, new_job, postsubmit_spec, Annotations, Labels, Postsubmit,
    PushEvent, PushSpan, Repository,
};
use tracing_test::traced_test;

fn sample_push() -> PushEvent {
    PushEvent {
        reference: "refs/heads/main".to_string(),
        repo: Repository {
            namespace: "acme".to_string(),
            name: "widgets".to_string(),
            ..Default::default()
        },
        after: "abc123".to_string(),
        guid: "delivery-77".to_string(),
        ..Default::default()
    }
}

/// Test: the job-created record carries the job's identifying fields
#[traced_test]
#[test]
fn test_emit_job_created_logs_identifying_fields() {
    let event = sample_push();
    let refs = create_refs(&event);
    let job = new_job(
        postsubmit_spec(&Postsubmit::new("unit"), &refs),
        assemble_labels(&Labels::new(), &event.guid),
        Arc::new(Annotations::new()),
    );

    emit_job_created(&job);

    assert!(logs_contain("Creating a new job."));
    assert!(logs_contain("job.created"));
    assert!(logs_contain("delivery-77"));
    assert!(logs_contain("abc123"));
    assert!(logs_contain(&job.name));
}

/// Test: push lifecycle records are emitted inside the push span
#[traced_test]
#[test]
fn test_push_lifecycle_records() {
    let _span = PushSpan::enter("delivery-5", "acme/widgets");
    emit_push_received("acme/widgets", "main", "abc123", 3);
    emit_push_branch_deleted("acme/widgets", "old");
    emit_dispatch_finished(1, 2, 0);

    assert!(logs_contain("push.received"));
    assert!(logs_contain("push.branch_deleted"));
    assert!(logs_contain("push.dispatched"));
    assert!(logs_contain("delivery-5"));
}

/// Test: failures are logged at warn level
#[traced_test]
#[test]
fn test_emit_job_failed_logs_warning() {
    emit_job_failed("unit", &"launcher unavailable");
    assert!(logs_contain("WARN"));
    assert!(logs_contain("launcher unavailable"));
}
