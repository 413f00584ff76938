//! pushtrigger core
//!
//! Push event model and the pieces needed to turn a push into post-submit
//! jobs:
//! - `event`: decoded push notifications and branch resolution
//! - `changes`: change-set extraction and the deferred changed-files provider
//! - `refs`: source references shared by every job of a push
//! - `postsubmit`: job definitions and their branch/path run predicate
//! - `spec` / `job`: job spec builder and job factory
//! - `labels`: per-push label assembly
//! - `obs` / `telemetry`: structured logging

pub mod changes;
pub mod error;
pub mod event;
pub mod job;
pub mod labels;
pub mod obs;
pub mod postsubmit;
pub mod refs;
pub mod spec;
pub mod telemetry;

pub use changes::{list_push_event_changes, ChangeSet, ChangedFilesProvider};
pub use error::{PredicateError, Result};
pub use event::{Commit, PushEvent, Repository};
pub use job::{new_job, DispatchedJob, JobFields, JobState, JobStatus};
pub use labels::{assemble_labels, EVENT_GUID_LABEL};
pub use obs::PushSpan;
pub use postsubmit::{
    Annotations, Brancher, CloneSettings, Labels, Postsubmit, RegexpChangeMatcher, RunPredicate,
    DEFAULT_AGENT,
};
pub use refs::{create_refs, Refs};
pub use spec::{postsubmit_spec, JobSpec, JobType};
pub use telemetry::init_tracing;

/// pushtrigger version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
