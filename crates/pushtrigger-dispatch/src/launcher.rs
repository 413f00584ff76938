//! Launcher port.
//!
//! A launcher takes ownership of a [`DispatchedJob`] and schedules it. The
//! dispatch loop calls it once per triggered job and treats any error as
//! fatal for the current batch (under the default policy).

use pushtrigger_core::DispatchedJob;

use crate::error::LaunchError;

/// Schedules dispatched jobs.
///
/// Guarantees expected of implementations:
/// - `launch` is called at most once per job object.
/// - On success the launched job (as stored by the backend) is returned.
/// - On error the job must be treated as not launched.
pub trait Launcher: Send + Sync {
    fn launch(&self, job: DispatchedJob) -> Result<DispatchedJob, LaunchError>;
}
