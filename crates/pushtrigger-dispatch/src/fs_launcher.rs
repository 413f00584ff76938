use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use pushtrigger_core::DispatchedJob;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::LaunchError;
use crate::launcher::Launcher;

/// Launcher that drops each job into an outbox directory for a runner to
/// pick up.
///
/// Layout: `<outbox>/<job name>.json`, one pretty-printed JSON document per job.
pub struct FsLauncher {
    outbox: PathBuf,
}

impl FsLauncher {
    /// Create a launcher writing into `outbox`. Creates the directory if needed.
    pub fn new(outbox: impl AsRef<Path>) -> Result<Self, LaunchError> {
        let outbox = outbox.as_ref().to_path_buf();
        fs::create_dir_all(&outbox)?;
        Ok(Self { outbox })
    }

    pub fn outbox(&self) -> &Path {
        &self.outbox
    }

    fn job_path(&self, name: &str) -> PathBuf {
        self.outbox.join(format!("{name}.json"))
    }
}

impl Launcher for FsLauncher {
    fn launch(&self, job: DispatchedJob) -> Result<DispatchedJob, LaunchError> {
        let path = self.job_path(&job.name);
        if path.exists() {
            return Err(LaunchError::AlreadyExists(job.name));
        }

        let body = serde_json::to_vec_pretty(&job)?;

        // Write to a temp file in the outbox, then rename, so readers never
        // see a partial document.
        let mut tmp = NamedTempFile::new_in(&self.outbox)?;
        tmp.write_all(&body)?;
        tmp.persist_noclobber(&path).map_err(|e| {
            if e.error.kind() == std::io::ErrorKind::AlreadyExists {
                LaunchError::AlreadyExists(job.name.clone())
            } else {
                LaunchError::Io(e.error)
            }
        })?;

        debug!(path = %path.display(), job = %job.spec.job, "Wrote job to outbox");
        Ok(job)
    }
}
