//! Post-submit job configuration.
//!
//! Jobs are stored per repository under their `"org/repo"` key. The file
//! format is TOML:
//!
//! ```toml
//! [[postsubmits."acme/widgets"]]
//! name = "unit"
//! branches = ["main", "release-.*"]
//! run_if_changed = "\\.go$"
//! labels = { team = "infra" }
//! ```

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use pushtrigger_core::{Postsubmit, Repository};
use serde::Deserialize;
use tracing::debug;

use crate::error::ConfigError;

/// Source of post-submit job definitions.
pub trait JobConfigStore: Send + Sync {
    /// Jobs configured for `repo`, in configuration order. Empty when the
    /// repository has no post-submits.
    fn postsubmits(&self, repo: &Repository) -> &[Postsubmit];
}

#[derive(Debug, Default, Deserialize)]
struct JobConfigFile {
    #[serde(default)]
    postsubmits: BTreeMap<String, Vec<Postsubmit>>,
}

/// Job configuration held in memory, typically loaded from a TOML file.
#[derive(Debug, Default, Clone)]
pub struct StaticJobConfig {
    postsubmits: BTreeMap<String, Vec<Postsubmit>>,
}

impl StaticJobConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register jobs for `repo` (an `"org/repo"` key). Not validated.
    pub fn with_postsubmits(mut self, repo: impl Into<String>, jobs: Vec<Postsubmit>) -> Self {
        self.postsubmits.insert(repo.into(), jobs);
        self
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let file: JobConfigFile = toml::from_str(raw)?;
        let config = Self {
            postsubmits: file.postsubmits,
        };
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&raw)?;
        debug!(
            path = %path.display(),
            repos = config.postsubmits.len(),
            jobs = config.job_count(),
            "Loaded job config"
        );
        Ok(config)
    }

    /// Check repository keys, job names and every job's patterns.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (repo, jobs) in &self.postsubmits {
            validate_repo_key(repo)?;
            let mut seen = HashSet::new();
            for job in jobs {
                validate_postsubmit(repo, job)?;
                if !seen.insert(job.name.as_str()) {
                    return Err(ConfigError::DuplicateJob {
                        repo: repo.clone(),
                        job: job.name.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Configured repository keys.
    pub fn repos(&self) -> impl Iterator<Item = &str> {
        self.postsubmits.keys().map(String::as_str)
    }

    /// Total number of configured jobs.
    pub fn job_count(&self) -> usize {
        self.postsubmits.values().map(Vec::len).sum()
    }
}

impl JobConfigStore for StaticJobConfig {
    fn postsubmits(&self, repo: &Repository) -> &[Postsubmit] {
        self.postsubmits
            .get(&repo.full_name())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

fn validate_repo_key(key: &str) -> Result<(), ConfigError> {
    match key.rsplit_once('/') {
        Some((org, repo)) if !org.is_empty() && !repo.is_empty() => Ok(()),
        _ => Err(ConfigError::InvalidRepoKey(key.to_string())),
    }
}

fn validate_postsubmit(repo: &str, job: &Postsubmit) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidJob {
        repo: repo.to_string(),
        job: job.name.clone(),
        reason,
    };

    if job.name.trim().is_empty() {
        return Err(invalid("job name must not be empty".to_string()));
    }
    if job.change_matcher.run_if_changed.is_some()
        && job.change_matcher.skip_if_only_changed.is_some()
    {
        return Err(invalid(
            "run_if_changed and skip_if_only_changed are mutually exclusive".to_string(),
        ));
    }
    job.brancher.validate().map_err(|e| invalid(e.to_string()))?;
    job.change_matcher
        .validate()
        .map_err(|e| invalid(e.to_string()))?;
    Ok(())
}
