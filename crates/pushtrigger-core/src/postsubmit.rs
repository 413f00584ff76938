//! Post-submit job definitions and their run predicate.
//!
//! A [`Postsubmit`] decides whether it applies to a push from two inputs:
//! the branch the push landed on ([`Brancher`]) and the paths it touched
//! ([`RegexpChangeMatcher`]). The branch check runs first and never touches
//! the changed-files provider.

use std::collections::BTreeMap;
use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::changes::ChangedFilesProvider;
use crate::error::{PredicateError, Result};

/// Label map attached to jobs.
pub type Labels = BTreeMap<String, String>;

/// Annotation map attached to jobs.
pub type Annotations = BTreeMap<String, String>;

/// Agent used when a job does not name one.
pub const DEFAULT_AGENT: &str = "tekton-pipeline";

/// Decides whether a job applies to a push.
pub trait RunPredicate {
    /// `branch` is the resolved branch name; `changes` is only consulted
    /// when the decision depends on paths.
    fn should_run(&self, branch: &str, changes: &dyn ChangedFilesProvider) -> Result<bool>;
}

// ---------------------------------------------------------------------------
// Brancher
// ---------------------------------------------------------------------------

/// Branch filter. Patterns are regexes matched against the whole branch name.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Brancher {
    /// Only run against these branches. Empty means all branches.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub branches: Vec<String>,

    /// Never run against these branches. Takes precedence over `branches`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skip_branches: Vec<String>,
}

impl Brancher {
    pub fn runs_against_all_branches(&self) -> bool {
        self.branches.is_empty() && self.skip_branches.is_empty()
    }

    pub fn should_run(&self, branch: &str) -> Result<bool> {
        if self.runs_against_all_branches() {
            return Ok(true);
        }
        if !self.skip_branches.is_empty() && anchored(&self.skip_branches)?.is_match(branch) {
            return Ok(false);
        }
        if self.branches.is_empty() {
            return Ok(true);
        }
        Ok(anchored(&self.branches)?.is_match(branch))
    }

    /// Check that every pattern compiles.
    pub fn validate(&self) -> Result<()> {
        if !self.branches.is_empty() {
            anchored(&self.branches)?;
        }
        if !self.skip_branches.is_empty() {
            anchored(&self.skip_branches)?;
        }
        Ok(())
    }
}

fn anchored(patterns: &[String]) -> Result<Regex> {
    for pattern in patterns {
        Regex::new(pattern).map_err(|e| PredicateError::invalid_pattern(pattern.as_str(), e))?;
    }
    let alternation = patterns
        .iter()
        .map(|p| format!("(?:{p})"))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!("^(?:{alternation})$"))
        .map_err(|e| PredicateError::invalid_pattern(patterns.join("|"), e))
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| PredicateError::invalid_pattern(pattern, e))
}

// ---------------------------------------------------------------------------
// RegexpChangeMatcher
// ---------------------------------------------------------------------------

/// Path filter. Patterns are unanchored regexes searched in each path.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegexpChangeMatcher {
    /// Run only if some changed path matches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_if_changed: Option<String>,

    /// Skip if every changed path matches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_if_only_changed: Option<String>,
}

impl RegexpChangeMatcher {
    /// Whether the decision depends on changed paths at all.
    pub fn could_run(&self) -> bool {
        self.run_if_changed.is_some() || self.skip_if_only_changed.is_some()
    }

    /// `Ok(None)` when the matcher has no opinion, otherwise the decision
    /// for the provider's changes.
    pub fn should_run(&self, changes: &dyn ChangedFilesProvider) -> Result<Option<bool>> {
        if !self.could_run() {
            return Ok(None);
        }
        let run_if = self.run_if_changed.as_deref().map(compile).transpose()?;
        let skip_if_only = self.skip_if_only_changed.as_deref().map(compile).transpose()?;

        let files = changes.changed_files()?;
        let runs = files.iter().any(|file| {
            run_if.as_ref().is_some_and(|re| re.is_match(file))
                || skip_if_only.as_ref().is_some_and(|re| !re.is_match(file))
        });
        Ok(Some(runs))
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(pattern) = &self.run_if_changed {
            compile(pattern)?;
        }
        if let Some(pattern) = &self.skip_if_only_changed {
            compile(pattern)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Postsubmit
// ---------------------------------------------------------------------------

/// Clone settings a job applies on top of the push's refs.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CloneSettings {
    /// Alternate import path to clone into.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_alias: Option<String>,

    /// Overrides the repository clone URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clone_uri: Option<String>,

    /// Shallow clone depth.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clone_depth: Option<u32>,

    #[serde(default)]
    pub skip_submodules: bool,
}

/// A configured post-submit job.
///
/// Definitions are shared templates: dispatch copies `labels` before adding
/// per-push entries and aliases `annotations` without writing to them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Postsubmit {
    pub name: String,

    #[serde(default)]
    pub labels: Labels,

    #[serde(default)]
    pub annotations: Arc<Annotations>,

    #[serde(flatten)]
    pub brancher: Brancher,

    #[serde(flatten)]
    pub change_matcher: RegexpChangeMatcher,

    #[serde(default = "default_agent")]
    pub agent: String,

    /// Namespace the job runs in; the launcher's default when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    /// Status context reported for the job. Defaults to the job name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    /// Maximum concurrent runs; 0 is unlimited.
    #[serde(default)]
    pub max_concurrency: u32,

    #[serde(flatten)]
    pub clone: CloneSettings,
}

fn default_agent() -> String {
    DEFAULT_AGENT.to_string()
}

impl Postsubmit {
    /// A job that runs on every branch for every change.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            labels: Labels::new(),
            annotations: Arc::new(Annotations::new()),
            brancher: Brancher::default(),
            change_matcher: RegexpChangeMatcher::default(),
            agent: default_agent(),
            namespace: None,
            context: None,
            max_concurrency: 0,
            clone: CloneSettings::default(),
        }
    }

    pub fn with_branches<I, S>(mut self, branches: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.brancher.branches = branches.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_skip_branches<I, S>(mut self, branches: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.brancher.skip_branches = branches.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_run_if_changed(mut self, pattern: impl Into<String>) -> Self {
        self.change_matcher.run_if_changed = Some(pattern.into());
        self
    }

    pub fn with_skip_if_only_changed(mut self, pattern: impl Into<String>) -> Self {
        self.change_matcher.skip_if_only_changed = Some(pattern.into());
        self
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_annotations(mut self, annotations: Annotations) -> Self {
        self.annotations = Arc::new(annotations);
        self
    }

    /// Context reported for the job.
    pub fn context(&self) -> &str {
        self.context.as_deref().unwrap_or(&self.name)
    }

    /// Branch-only check; never needs changed files.
    pub fn could_run(&self, branch: &str) -> Result<bool> {
        self.brancher.should_run(branch)
    }
}

impl RunPredicate for Postsubmit {
    fn should_run(&self, branch: &str, changes: &dyn ChangedFilesProvider) -> Result<bool> {
        if !self.could_run(branch)? {
            return Ok(false);
        }
        match self.change_matcher.should_run(changes)? {
            Some(decision) => Ok(decision),
            None => Ok(true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn files(paths: &[&str]) -> impl Fn() -> Result<Vec<String>> {
        let owned: Vec<String> = paths.iter().map(|s| s.to_string()).collect();
        move || Ok(owned.clone())
    }

    #[test]
    fn test_brancher_all_branches_by_default() {
        let brancher = Brancher::default();
        assert!(brancher.runs_against_all_branches());
        assert!(brancher.should_run("anything").unwrap());
    }

    #[test]
    fn test_brancher_matches_whole_name() {
        let brancher = Brancher {
            branches: vec!["main".to_string(), "release-.*".to_string()],
            skip_branches: Vec::new(),
        };
        assert!(brancher.should_run("main").unwrap());
        assert!(brancher.should_run("release-1.4").unwrap());
        assert!(!brancher.should_run("main-backup").unwrap());
        assert!(!brancher.should_run("feature/main").unwrap());
    }

    #[test]
    fn test_skip_branches_take_precedence() {
        let brancher = Brancher {
            branches: vec!["release-.*".to_string()],
            skip_branches: vec!["release-old".to_string()],
        };
        assert!(!brancher.should_run("release-old").unwrap());
        assert!(brancher.should_run("release-new").unwrap());
    }

    #[test]
    fn test_skip_branches_alone_allow_others() {
        let brancher = Brancher {
            branches: Vec::new(),
            skip_branches: vec!["gh-pages".to_string()],
        };
        assert!(!brancher.should_run("gh-pages").unwrap());
        assert!(brancher.should_run("main").unwrap());
    }

    #[test]
    fn test_brancher_invalid_pattern() {
        let brancher = Brancher {
            branches: vec!["main".to_string(), "release-(".to_string()],
            skip_branches: Vec::new(),
        };
        match brancher.should_run("main") {
            Err(PredicateError::InvalidPattern { pattern, .. }) => assert_eq!(pattern, "release-("),
            other => panic!("expected InvalidPattern, got {other:?}"),
        }
        assert!(brancher.validate().is_err());
    }

    #[test]
    fn test_run_if_changed_matches_any_path() {
        let matcher = RegexpChangeMatcher {
            run_if_changed: Some(r"\.go$".to_string()),
            skip_if_only_changed: None,
        };
        assert_eq!(matcher.should_run(&files(&["README.md", "cmd/main.go"])).unwrap(), Some(true));
        assert_eq!(matcher.should_run(&files(&["README.md"])).unwrap(), Some(false));
        assert_eq!(matcher.should_run(&files(&[])).unwrap(), Some(false));
    }

    #[test]
    fn test_skip_if_only_changed() {
        let matcher = RegexpChangeMatcher {
            run_if_changed: None,
            skip_if_only_changed: Some(r"^docs/".to_string()),
        };
        assert_eq!(matcher.should_run(&files(&["docs/a.md", "docs/b.md"])).unwrap(), Some(false));
        assert_eq!(matcher.should_run(&files(&["docs/a.md", "src/lib.rs"])).unwrap(), Some(true));
    }

    #[test]
    fn test_matcher_without_patterns_has_no_opinion() {
        let matcher = RegexpChangeMatcher::default();
        let called = Cell::new(false);
        let provider = || -> Result<Vec<String>> {
            called.set(true);
            Ok(Vec::new())
        };
        assert_eq!(matcher.should_run(&provider).unwrap(), None);
        assert!(!called.get());
    }

    #[test]
    fn test_branch_only_predicate_never_lists_changes() {
        let job = Postsubmit::new("unit").with_branches(["main"]);
        let calls = Cell::new(0);
        let provider = || -> Result<Vec<String>> {
            calls.set(calls.get() + 1);
            Ok(vec!["a.go".to_string()])
        };
        assert!(job.should_run("main", &provider).unwrap());
        assert!(!job.should_run("dev", &provider).unwrap());
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_rejected_branch_skips_change_matching() {
        let job = Postsubmit::new("unit")
            .with_branches(["main"])
            .with_run_if_changed(r"\.go$");
        let called = Cell::new(false);
        let provider = || -> Result<Vec<String>> {
            called.set(true);
            Ok(vec!["a.go".to_string()])
        };
        assert!(!job.should_run("dev", &provider).unwrap());
        assert!(!called.get());
    }

    #[test]
    fn test_predicate_combines_branch_and_paths() {
        let job = Postsubmit::new("unit")
            .with_branches(["main"])
            .with_run_if_changed(r"\.go$");
        assert!(job.should_run("main", &files(&["a.go"])).unwrap());
        assert!(!job.should_run("main", &files(&["a.md"])).unwrap());
    }

    #[test]
    fn test_invalid_run_if_changed_is_an_error() {
        let job = Postsubmit::new("broken").with_run_if_changed("(unclosed");
        let err = job.should_run("main", &files(&["a.go"])).unwrap_err();
        assert!(matches!(err, PredicateError::InvalidPattern { .. }));
    }

    #[test]
    fn test_provider_failure_propagates() {
        let job = Postsubmit::new("unit").with_run_if_changed(".*");
        let provider = || -> Result<Vec<String>> { Err(PredicateError::ChangedFiles("boom".to_string())) };
        let err = job.should_run("main", &provider).unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_context_defaults_to_name() {
        let mut job = Postsubmit::new("lint");
        assert_eq!(job.context(), "lint");
        job.context = Some("ci/lint".to_string());
        assert_eq!(job.context(), "ci/lint");
    }

    #[test]
    fn test_deserialize_flattened_fields() {
        let raw = r#"{
            "name": "build",
            "branches": ["main"],
            "run_if_changed": "^src/",
            "labels": { "team": "infra" },
            "annotations": { "owner": "build-cop" },
            "clone_depth": 1
        }"#;
        let job: Postsubmit = serde_json::from_str(raw).expect("deserialize");
        assert_eq!(job.brancher.branches, vec!["main"]);
        assert_eq!(job.change_matcher.run_if_changed.as_deref(), Some("^src/"));
        assert_eq!(job.labels.get("team").map(String::as_str), Some("infra"));
        assert_eq!(job.annotations.get("owner").map(String::as_str), Some("build-cop"));
        assert_eq!(job.clone.clone_depth, Some(1));
        assert_eq!(job.agent, DEFAULT_AGENT);
    }
}
