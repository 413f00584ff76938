//! Change-set extraction for push events.
//!
//! The set of paths touched by a push is the union of every added, removed
//! and modified path across all of its commits. Predicates receive it through
//! a [`ChangedFilesProvider`] so that branch-only predicates never pay for
//! the aggregation.

use std::collections::BTreeSet;

use crate::error::Result;
use crate::event::PushEvent;

/// Deferred source of changed file paths.
///
/// Implemented for any `Fn() -> Result<Vec<String>>`, which is what
/// [`list_push_event_changes`] returns.
pub trait ChangedFilesProvider {
    fn changed_files(&self) -> Result<Vec<String>>;
}

impl<F> ChangedFilesProvider for F
where
    F: Fn() -> Result<Vec<String>>,
{
    fn changed_files(&self) -> Result<Vec<String>> {
        self()
    }
}

/// Deduplicated set of paths touched by a push.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    paths: BTreeSet<String>,
}

impl ChangeSet {
    /// Union of added, removed and modified paths over all commits.
    pub fn from_push(event: &PushEvent) -> Self {
        let paths = event
            .commits
            .iter()
            .flat_map(|c| c.added.iter().chain(&c.removed).chain(&c.modified))
            .cloned()
            .collect();
        Self { paths }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.paths.into_iter().collect()
    }
}

/// Provider that computes the push's change set on first call.
///
/// Nothing is cached; each call recomputes from the event.
pub fn list_push_event_changes(event: &PushEvent) -> impl Fn() -> Result<Vec<String>> + '_ {
    move || Ok(ChangeSet::from_push(event).into_vec())
}
