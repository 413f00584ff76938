//! Decoded push notifications.
//!
//! A [`PushEvent`] is what the hosting provider's webhook payload looks like
//! after normalization: the repository, the ref that moved, the commits that
//! landed and a globally unique delivery identifier.

use serde::{Deserialize, Serialize};

const BRANCH_REF_PREFIX: &str = "refs/heads/";

/// Repository identity carried by a push.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Repository {
    /// Owner or organization (e.g. `"stevedores-org"`).
    pub namespace: String,

    /// Repository name without the namespace.
    pub name: String,

    /// Clone URI.
    #[serde(default)]
    pub clone: String,

    /// Web URL of the repository.
    #[serde(default)]
    pub link: String,

    /// Default branch.
    #[serde(default)]
    pub branch: String,
}

impl Repository {
    /// `namespace/name`, the key job configuration is stored under.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

/// One commit within a push.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Commit {
    #[serde(default)]
    pub sha: String,

    #[serde(default)]
    pub message: String,

    /// Paths added by this commit.
    #[serde(default)]
    pub added: Vec<String>,

    /// Paths removed by this commit.
    #[serde(default)]
    pub removed: Vec<String>,

    /// Paths modified by this commit.
    #[serde(default)]
    pub modified: Vec<String>,
}

/// A push of one or more commits to a branch.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PushEvent {
    /// Raw ref that moved (`refs/heads/main` on most providers).
    #[serde(rename = "ref")]
    pub reference: String,

    pub repo: Repository,

    /// Commit the ref pointed at before the push.
    #[serde(default)]
    pub before: String,

    /// Head commit after the push.
    #[serde(default)]
    pub after: String,

    /// Compare-view link for `before...after`.
    #[serde(default)]
    pub compare: String,

    /// Commits in push order.
    #[serde(default)]
    pub commits: Vec<Commit>,

    /// Globally unique delivery identifier.
    pub guid: String,

    /// The push created the ref.
    #[serde(default)]
    pub created: bool,

    /// The push deleted the ref instead of advancing it.
    #[serde(default)]
    pub deleted: bool,
}

impl PushEvent {
    /// The branch this push targets.
    ///
    /// Providers send either a fully qualified `refs/heads/<branch>` ref or,
    /// for some event shapes, the bare branch name. Both resolve to the bare
    /// name. Other qualified refs (tags) are returned untouched so they never
    /// collide with a branch of the same name.
    pub fn branch(&self) -> &str {
        self.reference
            .strip_prefix(BRANCH_REF_PREFIX)
            .unwrap_or(&self.reference)
    }

    /// Whether the pushed ref is a tag rather than a branch.
    pub fn is_tag(&self) -> bool {
        self.reference.starts_with("refs/tags/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push(reference: &str) -> PushEvent {
        PushEvent {
            reference: reference.to_string(),
            guid: "guid-1".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_branch_strips_heads_prefix() {
        assert_eq!(push("refs/heads/main").branch(), "main");
        assert_eq!(push("refs/heads/release/1.2").branch(), "release/1.2");
    }

    #[test]
    fn test_branch_keeps_bare_name() {
        assert_eq!(push("main").branch(), "main");
    }

    #[test]
    fn test_branch_keeps_tag_ref() {
        let event = push("refs/tags/v1.0.0");
        assert_eq!(event.branch(), "refs/tags/v1.0.0");
        assert!(event.is_tag());
    }

    #[test]
    fn test_full_name() {
        let repo = Repository {
            namespace: "acme".to_string(),
            name: "widgets".to_string(),
            ..Default::default()
        };
        assert_eq!(repo.full_name(), "acme/widgets");
    }

    #[test]
    fn test_deserialize_minimal_payload() {
        let raw = r#"{
            "ref": "refs/heads/main",
            "repo": { "namespace": "acme", "name": "widgets" },
            "after": "abc123",
            "guid": "delivery-1",
            "commits": [{ "added": ["a.go"] }]
        }"#;
        let event: PushEvent = serde_json::from_str(raw).expect("deserialize");
        assert_eq!(event.branch(), "main");
        assert_eq!(event.after, "abc123");
        assert!(!event.deleted);
        assert_eq!(event.commits.len(), 1);
        assert_eq!(event.commits[0].added, vec!["a.go"]);
        assert!(event.commits[0].modified.is_empty());
        assert!(event.repo.clone.is_empty());
    }

    #[test]
    fn test_deserialize_requires_guid() {
        let raw = r#"{ "ref": "refs/heads/main", "repo": { "namespace": "a", "name": "b" } }"#;
        assert!(serde_json::from_str::<PushEvent>(raw).is_err());
    }
}
