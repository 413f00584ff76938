//! Source references handed to every job triggered by a push.

use serde::{Deserialize, Serialize};

use crate::event::PushEvent;

/// Immutable description of the source a triggered job checks out.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Refs {
    /// Organization (repository namespace).
    pub org: String,

    /// Repository name.
    pub repo: String,

    /// Branch the push landed on.
    pub base_ref: String,

    /// Head commit of the push.
    pub base_sha: String,

    /// Compare-view link for the push.
    pub base_link: String,

    /// Clone URI of the repository.
    pub clone_uri: String,
}

/// Build the [`Refs`] for a push. Called once per push and shared by every
/// job the push triggers.
pub fn create_refs(event: &PushEvent) -> Refs {
    Refs {
        org: event.repo.namespace.clone(),
        repo: event.repo.name.clone(),
        base_ref: event.branch().to_string(),
        base_sha: event.after.clone(),
        base_link: event.compare.clone(),
        clone_uri: event.repo.clone.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Repository;

    fn sample_push() -> PushEvent {
        PushEvent {
            reference: "refs/heads/main".to_string(),
            repo: Repository {
                namespace: "acme".to_string(),
                name: "widgets".to_string(),
                clone: "https://git.example.com/acme/widgets.git".to_string(),
                link: "https://git.example.com/acme/widgets".to_string(),
                branch: "main".to_string(),
            },
            before: "000111".to_string(),
            after: "abc123".to_string(),
            compare: "https://git.example.com/acme/widgets/compare/000111...abc123".to_string(),
            guid: "delivery-42".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_refs_maps_every_field() {
        let refs = create_refs(&sample_push());
        assert_eq!(refs.org, "acme");
        assert_eq!(refs.repo, "widgets");
        assert_eq!(refs.base_ref, "main");
        assert_eq!(refs.base_sha, "abc123");
        assert_eq!(
            refs.base_link,
            "https://git.example.com/acme/widgets/compare/000111...abc123"
        );
        assert_eq!(refs.clone_uri, "https://git.example.com/acme/widgets.git");
    }

    #[test]
    fn test_create_refs_is_deterministic() {
        let event = sample_push();
        assert_eq!(create_refs(&event), create_refs(&event));
    }

    #[test]
    fn test_create_refs_uses_resolved_branch() {
        let mut event = sample_push();
        event.reference = "feature/login".to_string();
        assert_eq!(create_refs(&event).base_ref, "feature/login");
    }
}
