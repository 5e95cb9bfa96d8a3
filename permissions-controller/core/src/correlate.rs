//! Fuzzy Identity->Cluster correlation.
//!
//! A cluster belongs to an identity when some run of `window` consecutive
//! characters of the identity's username appears somewhere in the cluster's
//! `owner` label. Owner labels are frequently truncated or decorated (e.g.
//! `team-alice-xyz`), so an exact comparison would miss most of them.

use crate::{Cluster, Identity};
use std::num::NonZeroUsize;
use tracing::trace;

/// The label on a cluster that names its owner.
pub const OWNER_LABEL: &str = "owner";

pub const DEFAULT_WINDOW: NonZeroUsize = match NonZeroUsize::new(5) {
    Some(w) => w,
    None => unreachable!(),
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Correlator {
    window: NonZeroUsize,
}

// === impl Correlator ===

impl Default for Correlator {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

impl Correlator {
    pub fn new(window: NonZeroUsize) -> Self {
        Self { window }
    }

    pub fn window(&self) -> usize {
        self.window.get()
    }

    /// Returns the clusters that `identity` correlates with, in catalog order.
    ///
    /// Usernames shorter than the window never correlate with anything.
    pub fn correlate<'c>(&self, identity: &Identity, clusters: &'c [Cluster]) -> Vec<&'c Cluster> {
        let windows = self.windows(&identity.username);
        if windows.is_empty() {
            trace!(username = %identity.username, window = self.window(), "Username shorter than correlation window");
            return Vec::new();
        }

        clusters
            .iter()
            .filter(|cluster| {
                let Some(owner) = cluster.labels.get(OWNER_LABEL) else {
                    return false;
                };
                let matched = windows.iter().any(|w| owner.contains(w));
                trace!(cluster = %cluster.name, %owner, matched);
                matched
            })
            .collect()
    }

    // Every run of `window` consecutive characters, in order.
    fn windows<'u>(&self, username: &'u str) -> Vec<&'u str> {
        let w = self.window.get();
        let bounds = username
            .char_indices()
            .map(|(i, _)| i)
            .chain(Some(username.len()))
            .collect::<Vec<_>>();
        // `bounds` holds one more entry than the username has characters.
        if bounds.len() <= w {
            return Vec::new();
        }
        (0..bounds.len() - w)
            .map(|i| &username[bounds[i]..bounds[i + w]])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn cluster(name: &str, owner: Option<&str>) -> Cluster {
        Cluster {
            name: name.to_string(),
            namespace: String::new(),
            labels: owner
                .into_iter()
                .map(|o| (OWNER_LABEL.to_string(), o.to_string()))
                .collect(),
        }
    }

    fn user(username: &str) -> Identity {
        Identity {
            name: "u-1".to_string(),
            username: username.to_string(),
            principal_ids: vec!["p1".to_string()],
            deleting: false,
        }
    }

    fn window(w: usize) -> Correlator {
        Correlator::new(NonZeroUsize::new(w).unwrap())
    }

    #[rstest]
    #[case("alice-developer", "team-alice-xyz", 5, true)]
    #[case("alice-developer", "team-alic-xyz", 5, false)]
    #[case("alice", "alice", 5, true)]
    #[case("alic", "alice", 5, false)]
    #[case("", "anything", 1, false)]
    #[case("bob", "bob", 4, false)]
    #[case("ALICE", "alice", 5, false)]
    #[case("héllo-world", "xx-héllo", 5, true)]
    #[case("alice-developer", "team-alice-xyz", usize::MAX, false)]
    #[case("alice-developer", "alice-developer", 15, true)]
    #[case("alice-developer", "alice-developer", 16, false)]
    fn correlates(
        #[case] username: &str,
        #[case] owner: &str,
        #[case] w: usize,
        #[case] expected: bool,
    ) {
        let clusters = [cluster("c1", Some(owner))];
        let matched = window(w).correlate(&user(username), &clusters);
        assert_eq!(!matched.is_empty(), expected);
    }

    #[test]
    fn short_username_matches_nothing() {
        let clusters = [
            cluster("c1", Some("bob")),
            cluster("c2", Some("bobbobbob")),
            cluster("c3", Some("")),
        ];
        assert!(window(5).correlate(&user("bob"), &clusters).is_empty());
    }

    #[test]
    fn unlabeled_clusters_never_match() {
        let clusters = [cluster("local", None), cluster("c1", Some("alice-team"))];
        let matched = window(5).correlate(&user("alice"), &clusters);
        assert_eq!(
            matched.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
            vec!["c1"]
        );
    }

    #[test]
    fn preserves_catalog_order() {
        let clusters = [
            cluster("c3", Some("carol-3")),
            cluster("c1", Some("carol-1")),
            cluster("c2", Some("dave")),
        ];
        let matched = window(5).correlate(&user("carol"), &clusters);
        assert_eq!(
            matched.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
            vec!["c3", "c1"]
        );
    }

    #[test]
    fn windows_cover_username() {
        assert_eq!(window(3).windows("abcd"), vec!["abc", "bcd"]);
        assert_eq!(window(4).windows("abcd"), vec!["abcd"]);
        assert!(window(5).windows("abcd").is_empty());
        assert!(window(usize::MAX).windows("abcd").is_empty());
    }
}
