//! Turns User and Cluster watch events into work for the [`Controller`].
//!
//! [`Controller`]: crate::Controller

use ahash::AHashMap as HashMap;
use parking_lot::RwLock;
use permissions_controller_core::OWNER_LABEL;
use permissions_controller_k8s_api::{self as k8s, ResourceExt};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error};

pub type SharedIndex = Arc<RwLock<Index>>;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Work {
    /// Run a full reconciliation for the named user.
    Reconcile(String),

    /// The named user is gone; collect the bindings owned by `username`.
    Collect { name: String, username: String },
}

#[derive(Debug)]
pub struct Index {
    /// User name -> username. Deletion events carry only the name, and
    /// bindings are owned by username.
    users: HashMap<String, String>,

    /// Cluster name -> owner label.
    clusters: HashMap<String, Option<String>>,

    work: UnboundedSender<Work>,
}

// === impl Index ===

impl Index {
    pub fn shared(work: UnboundedSender<Work>) -> SharedIndex {
        Arc::new(RwLock::new(Self {
            users: HashMap::new(),
            clusters: HashMap::new(),
            work,
        }))
    }

    fn send(&self, work: Work) {
        if let Err(error) = self.work.send(work) {
            error!(%error, "Failed to queue work");
        }
    }

    fn reconcile_all(&self) {
        for name in self.users.keys() {
            self.send(Work::Reconcile(name.clone()));
        }
    }
}

impl kubert::index::IndexClusterResource<k8s::User> for Index {
    fn apply(&mut self, user: k8s::User) {
        let name = user.name_unchecked();
        let username = user.username.unwrap_or_default();
        self.users.insert(name.clone(), username);
        self.send(Work::Reconcile(name));
    }

    fn delete(&mut self, name: String) {
        match self.users.remove(&name) {
            Some(username) => self.send(Work::Collect { name, username }),
            None => debug!(%name, "Deleted user was never indexed"),
        }
    }
}

impl kubert::index::IndexClusterResource<k8s::Cluster> for Index {
    fn apply(&mut self, cluster: k8s::Cluster) {
        let name = cluster.name_unchecked();
        let owner = cluster.labels().get(OWNER_LABEL).cloned();

        // Only a new or changed owner can change which users correlate with
        // the cluster.
        if self.clusters.get(&name) == Some(&owner) {
            return;
        }
        debug!(%name, ?owner, "Cluster owner changed");
        self.clusters.insert(name, owner);
        self.reconcile_all();
    }

    fn delete(&mut self, name: String) {
        // The cluster's namespace, and the bindings in it, go away with it.
        self.clusters.remove(&name);
    }
}
