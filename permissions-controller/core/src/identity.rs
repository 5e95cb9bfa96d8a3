use std::collections::BTreeMap;

/// A user record, as observed in the identity store.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub username: String,
    pub principal_ids: Vec<String>,

    /// Set once the store has marked the identity for deletion.
    pub deleting: bool,
}

/// A target cluster that bindings may grant access to.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Cluster {
    pub name: String,
    pub namespace: String,
    pub labels: BTreeMap<String, String>,
}

// === impl Identity ===

impl Identity {
    /// The principal that bindings are attributed to, if the identity has been
    /// provisioned with any.
    pub fn primary_principal(&self) -> Option<&str> {
        self.principal_ids.first().map(String::as_str)
    }
}
