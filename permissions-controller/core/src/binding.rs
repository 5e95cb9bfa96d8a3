//! Desired ClusterRoleTemplateBindings.

use crate::{Cluster, Grant, Identity, MANAGED_BY_ANNOTATION, MANAGED_BY_VALUE};
use std::{collections::BTreeMap, fmt};
use tracing::warn;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BindingId {
    pub namespace: String,
    pub name: String,
}

/// The fields of a binding that the controller owns and converges.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BindingSpec {
    pub role_template: String,
    pub owner_username: String,
    pub owner_principal: String,
    pub cluster_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Binding {
    pub id: BindingId,
    pub annotations: BTreeMap<String, String>,
    pub spec: BindingSpec,

    /// Version token assigned by the store; `None` for bindings that have not
    /// been written yet.
    pub resource_version: Option<String>,
}

/// `{identity}-{cluster}-{substring}`
pub fn binding_name(identity: &str, cluster: &str, substring: &str) -> String {
    format!("{identity}-{cluster}-{substring}")
}

/// Builds the bindings an identity should have: one per grant per cluster.
///
/// Returns an empty set for identities without a principal. Keys are unique;
/// when two grants would produce the same key, the first one wins.
pub fn desired(identity: &Identity, grants: &[Grant], clusters: &[&Cluster]) -> Vec<Binding> {
    let Some(principal) = identity.primary_principal() else {
        return Vec::new();
    };

    let mut bindings = Vec::<Binding>::with_capacity(grants.len() * clusters.len());
    for cluster in clusters {
        for grant in grants {
            let binding = Binding::managed(
                BindingId {
                    namespace: cluster.name.clone(),
                    name: binding_name(&identity.name, &cluster.name, &grant.substring),
                },
                BindingSpec {
                    role_template: grant.role_template.clone(),
                    owner_username: identity.username.clone(),
                    owner_principal: principal.to_string(),
                    cluster_name: cluster.name.clone(),
                },
            );

            if let Some(prior) = bindings.iter().find(|b| b.id == binding.id) {
                warn!(
                    binding = %binding.id,
                    role_template = %binding.spec.role_template,
                    kept = %prior.spec.role_template,
                    "Rules share a substring; skipping duplicate binding",
                );
                continue;
            }
            bindings.push(binding);
        }
    }
    bindings
}

// === impl BindingId ===

impl fmt::Display for BindingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

// === impl BindingSpec ===

impl BindingSpec {
    /// Names the fields that differ between `self` and `other`.
    pub fn changed_fields(&self, other: &Self) -> Vec<&'static str> {
        let mut changed = Vec::new();
        if self.role_template != other.role_template {
            changed.push("roleTemplateName");
        }
        if self.owner_username != other.owner_username {
            changed.push("userName");
        }
        if self.owner_principal != other.owner_principal {
            changed.push("userPrincipalName");
        }
        if self.cluster_name != other.cluster_name {
            changed.push("clusterName");
        }
        changed
    }
}

// === impl Binding ===

impl Binding {
    /// A new binding carrying the ownership annotation.
    pub fn managed(id: BindingId, spec: BindingSpec) -> Self {
        let annotations = Some((
            MANAGED_BY_ANNOTATION.to_string(),
            MANAGED_BY_VALUE.to_string(),
        ))
        .into_iter()
        .collect();
        Self {
            id,
            annotations,
            spec,
            resource_version: None,
        }
    }

    /// True if this controller created the binding.
    pub fn is_managed(&self) -> bool {
        self.annotations.get(MANAGED_BY_ANNOTATION).map(String::as_str) == Some(MANAGED_BY_VALUE)
    }
}
