//! Rancher's `management.cattle.io/v3` resources.
//!
//! Rancher stores the fields of these kinds at the top level of the object
//! rather than under `spec`, so they are modelled by hand instead of with
//! `kube::CustomResource`.

use kube::{api::ObjectMeta, Resource};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

pub const GROUP: &str = "management.cattle.io";
pub const VERSION: &str = "v3";

/// A Rancher user.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Set for local users; users from external auth providers often have none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub principal_ids: Vec<String>,
}

/// A downstream cluster managed by Rancher.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
}

/// Grants a user or group a role template on a cluster.
///
/// Lives in the namespace named after the cluster.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterRoleTemplateBinding {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,

    #[serde(default)]
    pub cluster_name: String,

    #[serde(default)]
    pub role_template_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_principal_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_principal_name: Option<String>,
}

macro_rules! impl_resource {
    ($ty:ty, $kind:literal, $plural:literal, $scope:ty) => {
        impl Resource for $ty {
            type DynamicType = ();
            type Scope = $scope;

            fn kind(_: &()) -> Cow<'_, str> {
                $kind.into()
            }

            fn group(_: &()) -> Cow<'_, str> {
                GROUP.into()
            }

            fn version(_: &()) -> Cow<'_, str> {
                VERSION.into()
            }

            fn plural(_: &()) -> Cow<'_, str> {
                $plural.into()
            }

            fn meta(&self) -> &ObjectMeta {
                &self.metadata
            }

            fn meta_mut(&mut self) -> &mut ObjectMeta {
                &mut self.metadata
            }
        }
    };
}

impl_resource!(User, "User", "users", k8s_openapi::ClusterResourceScope);
impl_resource!(Cluster, "Cluster", "clusters", k8s_openapi::ClusterResourceScope);
impl_resource!(
    ClusterRoleTemplateBinding,
    "ClusterRoleTemplateBinding",
    "clusterroletemplatebindings",
    k8s_openapi::NamespaceResourceScope
);

// === impl ClusterRoleTemplateBinding ===

impl ClusterRoleTemplateBinding {
    /// An empty binding with its type information filled in.
    pub fn new(namespace: impl ToString, name: impl ToString) -> Self {
        Self {
            api_version: Self::api_version(&()).into_owned(),
            kind: Self::kind(&()).into_owned(),
            metadata: ObjectMeta {
                namespace: Some(namespace.to_string()),
                name: Some(name.to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::ResourceExt;
    use pretty_assertions::assert_eq;

    #[test]
    fn user_from_rancher() {
        let user: User = serde_json::from_value(serde_json::json!({
            "apiVersion": "management.cattle.io/v3",
            "kind": "User",
            "metadata": {
                "name": "u-b4qkhsnliz",
                "resourceVersion": "1234",
                "finalizers": ["controller.cattle.io/mgmt-auth-users-controller"]
            },
            "displayName": "Alice",
            "username": "alice-developer",
            "principalIds": ["local://u-b4qkhsnliz"],
            "mustChangePassword": false
        }))
        .unwrap();

        assert_eq!(user.name_any(), "u-b4qkhsnliz");
        assert_eq!(user.username.as_deref(), Some("alice-developer"));
        assert_eq!(user.principal_ids, vec!["local://u-b4qkhsnliz"]);
    }

    #[test]
    fn user_without_username() {
        let user: User = serde_json::from_value(serde_json::json!({
            "metadata": { "name": "u-ext" },
            "principalIds": ["github_user://1234"]
        }))
        .unwrap();
        assert_eq!(user.username, None);
    }

    #[test]
    fn cluster_labels() {
        let cluster: Cluster = serde_json::from_value(serde_json::json!({
            "apiVersion": "management.cattle.io/v3",
            "kind": "Cluster",
            "metadata": {
                "name": "c-m-abc123",
                "labels": { "owner": "team-alice-xyz" }
            },
            "spec": { "displayName": "alice-dev" }
        }))
        .unwrap();
        assert_eq!(
            cluster.labels().get("owner").map(String::as_str),
            Some("team-alice-xyz")
        );
    }

    #[test]
    fn binding_serializes_at_top_level() {
        let mut crtb = ClusterRoleTemplateBinding::new("c1", "alice-developer-c1-developer");
        crtb.cluster_name = "c1".to_string();
        crtb.role_template_name = "projects-create".to_string();
        crtb.user_name = Some("alice-developer".to_string());
        crtb.user_principal_name = Some("p1".to_string());

        assert_eq!(
            serde_json::to_value(&crtb).unwrap(),
            serde_json::json!({
                "apiVersion": "management.cattle.io/v3",
                "kind": "ClusterRoleTemplateBinding",
                "metadata": {
                    "name": "alice-developer-c1-developer",
                    "namespace": "c1"
                },
                "clusterName": "c1",
                "roleTemplateName": "projects-create",
                "userName": "alice-developer",
                "userPrincipalName": "p1"
            })
        );
    }

    #[test]
    fn resource_paths() {
        assert_eq!(User::api_version(&()), "management.cattle.io/v3");
        assert_eq!(ClusterRoleTemplateBinding::plural(&()), "clusterroletemplatebindings");
    }
}
