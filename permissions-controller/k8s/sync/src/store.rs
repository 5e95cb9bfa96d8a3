//! A [`Store`] backed by the Kubernetes API.

use permissions_controller_core::{
    Binding, BindingId, BindingSpec, Cluster, Identity, Store, StoreError,
};
use permissions_controller_k8s_api::{self as k8s, ResourceExt};

/// Field manager recorded on objects this controller writes.
pub const FIELD_MANAGER: &str = "permissions-controller";

#[derive(Clone)]
pub struct KubeStore {
    client: k8s::Client,
}

// === impl KubeStore ===

impl KubeStore {
    pub fn new(client: k8s::Client) -> Self {
        Self { client }
    }

    fn bindings(&self, namespace: &str) -> k8s::Api<k8s::ClusterRoleTemplateBinding> {
        k8s::Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait::async_trait]
impl Store for KubeStore {
    async fn get_identity(&self, name: &str) -> Result<Option<Identity>, StoreError> {
        let user = k8s::Api::<k8s::User>::all(self.client.clone())
            .get_opt(name)
            .await
            .map_err(store_error)?;
        Ok(user.map(identity))
    }

    async fn list_clusters(&self) -> Result<Vec<Cluster>, StoreError> {
        let clusters = k8s::Api::<k8s::Cluster>::all(self.client.clone())
            .list(&k8s::ListParams::default())
            .await
            .map_err(store_error)?;
        Ok(clusters.items.into_iter().map(cluster).collect())
    }

    async fn list_bindings(&self) -> Result<Vec<Binding>, StoreError> {
        let crtbs = k8s::Api::<k8s::ClusterRoleTemplateBinding>::all(self.client.clone())
            .list(&k8s::ListParams::default())
            .await
            .map_err(store_error)?;
        Ok(crtbs.items.into_iter().filter_map(binding).collect())
    }

    async fn get_binding(&self, id: &BindingId) -> Result<Option<Binding>, StoreError> {
        let crtb = self
            .bindings(&id.namespace)
            .get_opt(&id.name)
            .await
            .map_err(store_error)?;
        Ok(crtb.and_then(binding))
    }

    async fn create_binding(&self, binding: Binding) -> Result<Binding, StoreError> {
        let params = k8s::PostParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..Default::default()
        };
        let created = self
            .bindings(&binding.id.namespace)
            .create(&params, &crtb(&binding))
            .await
            .map_err(store_error)?;
        Ok(self::binding(created).unwrap_or(binding))
    }

    async fn update_binding(&self, binding: Binding) -> Result<Binding, StoreError> {
        // A merge patch leaves every field we don't converge alone. Including
        // the resource version makes the API server reject the write if the
        // object changed since it was read.
        let patch = k8s::Patch::Merge(update_patch(&binding));
        let params = k8s::PatchParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..Default::default()
        };
        let updated = self
            .bindings(&binding.id.namespace)
            .patch(&binding.id.name, &params, &patch)
            .await
            .map_err(store_error)?;
        Ok(self::binding(updated).unwrap_or(binding))
    }

    async fn delete_binding(&self, id: &BindingId) -> Result<(), StoreError> {
        self.bindings(&id.namespace)
            .delete(&id.name, &k8s::DeleteParams::default())
            .await
            .map_err(store_error)?;
        Ok(())
    }
}

pub(crate) fn store_error(error: k8s::Error) -> StoreError {
    match error {
        k8s::Error::Api(ref rsp) if rsp.code == 404 => StoreError::NotFound,
        k8s::Error::Api(ref rsp) if rsp.code == 409 && rsp.reason == "AlreadyExists" => {
            StoreError::AlreadyExists
        }
        k8s::Error::Api(ref rsp) if rsp.code == 409 => StoreError::Conflict,
        error => StoreError::Other(error.into()),
    }
}

pub(crate) fn identity(user: k8s::User) -> Identity {
    Identity {
        name: user.name_unchecked(),
        deleting: user.metadata.deletion_timestamp.is_some(),
        username: user.username.unwrap_or_default(),
        principal_ids: user.principal_ids,
    }
}

pub(crate) fn cluster(cluster: k8s::Cluster) -> Cluster {
    Cluster {
        name: cluster.name_unchecked(),
        namespace: cluster.metadata.namespace.unwrap_or_default(),
        labels: cluster.metadata.labels.unwrap_or_default(),
    }
}

/// Bindings without a name or namespace are ignored.
pub(crate) fn binding(crtb: k8s::ClusterRoleTemplateBinding) -> Option<Binding> {
    let id = BindingId {
        namespace: crtb.metadata.namespace?,
        name: crtb.metadata.name?,
    };
    Some(Binding {
        id,
        annotations: crtb.metadata.annotations.unwrap_or_default(),
        resource_version: crtb.metadata.resource_version,
        spec: BindingSpec {
            role_template: crtb.role_template_name,
            owner_username: crtb.user_name.unwrap_or_default(),
            owner_principal: crtb.user_principal_name.unwrap_or_default(),
            cluster_name: crtb.cluster_name,
        },
    })
}

pub(crate) fn crtb(binding: &Binding) -> k8s::ClusterRoleTemplateBinding {
    let mut crtb = k8s::ClusterRoleTemplateBinding::new(&binding.id.namespace, &binding.id.name);
    crtb.metadata.annotations = Some(binding.annotations.clone());
    crtb.metadata.resource_version = binding.resource_version.clone();
    crtb.cluster_name = binding.spec.cluster_name.clone();
    crtb.role_template_name = binding.spec.role_template.clone();
    crtb.user_name = Some(binding.spec.owner_username.clone());
    crtb.user_principal_name = Some(binding.spec.owner_principal.clone());
    crtb
}

pub(crate) fn update_patch(binding: &Binding) -> serde_json::Value {
    serde_json::json!({
        "metadata": {
            "resourceVersion": binding.resource_version,
        },
        "clusterName": binding.spec.cluster_name,
        "roleTemplateName": binding.spec.role_template,
        "userName": binding.spec.owner_username,
        "userPrincipalName": binding.spec.owner_principal,
    })
}
