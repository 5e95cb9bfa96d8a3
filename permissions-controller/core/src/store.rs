use crate::{Binding, BindingId, Cluster, Identity};

/// Errors returned by a [`Store`] when reading or writing bindings.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not found")]
    NotFound,

    #[error("already exists")]
    AlreadyExists,

    /// The object's version no longer matches the version the write expected.
    #[error("conflict")]
    Conflict,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// The resource store that holds identities, clusters and bindings.
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    /// Returns `None` if the identity does not exist.
    async fn get_identity(&self, name: &str) -> Result<Option<Identity>, StoreError>;

    async fn list_clusters(&self) -> Result<Vec<Cluster>, StoreError>;

    async fn list_bindings(&self) -> Result<Vec<Binding>, StoreError>;

    /// Returns `None` if the binding does not exist.
    async fn get_binding(&self, id: &BindingId) -> Result<Option<Binding>, StoreError>;

    async fn create_binding(&self, binding: Binding) -> Result<Binding, StoreError>;

    /// Replaces the binding, failing with [`StoreError::Conflict`] if the
    /// stored version differs from `binding.resource_version`.
    async fn update_binding(&self, binding: Binding) -> Result<Binding, StoreError>;

    async fn delete_binding(&self, id: &BindingId) -> Result<(), StoreError>;
}
