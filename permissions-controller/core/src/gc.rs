//! Removes the bindings of a deleted identity.

use crate::{Error, Metrics, Store, StoreError};
use tracing::{debug, info};

/// Deletes every managed binding owned by `username` and returns how many were
/// deleted.
///
/// Bindings without the exact ownership annotation are left alone even if
/// they name the user. A binding that disappears before it can be deleted
/// counts as already collected.
pub async fn collect<S>(store: &S, username: &str, metrics: &Metrics) -> Result<usize, Error>
where
    S: Store + ?Sized,
{
    let owned = store
        .list_bindings()
        .await?
        .into_iter()
        .filter(|b| b.spec.owner_username == username && b.is_managed())
        .collect::<Vec<_>>();

    let mut deleted = 0;
    for binding in owned {
        match store.delete_binding(&binding.id).await {
            Ok(()) => {
                info!(binding = %binding.id, "Deleted binding");
                metrics.binding_deleted();
                deleted += 1;
            }
            Err(StoreError::NotFound) => {
                debug!(binding = %binding.id, "Binding already deleted");
            }
            Err(error) => return Err(error.into()),
        }
    }

    Ok(deleted)
}
