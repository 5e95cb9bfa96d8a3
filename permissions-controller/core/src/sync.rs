//! Converges live bindings toward a desired set.

use crate::{Binding, Error, Metrics, Store, StoreError};
use tracing::{debug, info};

/// What a synchronization pass did.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Changes {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
}

/// Creates missing bindings and updates divergent ones.
///
/// Bindings that exist but are not in `desired` are never touched. An update
/// keeps everything on the live object except the converged fields, including
/// its version, so a concurrent write surfaces as [`Error::Conflict`].
pub async fn synchronize<S>(
    store: &S,
    desired: Vec<Binding>,
    metrics: &Metrics,
) -> Result<Changes, Error>
where
    S: Store + ?Sized,
{
    let mut changes = Changes::default();

    for binding in desired {
        let id = binding.id.clone();
        match store.get_binding(&id).await? {
            None => {
                match store.create_binding(binding).await {
                    Ok(_) => {}
                    Err(StoreError::AlreadyExists) => return Err(Error::Conflict(id)),
                    Err(error) => return Err(error.into()),
                }
                info!(binding = %id, "Created binding");
                metrics.binding_created();
                changes.created += 1;
            }

            Some(live) => {
                let changed = live.spec.changed_fields(&binding.spec);
                if changed.is_empty() {
                    debug!(binding = %id, "Binding is up to date");
                    changes.unchanged += 1;
                    continue;
                }

                let update = Binding {
                    spec: binding.spec,
                    ..live
                };
                match store.update_binding(update).await {
                    Ok(_) => {}
                    Err(StoreError::Conflict | StoreError::NotFound) => {
                        return Err(Error::Conflict(id))
                    }
                    Err(error) => return Err(error.into()),
                }
                info!(binding = %id, ?changed, "Updated binding");
                metrics.binding_updated();
                changes.updated += 1;
            }
        }
    }

    Ok(changes)
}
