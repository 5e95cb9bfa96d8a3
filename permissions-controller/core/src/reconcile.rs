use crate::{
    binding, gc, rules,
    sync::{self, Changes},
    BindingId, Correlator, Metrics, RuleSource, Store, StoreError,
};
use tracing::{debug, info, instrument};

/// Brings one identity's bindings in line with the rules and clusters.
#[derive(Debug)]
pub struct Reconciler<S> {
    store: S,
    correlator: Correlator,
    rules: RuleSource,
    metrics: Metrics,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Another writer changed a binding during the pass. The whole pass should
    /// be run again.
    #[error("binding {0} was modified concurrently")]
    Conflict(BindingId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The identity no longer exists.
    Gone,

    /// The identity has no principal yet; nothing was written.
    Unprovisioned,

    Synced(Changes),

    /// The identity is being deleted; this many bindings were removed.
    Collected(usize),
}

// === impl Error ===

impl Error {
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

// === impl Outcome ===

impl Outcome {
    fn result_label(&self) -> &'static str {
        match self {
            Self::Gone | Self::Unprovisioned => "skipped",
            Self::Synced(_) => "synced",
            Self::Collected(_) => "collected",
        }
    }
}

// === impl Reconciler ===

impl<S: Store> Reconciler<S> {
    pub fn new(store: S, correlator: Correlator, rules: RuleSource, metrics: Metrics) -> Self {
        Self {
            store,
            correlator,
            rules,
            metrics,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Runs a full pass for the named identity.
    ///
    /// An identity that is marked for deletion has its bindings collected
    /// instead of synchronized.
    #[instrument(skip(self))]
    pub async fn reconcile(&self, identity: &str) -> Result<Outcome, Error> {
        let res = self.reconcile_inner(identity).await;
        self.record(&res);
        res
    }

    /// Deletes the bindings of an identity that no longer exists.
    #[instrument(skip(self))]
    pub async fn collect(&self, username: &str) -> Result<Outcome, Error> {
        let res = gc::collect(&self.store, username, &self.metrics)
            .await
            .map(Outcome::Collected);
        self.record(&res);
        res
    }

    async fn reconcile_inner(&self, name: &str) -> Result<Outcome, Error> {
        let Some(identity) = self.store.get_identity(name).await? else {
            debug!("Identity not found");
            return Ok(Outcome::Gone);
        };

        if identity.deleting {
            info!(username = %identity.username, "Identity is being deleted");
            let deleted = gc::collect(&self.store, &identity.username, &self.metrics).await?;
            return Ok(Outcome::Collected(deleted));
        }

        if identity.primary_principal().is_none() {
            debug!("Identity has no principals yet");
            return Ok(Outcome::Unprovisioned);
        }

        let rules = self.rules.load(&self.metrics);
        let grants = rules::resolve(&identity, &rules);
        if grants.is_empty() {
            info!(username = %identity.username, "No rules match identity");
            return Ok(Outcome::Synced(Changes::default()));
        }

        let clusters = self.store.list_clusters().await?;
        let correlated = self.correlator.correlate(&identity, &clusters);
        debug!(
            grants = grants.len(),
            clusters = correlated.len(),
            "Resolved grants"
        );

        let desired = binding::desired(&identity, &grants, &correlated);
        let changes = sync::synchronize(&self.store, desired, &self.metrics).await?;
        Ok(Outcome::Synced(changes))
    }

    fn record(&self, res: &Result<Outcome, Error>) {
        let result = match res {
            Ok(outcome) => outcome.result_label(),
            Err(e) if e.is_conflict() => "conflict",
            Err(_) => "error",
        };
        self.metrics.reconciled(result);
    }
}
