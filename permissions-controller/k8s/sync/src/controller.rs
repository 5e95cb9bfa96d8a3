use crate::Work;
use permissions_controller_core::{Reconciler, Store};
use std::sync::Arc;
use tokio::{
    sync::mpsc::{UnboundedReceiver, UnboundedSender},
    time,
};
use tracing::{debug, info, info_span, warn, Instrument};

/// Runs reconciliation passes for queued work.
///
/// Each item runs on its own task, so different users reconcile concurrently.
/// A pass that hits a write conflict is queued again right away; any other
/// failure is queued again after `backoff`.
pub struct Controller<S> {
    reconciler: Arc<Reconciler<S>>,
    work_tx: UnboundedSender<Work>,
    work_rx: UnboundedReceiver<Work>,
    backoff: time::Duration,
}

// === impl Controller ===

impl<S> Controller<S>
where
    S: Store + 'static,
{
    pub fn new(
        reconciler: Reconciler<S>,
        work_tx: UnboundedSender<Work>,
        work_rx: UnboundedReceiver<Work>,
        backoff: time::Duration,
    ) -> Self {
        Self {
            reconciler: Arc::new(reconciler),
            work_tx,
            work_rx,
            backoff,
        }
    }

    pub async fn run(mut self) {
        while let Some(work) = self.work_rx.recv().await {
            let span = match &work {
                Work::Reconcile(name) => info_span!("reconcile", user = %name),
                Work::Collect { name, .. } => info_span!("collect", user = %name),
            };
            tokio::spawn(
                process(
                    self.reconciler.clone(),
                    work,
                    self.work_tx.clone(),
                    self.backoff,
                )
                .instrument(span),
            );
        }
    }
}

async fn process<S: Store>(
    reconciler: Arc<Reconciler<S>>,
    work: Work,
    requeue: UnboundedSender<Work>,
    backoff: time::Duration,
) {
    let res = match &work {
        Work::Reconcile(name) => reconciler.reconcile(name).await,
        Work::Collect { username, .. } => reconciler.collect(username).await,
    };

    match res {
        Ok(outcome) => {
            debug!(?outcome);
            return;
        }
        Err(error) if error.is_conflict() => {
            info!(%error, "Conflict; reconciling again");
        }
        Err(error) => {
            warn!(%error, ?backoff, "Reconciliation failed");
            time::sleep(backoff).await;
        }
    }

    if requeue.send(work).is_err() {
        debug!("Controller stopped; dropping work");
    }
}
