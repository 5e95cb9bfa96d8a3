use crate::{
    core::{Correlator, Metrics, Reconciler, RuleSource},
    k8s,
    sync::{Controller, Index, KubeStore},
};
use anyhow::{bail, Result};
use clap::Parser;
use kube::runtime::watcher;
use prometheus_client::registry::Registry;
use std::{num::NonZeroUsize, path::PathBuf};
use tokio::{sync::mpsc, time::Duration};
use tracing::{info, info_span, Instrument};

#[derive(Debug, Parser)]
#[clap(
    name = "permissions",
    about = "Binds Rancher users to the clusters they own"
)]
pub struct Args {
    #[clap(
        long,
        default_value = "permissions_controller=info,warn",
        env = "PERMISSIONS_CONTROLLER_LOG"
    )]
    log_level: kubert::LogFilter,

    #[clap(long, default_value = "plain")]
    log_format: kubert::LogFormat,

    #[clap(flatten)]
    client: kubert::ClientArgs,

    #[clap(flatten)]
    admin: kubert::AdminArgs,

    /// JSON list of `{"substring", "roleTemplate"}` rules.
    ///
    /// The built-in rules are used when the file is missing or malformed.
    #[clap(
        long,
        default_value = "/etc/permissions-controller/role-templates.json",
        env = "PERMISSIONS_CONTROLLER_RULES"
    )]
    rules_path: PathBuf,

    /// Number of consecutive username characters that must appear in a
    /// cluster's owner label for the user to be bound to it.
    #[clap(long, default_value = "5")]
    correlation_window: NonZeroUsize,

    /// Delay before retrying a reconciliation that failed.
    #[clap(long, default_value = "5000")]
    error_backoff_ms: u64,
}

impl Args {
    #[inline]
    pub async fn parse_and_run() -> Result<()> {
        Self::parse().run().await
    }

    pub async fn run(self) -> Result<()> {
        let Self {
            admin,
            client,
            log_level,
            log_format,
            rules_path,
            correlation_window,
            error_backoff_ms,
        } = self;

        let mut prom = <Registry>::default();
        let metrics = Metrics::register(prom.sub_registry_with_prefix("permissions"));

        let mut runtime = kubert::Runtime::builder()
            .with_log(log_level, log_format)
            .with_admin(admin.into_builder().with_prometheus(prom))
            .with_client(client)
            .build()
            .await?;

        // Watch events are turned into work by the index and processed by the
        // controller.
        let (work_tx, work_rx) = mpsc::unbounded_channel();
        let index = Index::shared(work_tx.clone());

        let users = runtime.watch_all::<k8s::User>(watcher::Config::default());
        tokio::spawn(kubert::index::cluster(index.clone(), users).instrument(info_span!("users")));

        let clusters = runtime.watch_all::<k8s::Cluster>(watcher::Config::default());
        tokio::spawn(kubert::index::cluster(index, clusters).instrument(info_span!("clusters")));

        let reconciler = Reconciler::new(
            KubeStore::new(runtime.client()),
            Correlator::new(correlation_window),
            RuleSource::file(&rules_path),
            metrics,
        );
        let controller = Controller::new(
            reconciler,
            work_tx,
            work_rx,
            Duration::from_millis(error_backoff_ms),
        );
        tokio::spawn(controller.run().instrument(info_span!("controller")));

        info!(
            rules = %rules_path.display(),
            %correlation_window,
            "Reconciling ClusterRoleTemplateBindings"
        );

        // Block the main thread on the shutdown signal.
        if runtime.run().await.is_err() {
            bail!("Aborted");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["permissions"]).unwrap();
        assert_eq!(args.correlation_window.get(), 5);
        assert_eq!(args.error_backoff_ms, 5000);
        assert_eq!(
            args.rules_path,
            PathBuf::from("/etc/permissions-controller/role-templates.json")
        );
    }

    #[test]
    fn overrides() {
        let args = Args::try_parse_from([
            "permissions",
            "--correlation-window=15",
            "--rules-path=/config/rules.json",
            "--error-backoff-ms=100",
        ])
        .unwrap();
        assert_eq!(args.correlation_window.get(), 15);
        assert_eq!(args.rules_path, PathBuf::from("/config/rules.json"));
        assert_eq!(args.error_backoff_ms, 100);
    }

    #[test]
    fn zero_window_is_rejected() {
        assert!(Args::try_parse_from(["permissions", "--correlation-window=0"]).is_err());
    }
}
