#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod binding;
mod correlate;
pub mod gc;
mod identity;
mod metrics;
mod reconcile;
pub mod rules;
mod store;
pub mod sync;


pub use self::{
    binding::{Binding, BindingId, BindingSpec},
    correlate::{Correlator, DEFAULT_WINDOW, OWNER_LABEL},
    identity::{Cluster, Identity},
    metrics::Metrics,
    reconcile::{Error, Outcome, Reconciler},
    rules::{Grant, Rule, RuleSource},
    store::{Store, StoreError},
};

/// Annotation stamped on every binding this controller creates.
pub const MANAGED_BY_ANNOTATION: &str = "created-by-pod";

/// Expected value of [`MANAGED_BY_ANNOTATION`].
pub const MANAGED_BY_VALUE: &str = "rancher-operator-permissions-controller-manager";
