use prometheus_client::{
    encoding::EncodeLabelSet,
    metrics::{counter::Counter, family::Family},
    registry::Registry,
};

/// Counters describing what the controller has done.
///
/// Cloned into every component that reports; clones share the same series.
#[derive(Clone, Debug)]
pub struct Metrics {
    binding_changes: Family<OpLabels, Counter>,
    reconciles: Family<ResultLabels, Counter>,
    rule_table_fallbacks: Counter,
}

#[derive(Clone, Hash, PartialEq, Eq, EncodeLabelSet, Debug)]
struct OpLabels {
    op: &'static str,
}

#[derive(Clone, Hash, PartialEq, Eq, EncodeLabelSet, Debug)]
struct ResultLabels {
    result: &'static str,
}

// === impl Metrics ===

impl Metrics {
    pub fn register(reg: &mut Registry) -> Self {
        let binding_changes = Family::<OpLabels, Counter>::default();
        reg.register(
            "binding_changes",
            "Total number of ClusterRoleTemplateBindings created, updated or deleted",
            binding_changes.clone(),
        );

        let reconciles = Family::<ResultLabels, Counter>::default();
        reg.register(
            "reconciles",
            "Total number of reconciliation passes, by result",
            reconciles.clone(),
        );

        let rule_table_fallbacks = Counter::default();
        reg.register(
            "rule_table_fallbacks",
            "Total number of times the built-in rule table was used because the rules file could not be loaded",
            rule_table_fallbacks.clone(),
        );

        Self {
            binding_changes,
            reconciles,
            rule_table_fallbacks,
        }
    }

    pub(crate) fn binding_created(&self) {
        self.binding_change("create").inc();
    }

    pub(crate) fn binding_updated(&self) {
        self.binding_change("update").inc();
    }

    pub(crate) fn binding_deleted(&self) {
        self.binding_change("delete").inc();
    }

    pub(crate) fn rule_table_fallback(&self) {
        self.rule_table_fallbacks.inc();
    }

    pub fn reconciled(&self, result: &'static str) {
        self.reconciles.get_or_create(&ResultLabels { result }).inc();
    }

    pub fn binding_changes(&self, op: &'static str) -> u64 {
        self.binding_change(op).get()
    }

    pub fn reconciles(&self, result: &'static str) -> u64 {
        self.reconciles.get_or_create(&ResultLabels { result }).get()
    }

    pub fn rule_table_fallbacks(&self) -> u64 {
        self.rule_table_fallbacks.get()
    }

    fn binding_change(&self, op: &'static str) -> Counter {
        self.binding_changes.get_or_create(&OpLabels { op }).clone()
    }
}
