//! The role template rule table.
//!
//! Rules map a substring of a username to a Rancher role template. They are
//! read from a JSON file (usually a mounted ConfigMap) at the start of every
//! reconciliation and fall back to a built-in table when the file is missing
//! or malformed.

use crate::{Identity, Metrics};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, warn};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub substring: String,
    pub role_template: String,
}

/// A rule that applies to a particular identity.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Grant {
    pub substring: String,
    pub role_template: String,
}

/// Where the rule table comes from.
#[derive(Clone, Debug, Default)]
pub struct RuleSource {
    path: Option<PathBuf>,
}

const DEFAULT_RULES: &[(&str, &str)] = &[
    ("developer", "projects-create"),
    ("admin", "cluster-owner"),
    ("viewer", "projects-view"),
];

pub fn default_rules() -> Vec<Rule> {
    DEFAULT_RULES
        .iter()
        .map(|&(substring, role_template)| Rule::new(substring, role_template))
        .collect()
}

/// Returns every rule whose substring occurs in the identity's username, in
/// table order. Multiple rules may apply.
pub fn resolve(identity: &Identity, rules: &[Rule]) -> Vec<Grant> {
    let mut grants = Vec::<Grant>::new();
    for rule in rules {
        if !identity.username.contains(&rule.substring) {
            continue;
        }
        let grant = Grant {
            substring: rule.substring.clone(),
            role_template: rule.role_template.clone(),
        };
        if !grants.contains(&grant) {
            grants.push(grant);
        }
    }
    grants
}

// === impl Rule ===

impl Rule {
    pub fn new(substring: impl Into<String>, role_template: impl Into<String>) -> Self {
        Self {
            substring: substring.into(),
            role_template: role_template.into(),
        }
    }
}

// === impl RuleSource ===

impl RuleSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Always uses the built-in rules.
    pub fn builtin() -> Self {
        Self { path: None }
    }

    /// Loads the rule table.
    ///
    /// Never fails: an unreadable or unparseable file yields the built-in
    /// rules. A well-formed file replaces the built-in rules entirely.
    pub fn load(&self, metrics: &Metrics) -> Vec<Rule> {
        let Some(path) = self.path.as_ref() else {
            return default_rules();
        };

        let data = match std::fs::read(path) {
            Ok(data) => data,
            Err(error) => {
                warn!(path = %path.display(), %error, "Failed to read rules; using defaults");
                metrics.rule_table_fallback();
                return default_rules();
            }
        };

        match serde_json::from_slice::<Vec<Rule>>(&data) {
            Ok(rules) => {
                debug!(path = %path.display(), rules = rules.len(), "Loaded rules");
                rules
            }
            Err(error) => {
                warn!(path = %path.display(), %error, "Failed to parse rules; using defaults");
                metrics.rule_table_fallback();
                default_rules()
            }
        }
    }
}
