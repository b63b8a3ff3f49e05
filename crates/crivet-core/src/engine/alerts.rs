//! Patient-specific drug alerts.
//!
//! Each drug key has two rule tiers. Profile rules win; the legacy tier is
//! consulted only when a drug has no profile rules at all.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::{Alert, DrugRule, ProfileRule};
use crate::patient::{ConditionFlag, FlagSet};

/// Rules registered for one drug key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrugRuleSet {
    pub profile: Vec<ProfileRule>,
    pub legacy: Vec<ProfileRule>,
}

/// Immutable-after-build table of alert rules keyed by drug key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleTable {
    rules: HashMap<String, DrugRuleSet>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a legacy-only table from flat rules.
    pub fn from_legacy(rules: impl IntoIterator<Item = DrugRule>) -> Self {
        let mut table = Self::new();
        for rule in rules {
            table.add_legacy(rule);
        }
        table
    }

    pub fn add_legacy(&mut self, rule: DrugRule) {
        self.rules.entry(rule.drug_id).or_default().legacy.push(ProfileRule {
            when: rule.when,
            alert: rule.alert,
        });
    }

    /// Register the rules declared by a drug profile.
    pub fn add_profile_rules(&mut self, drug_key: &str, rules: impl IntoIterator<Item = ProfileRule>) {
        self.rules
            .entry(drug_key.to_string())
            .or_default()
            .profile
            .extend(rules);
    }

    pub fn rules_for(&self, drug_key: &str) -> Option<&DrugRuleSet> {
        self.rules.get(drug_key)
    }

    pub fn drug_keys(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rules.values().map(|s| s.profile.len() + s.legacy.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Alerts for `drug_key` given the patient's flags, critical first.
    pub fn evaluate(&self, drug_key: &str, flags: &FlagSet) -> Vec<Alert> {
        evaluate_alerts(self, drug_key, flags)
    }
}

fn matches(when: &[ConditionFlag], flags: &FlagSet) -> bool {
    when.iter().all(|flag| flags.contains(flag))
}

/// Evaluate the rules for `drug_key`.
///
/// A rule fires when every flag it requires is present; extra flags are
/// ignored. Unknown drugs yield no alerts. Ordering is stable within a
/// severity.
pub fn evaluate_alerts(table: &RuleTable, drug_key: &str, flags: &FlagSet) -> Vec<Alert> {
    let Some(set) = table.rules_for(drug_key) else {
        return Vec::new();
    };

    let (rules, prefix) = if set.profile.is_empty() {
        (&set.legacy, format!("{drug_key}-legacy"))
    } else {
        (&set.profile, drug_key.to_string())
    };

    let mut alerts: Vec<Alert> = rules
        .iter()
        .filter(|rule| matches(&rule.when, flags))
        .enumerate()
        .map(|(idx, rule)| Alert::from_template(format!("{prefix}-{idx}"), &rule.alert))
        .collect();

    alerts.sort_by_key(|alert| alert.level.rank());

    tracing::debug!(
        drug_key,
        flags = flags.len(),
        alerts = alerts.len(),
        "Alerts evaluated"
    );
    alerts
}
