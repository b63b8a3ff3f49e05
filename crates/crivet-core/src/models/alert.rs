//! Clinical alert models.

use serde::{Deserialize, Serialize};

use crate::patient::ConditionFlag;

/// Alert severity. Declaration order is display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

impl Severity {
    /// Sort rank: critical=0, warning=1, info=2.
    pub fn rank(self) -> u8 {
        match self {
            Severity::Critical => 0,
            Severity::Warning => 1,
            Severity::Info => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

/// Alert content attached to a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertTemplate {
    pub level: Severity,
    pub title: String,
    /// One-line summary
    pub short: String,
    /// Rationale statements
    #[serde(default)]
    pub why: Vec<String>,
    /// Recommended actions
    #[serde(default)]
    pub actions: Vec<String>,
}

/// A rule that fires when every listed flag is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrugRule {
    pub drug_id: String,
    pub when: Vec<ConditionFlag>,
    pub alert: AlertTemplate,
}

/// A rule as declared inside a drug profile (drug id implied).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRule {
    pub when: Vec<ConditionFlag>,
    pub alert: AlertTemplate,
}

/// An alert produced for a specific drug and patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub level: Severity,
    pub title: String,
    pub short: String,
    pub why: Vec<String>,
    pub actions: Vec<String>,
}

impl Alert {
    pub fn from_template(id: String, template: &AlertTemplate) -> Self {
        Self {
            id,
            level: template.level,
            title: template.title.clone(),
            short: template.short.clone(),
            why: template.why.clone(),
            actions: template.actions.clone(),
        }
    }
}
