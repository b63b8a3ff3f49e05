//! Drug profile completeness validation.
//!
//! Scores a profile against the required-field schema in [`REQUIRED_FIELDS`].
//! Severity affects reporting and `is_valid`, not the score.

mod checks;

pub use checks::*;

use serde::{Deserialize, Serialize};

use crate::models::{DrugProfile, Severity, SpeciesDoses};

/// A required field the profile does not satisfy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingField {
    pub section: String,
    /// Dotted path of the field
    pub field: String,
    pub severity: Severity,
    pub description: String,
}

/// Result of validating a profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// True when no critical field is missing
    pub is_valid: bool,
    /// Share of satisfied checks, 0-100
    pub completeness: u8,
    pub missing: Vec<MissingField>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Validate a profile against the required-field schema.
pub fn validate_profile(profile: &DrugProfile) -> ValidationResult {
    let mut missing = Vec::new();
    let mut warnings = Vec::new();

    for field in REQUIRED_FIELDS {
        if (field.check)(profile) {
            continue;
        }
        missing.push(MissingField {
            section: field.section.to_string(),
            field: field.path.to_string(),
            severity: field.severity,
            description: field.description.to_string(),
        });
        if field.severity == Severity::Critical {
            warnings.push(format!(
                "Missing critical field: {} ({})",
                field.path, field.description
            ));
        }
    }

    let total = REQUIRED_FIELDS.len();
    let completeness = if total == 0 {
        100
    } else {
        ((total - missing.len()) as f64 / total as f64 * 100.0).round() as u8
    };

    let doses = profile.doses.as_ref();
    if !has_any_dose(doses.and_then(|d| d.dog.as_ref())) {
        warnings.push("Dog must have at least a bolus OR CRI dose defined".to_string());
    }
    if !has_any_dose(doses.and_then(|d| d.cat.as_ref())) {
        warnings.push("Cat must have at least a bolus OR CRI dose defined".to_string());
    }
    if profile
        .compatibility
        .as_ref()
        .map_or(true, |c| c.incompatible.is_empty())
    {
        warnings.push("No incompatibilities defined - verify this is correct".to_string());
    }

    let is_valid = !missing.iter().any(|m| m.severity == Severity::Critical);

    tracing::debug!(
        drug_id = %profile.drug_id,
        completeness,
        missing = missing.len(),
        is_valid,
        "Profile validated"
    );

    ValidationResult {
        is_valid,
        completeness,
        missing,
        warnings,
    }
}

fn has_any_dose(doses: Option<&SpeciesDoses>) -> bool {
    doses.is_some_and(|d| d.bolus.is_some() || d.cri.is_some())
}

/// Missing fields grouped by section, sections in order of first appearance.
pub fn missing_by_section(result: &ValidationResult) -> Vec<(&str, Vec<&MissingField>)> {
    let mut sections: Vec<(&str, Vec<&MissingField>)> = Vec::new();
    for field in &result.missing {
        match sections.iter_mut().find(|(s, _)| *s == field.section) {
            Some((_, fields)) => fields.push(field),
            None => sections.push((field.section.as_str(), vec![field])),
        }
    }
    sections
}

/// Plain-text validation report.
pub fn format_report(result: &ValidationResult) -> String {
    let mut report = String::new();
    report.push_str(&format!("Completeness: {}%\n", result.completeness));
    report.push_str(&format!(
        "Valid: {}\n",
        if result.is_valid { "YES" } else { "NO" }
    ));

    if !result.missing.is_empty() {
        report.push_str("\nMissing fields:\n");
        for (section, fields) in missing_by_section(result) {
            report.push_str(&format!("\n{}:\n", section));
            for field in fields {
                report.push_str(&format!(
                    "  [{}] {}: {}\n",
                    field.severity.as_str(),
                    field.field,
                    field.description
                ));
            }
        }
    }

    if !result.warnings.is_empty() {
        report.push_str("\nWarnings:\n");
        for warning in &result.warnings {
            report.push_str(&format!("  ! {}\n", warning));
        }
    }

    report
}
