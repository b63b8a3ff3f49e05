//! Required-field schema for drug profiles.

use crate::models::{DrugProfile, Severity};

/// A single required-field check.
pub struct RequiredField {
    /// Dotted path into the profile
    pub path: &'static str,
    pub section: &'static str,
    pub severity: Severity,
    pub description: &'static str,
    pub check: fn(&DrugProfile) -> bool,
}

/// Checks in report order. Every check weighs the same in the completeness score.
pub static REQUIRED_FIELDS: &[RequiredField] = &[
    // Identity
    RequiredField {
        path: "drug_id",
        section: "Identity",
        severity: Severity::Critical,
        description: "Unique drug id (slug)",
        check: |p| !p.drug_id.trim().is_empty(),
    },
    RequiredField {
        path: "name",
        section: "Identity",
        severity: Severity::Critical,
        description: "Display name",
        check: |p| !p.name.trim().is_empty(),
    },
    RequiredField {
        path: "name_en",
        section: "Identity",
        severity: Severity::Warning,
        description: "English name",
        check: |p| !p.name_en.trim().is_empty(),
    },
    RequiredField {
        path: "class",
        section: "Identity",
        severity: Severity::Critical,
        description: "Pharmacological classes",
        check: |p| !p.class.is_empty(),
    },
    RequiredField {
        path: "core_concepts.taglines",
        section: "Core concepts",
        severity: Severity::Warning,
        description: "Taglines (2-5 short sentences)",
        check: |p| p.core_concepts.as_ref().is_some_and(|c| c.taglines.len() >= 2),
    },
    // Pharmacology
    RequiredField {
        path: "core_concepts.mechanism",
        section: "Mechanism of action",
        severity: Severity::Warning,
        description: "Mechanism of action",
        check: |p| p.core_concepts.as_ref().is_some_and(|c| c.mechanism.is_some()),
    },
    RequiredField {
        path: "core_concepts.pharmacodynamics",
        section: "Pharmacodynamics",
        severity: Severity::Info,
        description: "Onset, peak and duration of action",
        check: |p| {
            p.core_concepts
                .as_ref()
                .is_some_and(|c| c.pharmacodynamics.is_some())
        },
    },
    RequiredField {
        path: "core_concepts.pharmacokinetics",
        section: "Pharmacokinetics",
        severity: Severity::Warning,
        description: "Metabolism and excretion",
        check: |p| {
            p.core_concepts
                .as_ref()
                .is_some_and(|c| c.pharmacokinetics.is_some())
        },
    },
    RequiredField {
        path: "species_notes",
        section: "Species notes",
        severity: Severity::Warning,
        description: "Dog vs cat particulars",
        check: |p| {
            p.species_notes
                .as_ref()
                .is_some_and(|n| n.dogs.is_some() || n.cats.is_some())
        },
    },
    // Indications and contraindications
    RequiredField {
        path: "indications",
        section: "Indications",
        severity: Severity::Critical,
        description: "When to use the drug",
        check: |p| {
            p.indications
                .as_ref()
                .is_some_and(|i| i.primary.is_some() || i.secondary.is_some())
        },
    },
    RequiredField {
        path: "contraindications",
        section: "Contraindications",
        severity: Severity::Critical,
        description: "When NOT to use (absolute and relative)",
        check: |p| {
            p.contraindications
                .as_ref()
                .is_some_and(|c| c.absolute.is_some())
        },
    },
    // Doses
    RequiredField {
        path: "doses",
        section: "Doses",
        severity: Severity::Critical,
        description: "Doses for dog and cat",
        check: |p| p.doses.as_ref().is_some_and(|d| d.dog.is_some() && d.cat.is_some()),
    },
    RequiredField {
        path: "doses.unit_standard_cri",
        section: "Doses",
        severity: Severity::Critical,
        description: "Standard CRI unit",
        check: |p| p.doses.as_ref().is_some_and(|d| d.unit_standard_cri.is_some()),
    },
    RequiredField {
        path: "doses.dog.cri",
        section: "Doses - Dog",
        severity: Severity::Critical,
        description: "CRI doses for dogs",
        check: |p| {
            p.doses
                .as_ref()
                .and_then(|d| d.dog.as_ref())
                .and_then(|s| s.cri.as_ref())
                .is_some_and(|c| c.has_standard_range())
        },
    },
    RequiredField {
        path: "doses.cat.cri",
        section: "Doses - Cat",
        severity: Severity::Critical,
        description: "CRI doses for cats",
        check: |p| {
            p.doses
                .as_ref()
                .and_then(|d| d.cat.as_ref())
                .and_then(|s| s.cri.as_ref())
                .is_some_and(|c| c.has_standard_range())
        },
    },
    // Presentations
    RequiredField {
        path: "presentations",
        section: "Presentations",
        severity: Severity::Critical,
        description: "Available commercial concentrations",
        check: |p| !p.presentations.is_empty(),
    },
    // Dilution
    RequiredField {
        path: "dilution_and_preparation",
        section: "Dilution and preparation",
        severity: Severity::Critical,
        description: "Dilution and preparation rules",
        check: |p| p.dilution_and_preparation.is_some(),
    },
    RequiredField {
        path: "dilution_and_preparation.recommended_targets",
        section: "Dilution",
        severity: Severity::Warning,
        description: "Recommended target concentrations",
        check: |p| {
            p.dilution_and_preparation
                .as_ref()
                .is_some_and(|d| !d.recommended_targets.is_empty())
        },
    },
    // Compatibility
    RequiredField {
        path: "compatibility",
        section: "Compatibility",
        severity: Severity::Critical,
        description: "Incompatibilities (error blocking)",
        check: |p| p.compatibility.is_some(),
    },
    // Alerts, presets, templates
    RequiredField {
        path: "alerts_by_comorbidity",
        section: "Clinical alerts",
        severity: Severity::Warning,
        description: "Alerts for common comorbidities",
        check: |p| !p.alerts_by_comorbidity.is_empty(),
    },
    RequiredField {
        path: "presets",
        section: "Presets",
        severity: Severity::Warning,
        description: "Named presets per scenario",
        check: |p| !p.presets.is_empty(),
    },
    RequiredField {
        path: "calculation_templates",
        section: "Calculation templates",
        severity: Severity::Warning,
        description: "Calculation algorithms (CRI/bolus)",
        check: |p| {
            p.calculation_templates
                .as_ref()
                .is_some_and(|t| t.cri.is_some() || t.bolus.is_some())
        },
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_paths_unique() {
        let paths: HashSet<_> = REQUIRED_FIELDS.iter().map(|f| f.path).collect();
        assert_eq!(paths.len(), REQUIRED_FIELDS.len());
        assert_eq!(REQUIRED_FIELDS.len(), 22);
    }

    #[test]
    fn test_taglines_need_two() {
        let taglines = REQUIRED_FIELDS
            .iter()
            .find(|f| f.path == "core_concepts.taglines")
            .unwrap();
        let mut profile = DrugProfile {
            core_concepts: Some(crate::models::CoreConcepts {
                taglines: vec!["One".into()],
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(!(taglines.check)(&profile));

        if let Some(c) = profile.core_concepts.as_mut() {
            c.taglines.push("Two".into());
        }
        assert!((taglines.check)(&profile));
    }
}
