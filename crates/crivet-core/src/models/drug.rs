//! Drug catalog models.

use serde::{Deserialize, Serialize};

use crate::units::{DoseUnit, IndicatedUnit};

use super::{Doses, Severity};

/// Patient species supported by the calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Species {
    Dog,
    Cat,
}

impl Species {
    /// Parse a species name, accepting common synonyms.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "dog" | "canine" | "cao" | "cão" => Some(Species::Dog),
            "cat" | "feline" | "gato" => Some(Species::Cat),
            _ => None,
        }
    }
}

/// Species an indicated dose applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeciesScope {
    Dog,
    Cat,
    Both,
}

impl SpeciesScope {
    pub fn includes(self, species: Species) -> bool {
        matches!(
            (self, species),
            (SpeciesScope::Both, _)
                | (SpeciesScope::Dog, Species::Dog)
                | (SpeciesScope::Cat, Species::Cat)
        )
    }
}

/// Delivery mode of a dose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DoseMode {
    /// Continuous rate infusion
    Cri,
    /// Single dose
    Bolus,
}

impl DoseMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "CRI" | "INFUSION" => Some(DoseMode::Cri),
            "BOLUS" => Some(DoseMode::Bolus),
            _ => None,
        }
    }
}

/// Inclusive numeric dose range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

/// Legacy indicated-dose entry, filtered by mode and species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatedDose {
    pub mode: DoseMode,
    pub species: SpeciesScope,
    pub unit: IndicatedUnit,
    pub range: Range,
    /// Clinical purpose (e.g., "Analgesia", "Anesthesia (ventilated)")
    pub purpose: String,
    #[serde(default)]
    pub note: Option<String>,
}

/// Infusion fluids a drug can be diluted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Diluent {
    /// 0.9% sodium chloride
    #[serde(rename = "NaCl_09")]
    Saline,
    /// Lactated Ringer's
    #[serde(rename = "RL")]
    LactatedRingers,
    /// 5% dextrose in water
    #[serde(rename = "D5W")]
    Dextrose5,
}

impl Diluent {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "NACL_09" | "NACL" | "SALINE" => Some(Diluent::Saline),
            "RL" | "LRS" => Some(Diluent::LactatedRingers),
            "D5W" => Some(Diluent::Dextrose5),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiluentStatus {
    Compatible,
    Avoid,
    Unknown,
}

impl DiluentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DiluentStatus::Compatible => "compatible",
            DiluentStatus::Avoid => "avoid",
            DiluentStatus::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiluentCompatibility {
    pub diluent: Diluent,
    pub label: String,
    pub status: DiluentStatus,
    pub reason: String,
}

/// An agent that must not be mixed with the drug.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incompatibility {
    pub name: String,
    pub severity: Severity,
    pub message: String,
}

/// Mixing and line compatibility data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrugCompatibility {
    pub diluents: Vec<DiluentCompatibility>,
    pub compatible_meds: Vec<String>,
    pub incompatibilities: Vec<Incompatibility>,
    /// PVC adsorption, dead space, etc.
    pub material_warnings: Vec<String>,
}

/// A drug available to the calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drug {
    /// Stable slug (e.g., "ketamine")
    pub id: String,
    /// Display name
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    /// Whether the drug is given as a CRI
    #[serde(default = "default_true")]
    pub has_cri: bool,
    /// Commercial concentrations (mg/mL, or U/mL for unit-dosed drugs)
    #[serde(default)]
    pub concentrations: Vec<f64>,
    #[serde(default)]
    pub compatibility: DrugCompatibility,
    #[serde(default)]
    pub recommended_unit: Option<DoseUnit>,
    #[serde(default)]
    pub recommended_unit_why: Vec<String>,
    /// Legacy indicated-dose list
    #[serde(default)]
    pub indicated_doses: Vec<IndicatedDose>,
    /// Structured per-species doses from the drug profile
    #[serde(default)]
    pub doses: Option<Doses>,
    /// Key into the alert rule table; defaults to `id`
    #[serde(default)]
    pub rule_key: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Drug {
    /// Create a new drug with required fields.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: None,
            has_cri: true,
            concentrations: Vec::new(),
            compatibility: DrugCompatibility::default(),
            recommended_unit: None,
            recommended_unit_why: Vec::new(),
            indicated_doses: Vec::new(),
            doses: None,
            rule_key: None,
        }
    }

    /// Key used to look up alert rules for this drug.
    pub fn rule_key(&self) -> &str {
        self.rule_key.as_deref().unwrap_or(&self.id)
    }

    /// Compatibility status of a diluent; unknown when not listed.
    pub fn diluent_status(&self, diluent: Diluent) -> DiluentStatus {
        self.compatibility
            .diluents
            .iter()
            .find(|d| d.diluent == diluent)
            .map(|d| d.status)
            .unwrap_or(DiluentStatus::Unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_species_scope() {
        assert!(SpeciesScope::Both.includes(Species::Cat));
        assert!(SpeciesScope::Dog.includes(Species::Dog));
        assert!(!SpeciesScope::Dog.includes(Species::Cat));
    }

    #[test]
    fn test_species_parse() {
        assert_eq!(Species::parse("Canine"), Some(Species::Dog));
        assert_eq!(Species::parse("gato"), Some(Species::Cat));
        assert_eq!(Species::parse("equine"), None);
    }

    #[test]
    fn test_dose_mode_parse() {
        assert_eq!(DoseMode::parse("cri"), Some(DoseMode::Cri));
        assert_eq!(DoseMode::parse(" Bolus "), Some(DoseMode::Bolus));
        assert_eq!(DoseMode::parse("PO"), None);
    }

    #[test]
    fn test_rule_key_defaults_to_id() {
        let mut drug = Drug::new("fentanyl", "Fentanyl");
        assert_eq!(drug.rule_key(), "fentanyl");
        drug.rule_key = Some("opioid".into());
        assert_eq!(drug.rule_key(), "opioid");
    }

    #[test]
    fn test_diluent_status() {
        let mut drug = Drug::new("dobutamine", "Dobutamine");
        drug.compatibility.diluents.push(DiluentCompatibility {
            diluent: Diluent::Dextrose5,
            label: "D5W".into(),
            status: DiluentStatus::Compatible,
            reason: "Stable for 24 h".into(),
        });

        assert_eq!(drug.diluent_status(Diluent::Dextrose5), DiluentStatus::Compatible);
        assert_eq!(drug.diluent_status(Diluent::Saline), DiluentStatus::Unknown);
    }

    #[test]
    fn test_diluent_parse() {
        assert_eq!(Diluent::parse("NaCl_09"), Some(Diluent::Saline));
        assert_eq!(Diluent::parse(" rl "), Some(Diluent::LactatedRingers));
        assert_eq!(Diluent::parse("d5w"), Some(Diluent::Dextrose5));
        assert_eq!(Diluent::parse("plasma"), None);
    }

    #[test]
    fn test_indicated_dose_from_json() {
        let json = r#"{
            "mode": "CRI",
            "species": "both",
            "unit": "mcg/kg/min",
            "range": { "min": 2, "max": 10 },
            "purpose": "Analgesia (microdose)"
        }"#;
        let dose: IndicatedDose = serde_json::from_str(json).unwrap();
        assert_eq!(dose.mode, DoseMode::Cri);
        assert_eq!(dose.range.max, 10.0);
        assert_eq!(dose.note, None);
    }
}
