//! Drug profile: the full clinical knowledge record for a drug.
//!
//! Every section is optional so that partially written profiles can be
//! loaded and scored by the completeness validator.

use serde::{Deserialize, Serialize};

use crate::units::{AmountBasis, DoseUnit, IndicatedUnit};

use super::{ProfileRule, Species};

/// Dose range as written in a profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoseRange {
    pub min: f64,
    pub max: f64,
    #[serde(default)]
    pub note: Option<String>,
}

impl DoseRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            note: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Route {
    IV,
    IM,
    SC,
    PO,
}

/// Severity scale used by profile authors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProfileAlertLevel {
    Safe,
    Monitor,
    Warning,
    Critical,
    Block,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Mechanism {
    pub receptors_targets: Vec<String>,
    pub primary_effects: Vec<String>,
    pub clinical_metaphor: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pharmacodynamics {
    pub onset_iv: Option<String>,
    pub onset_im: Option<String>,
    pub peak: Option<String>,
    pub duration: Option<String>,
    pub dependencies: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pharmacokinetics {
    pub metabolism: Option<String>,
    pub excretion: Option<String>,
    pub dog_vs_cat: Option<String>,
    pub accumulation: Option<String>,
    pub active_metabolites: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormulationNotes {
    pub stability: Option<String>,
    pub equipment_adsorption: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConcepts {
    /// Two to five short sentences
    pub taglines: Vec<String>,
    pub mechanism: Option<Mechanism>,
    pub pharmacodynamics: Option<Pharmacodynamics>,
    pub pharmacokinetics: Option<Pharmacokinetics>,
    pub formulation_notes: Option<FormulationNotes>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeciesNote {
    pub key_point: Option<String>,
    pub high_risk_notes: Vec<String>,
    pub metabolism_excretion: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeciesNotes {
    pub dogs: Option<SpeciesNote>,
    pub cats: Option<SpeciesNote>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Indications {
    pub primary: Option<Vec<String>>,
    pub secondary: Option<Vec<String>>,
    pub off_label_notes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contraindication {
    pub condition: String,
    pub why: String,
    #[serde(default)]
    pub level: Option<ProfileAlertLevel>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contraindications {
    pub absolute: Option<Vec<Contraindication>>,
    pub relative: Vec<Contraindication>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BolusDoses {
    pub mgkg: Option<DoseRange>,
    pub mcgkg: Option<DoseRange>,
    pub ukg: Option<DoseRange>,
    pub route: Option<Route>,
    pub loading_dose: Option<DoseRange>,
}

impl BolusDoses {
    /// First defined bolus range, in mg, mcg, U order.
    pub fn first_present(&self) -> Option<(AmountBasis, &DoseRange)> {
        [
            (AmountBasis::Milligrams, &self.mgkg),
            (AmountBasis::Micrograms, &self.mcgkg),
            (AmountBasis::Units, &self.ukg),
        ]
        .into_iter()
        .find_map(|(basis, range)| range.as_ref().map(|r| (basis, r)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Titration {
    pub increment: String,
    pub interval: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CriDoses {
    pub mcgkgmin: Option<DoseRange>,
    pub mgkgh: Option<DoseRange>,
    pub mgkgmin: Option<DoseRange>,
    pub ukgh: Option<DoseRange>,
    pub ukgmin: Option<DoseRange>,
    pub titration: Option<Titration>,
    pub max: Option<f64>,
}

impl CriDoses {
    /// Range stored under the key matching `unit`.
    pub fn range_for(&self, unit: DoseUnit) -> Option<&DoseRange> {
        match unit {
            DoseUnit::McgPerKgPerMin => self.mcgkgmin.as_ref(),
            DoseUnit::MgPerKgPerHour => self.mgkgh.as_ref(),
            DoseUnit::MgPerKgPerMin => self.mgkgmin.as_ref(),
            DoseUnit::UnitsPerKgPerHour => self.ukgh.as_ref(),
            DoseUnit::UnitsPerKgPerMin => self.ukgmin.as_ref(),
            DoseUnit::McgPerKgPerHour => None,
        }
    }

    /// First defined range, in key precedence order.
    pub fn first_present(&self) -> Option<(DoseUnit, &DoseRange)> {
        [
            DoseUnit::McgPerKgPerMin,
            DoseUnit::MgPerKgPerHour,
            DoseUnit::MgPerKgPerMin,
            DoseUnit::UnitsPerKgPerHour,
            DoseUnit::UnitsPerKgPerMin,
        ]
        .into_iter()
        .find_map(|unit| self.range_for(unit).map(|r| (unit, r)))
    }

    /// Whether a mcg/kg/min or mg/kg/h range is defined.
    pub fn has_standard_range(&self) -> bool {
        self.mcgkgmin.is_some() || self.mgkgh.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoseAdjustments {
    pub obesity: Option<String>,
    pub shock: Option<String>,
    pub hypoalbuminemia: Option<String>,
    pub comorbidities: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeciesDoses {
    pub bolus: Option<BolusDoses>,
    pub cri: Option<CriDoses>,
    pub adjustments: Option<DoseAdjustments>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Doses {
    /// Standard CRI unit, e.g. "mcg/kg/min"
    pub unit_standard_cri: Option<DoseUnit>,
    pub dog: Option<SpeciesDoses>,
    pub cat: Option<SpeciesDoses>,
}

impl Doses {
    pub fn for_species(&self, species: Species) -> Option<&SpeciesDoses> {
        match species {
            Species::Dog => self.dog.as_ref(),
            Species::Cat => self.cat.as_ref(),
        }
    }
}

/// A commercial presentation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Presentation {
    pub label: String,
    pub concentration_mg_ml: Option<f64>,
    pub concentration_mcg_ml: Option<f64>,
    pub concentration_u_ml: Option<f64>,
    pub volume_ml: Option<f64>,
    pub examples: Vec<String>,
    /// Look-alike concentration pitfall
    pub concentration_trap_warning: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DilutionTarget {
    pub target_mg_ml: Option<f64>,
    pub target_mcg_ml: Option<f64>,
    pub target_u_ml: Option<f64>,
    pub use_cases: Vec<String>,
    pub how_to_make: String,
    /// e.g. "1 mL + 9 mL = 10 mg/mL"
    pub recipe: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stability {
    pub diluent: String,
    pub max_time_hours: Option<f64>,
    pub light_protection: bool,
    pub syringe_bag_change: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DilutionAndPreparation {
    pub hard_rules: Vec<String>,
    pub recommended_targets: Vec<DilutionTarget>,
    pub diluents_allowed: Vec<String>,
    pub preferred_diluent: Option<String>,
    pub stability: Vec<Stability>,
    pub dedicated_line_required: bool,
    pub dedicated_line_why: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncompatibleAgent {
    pub agent: String,
    pub why: String,
    /// "precipitation", "inactivation", "adsorption"
    #[serde(default)]
    pub risk: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileCompatibility {
    pub compatible_in_syringe_or_bag: Vec<String>,
    pub compatible_y_site_only: Vec<String>,
    pub incompatible: Vec<IncompatibleAgent>,
    pub avoid_same_syringe_or_precipitation_risk: Vec<String>,
    pub dedicated_line_rules: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoseAdjustmentHint {
    pub reduce_percent: Option<f64>,
    pub avoid_bolus: bool,
    pub require_central_line: bool,
    pub require_monitoring: Vec<String>,
    pub suggest_alternative: Option<String>,
}

/// Authoring-side comorbidity note (e.g., "hcm_feline", "ckd").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComorbidityAlert {
    pub key: String,
    pub level: ProfileAlertLevel,
    pub title: String,
    pub why: String,
    #[serde(default)]
    pub action: Vec<String>,
    #[serde(default)]
    pub dose_adjustment: Option<DoseAdjustmentHint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PresetLimits {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// A named dosing scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub id: String,
    pub label: String,
    pub dose: f64,
    pub unit: IndicatedUnit,
    #[serde(default)]
    pub limits: Option<PresetLimits>,
    #[serde(default)]
    pub clinical_target: Option<String>,
    #[serde(default)]
    pub linked_alerts: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculationTemplate {
    pub required_inputs: Vec<String>,
    pub algorithm: Vec<String>,
    pub conversions: Vec<String>,
    pub outputs: Vec<String>,
    pub error_cost: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculationTemplates {
    pub cri: Option<CalculationTemplate>,
    pub bolus: Option<CalculationTemplate>,
    pub dilution_builder: Option<CalculationTemplate>,
}

/// Complete drug profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrugProfile {
    // Identity
    pub drug_id: String,
    /// Local display name
    pub name: String,
    pub name_en: String,
    pub synonyms: Vec<String>,
    pub class: Vec<String>,

    pub core_concepts: Option<CoreConcepts>,
    pub species_notes: Option<SpeciesNotes>,

    pub indications: Option<Indications>,
    pub contraindications: Option<Contraindications>,

    pub doses: Option<Doses>,
    pub presentations: Vec<Presentation>,
    pub dilution_and_preparation: Option<DilutionAndPreparation>,
    pub compatibility: Option<ProfileCompatibility>,

    pub alerts_by_comorbidity: Vec<ComorbidityAlert>,
    /// Flag-matched alert rules; these take precedence over legacy rules
    pub alert_rules: Vec<ProfileRule>,
    pub presets: Vec<Preset>,
    pub calculation_templates: Option<CalculationTemplates>,
}
