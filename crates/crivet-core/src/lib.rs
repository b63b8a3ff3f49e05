//! Crivet Core Library
//!
//! Veterinary constant-rate-infusion (CRI) dose calculation with clinical
//! decision support for dogs and cats.
//!
//! # Architecture
//!
//! ```text
//!   Drug catalog (drugs, profiles, alert rules)        EngineConfig
//!          │                                                │
//!          ▼                                                ▼
//!   ┌──────────────┐   ┌──────────────────────────────────────────────┐
//!   │ DoseRange    │   │ Infusion calculator                          │
//!   │ advisor      │   │  direct: dose + vial → mL/min, mL/h          │
//!   │ (indicated   │   │  preparation: dose + pump + vehicle → recipe │
//!   │  range)      │   └──────────────────────┬───────────────────────┘
//!   └──────┬───────┘                          │
//!          │             Unit converter ◄─────┘
//!          ▼
//!   under/over-dose         Patient state ──► condition flags ──► Alert engine
//!   classification                                                  │
//!                                                                   ▼
//!                                                     severity-sorted alerts
//! ```
//!
//! # Core Principle
//!
//! **Nothing here blocks a clinician.** Alerts are advisory, failed
//! preparations come back as values with their trace, and unsupported unit
//! conversions are reported, never thrown.
//!
//! # Modules
//!
//! - [`units`]: Dose-rate units and conversion
//! - [`models`]: Domain types (Drug, DrugProfile, Alert, etc.)
//! - [`patient`]: Patient state and condition flags
//! - [`engine`]: Infusion calculator, dose-range advisor, alert engine
//! - [`validation`]: Drug profile completeness validation
//! - [`catalog`]: Immutable drug registry with built-in reference data
//! - [`config`]: Engine thresholds

pub mod catalog;
pub mod config;
pub mod engine;
pub mod models;
pub mod patient;
pub mod units;
pub mod validation;

// Re-export commonly used types
pub use catalog::{Catalog, CatalogError, SearchHit};
pub use config::EngineConfig;
pub use engine::{
    calculate_direct_infusion, calculate_preparation, calculate_preparation_with, classify_dose,
    evaluate_alerts, resolve_indicated_dose, DirectInfusionResult, DoseRangeAlert,
    IndicatedRange, PreparationError, PreparationRecipe, PreparationRequest, PreparationResult,
    RuleTable,
};
pub use models::{
    Alert, Diluent, DiluentStatus, DoseMode, Drug, DrugProfile, DrugRule, Severity, Species,
};
pub use patient::{derive_flags, Comorbidity, ConditionFlag, FlagSet, PatientState, PhysiologyStage};
pub use units::{convert, Conversion, DoseUnit, IndicatedUnit};
pub use validation::{format_report, validate_profile, ValidationResult};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::Arc;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum CrivetError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Catalog error: {0}")]
    CatalogError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<units::UnitError> for CrivetError {
    fn from(e: units::UnitError) -> Self {
        CrivetError::InvalidInput(e.to_string())
    }
}

impl From<CatalogError> for CrivetError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::UnknownDrug(id) => CrivetError::NotFound(format!("drug {}", id)),
            other => CrivetError::CatalogError(other.to_string()),
        }
    }
}

impl From<config::ConfigError> for CrivetError {
    fn from(e: config::ConfigError) -> Self {
        CrivetError::ConfigError(e.to_string())
    }
}

impl From<serde_json::Error> for CrivetError {
    fn from(e: serde_json::Error) -> Self {
        CrivetError::SerializationError(e.to_string())
    }
}

fn parse_unit(unit: &str) -> Result<DoseUnit, CrivetError> {
    Ok(unit.parse::<DoseUnit>()?)
}

fn parse_species(species: &str) -> Result<Species, CrivetError> {
    Species::parse(species)
        .ok_or_else(|| CrivetError::InvalidInput(format!("Unknown species: {}", species)))
}

fn parse_mode(mode: &str) -> Result<DoseMode, CrivetError> {
    DoseMode::parse(mode)
        .ok_or_else(|| CrivetError::InvalidInput(format!("Unknown dose mode: {}", mode)))
}

fn parse_diluent(diluent: &str) -> Result<Diluent, CrivetError> {
    Diluent::parse(diluent)
        .ok_or_else(|| CrivetError::InvalidInput(format!("Unknown diluent: {}", diluent)))
}

fn parse_flags(flags: &[String]) -> Result<FlagSet, CrivetError> {
    flags
        .iter()
        .map(|f| {
            ConditionFlag::parse(f)
                .ok_or_else(|| CrivetError::InvalidInput(format!("Unknown condition flag: {}", f)))
        })
        .collect()
}

fn parse_patient(physiology: &str, comorbidities: &[String]) -> Result<FlagSet, CrivetError> {
    let stage = PhysiologyStage::parse(physiology)
        .ok_or_else(|| CrivetError::InvalidInput(format!("Unknown physiology: {}", physiology)))?;
    let comorbidities = comorbidities
        .iter()
        .map(|c| {
            Comorbidity::parse(c)
                .ok_or_else(|| CrivetError::InvalidInput(format!("Unknown comorbidity: {}", c)))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(derive_flags(stage, &comorbidities))
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open the built-in catalog with default settings.
#[uniffi::export]
pub fn open_builtin() -> Result<Arc<CrivetCore>, CrivetError> {
    Ok(Arc::new(CrivetCore {
        catalog: Catalog::builtin()?,
        config: EngineConfig::default(),
    }))
}

/// Open the built-in catalog with a JSON engine configuration.
#[uniffi::export]
pub fn open_builtin_with_config(config_json: String) -> Result<Arc<CrivetCore>, CrivetError> {
    Ok(Arc::new(CrivetCore {
        catalog: Catalog::builtin()?,
        config: EngineConfig::from_json(&config_json)?,
    }))
}

/// Open a catalog supplied as JSON (`drugs`, `profiles`, `rules`).
#[uniffi::export]
pub fn open_catalog_json(
    catalog_json: String,
    config_json: Option<String>,
) -> Result<Arc<CrivetCore>, CrivetError> {
    let config = match config_json {
        Some(json) => EngineConfig::from_json(&json)?,
        None => EngineConfig::default(),
    };
    Ok(Arc::new(CrivetCore {
        catalog: Arc::new(Catalog::from_json(&catalog_json)?),
        config,
    }))
}

// =========================================================================
// Stateless Functions (exported to FFI)
// =========================================================================

/// Condition flags for a patient, in stable order.
#[uniffi::export]
pub fn derive_condition_flags(
    physiology: String,
    comorbidities: Vec<String>,
) -> Result<Vec<String>, CrivetError> {
    let flags = parse_patient(&physiology, &comorbidities)?;
    Ok(flags.into_iter().map(|f| f.as_str().to_string()).collect())
}

/// Whether dose, weight and concentration are all usable for a direct infusion.
#[uniffi::export]
pub fn direct_infusion_inputs_valid(dose: f64, weight_kg: f64, concentration: f64) -> bool {
    engine::direct_inputs_valid(dose, weight_kg, concentration)
}

/// Whether all preparation inputs are usable.
#[uniffi::export]
pub fn preparation_inputs_valid(
    dose: f64,
    weight_kg: f64,
    pump_rate_ml_hr: f64,
    vehicle_volume_ml: f64,
    vial_concentration: f64,
) -> bool {
    engine::preparation_inputs_valid(&PreparationRequest {
        dose,
        unit: DoseUnit::MgPerKgPerHour,
        weight_kg,
        pump_rate_ml_hr,
        vehicle_volume_ml,
        vial_concentration,
        drug_id: None,
    })
}

/// Validate a drug profile given as JSON.
#[uniffi::export]
pub fn validate_profile_json(profile_json: String) -> Result<FfiValidationResult, CrivetError> {
    let profile: DrugProfile = serde_json::from_str(&profile_json)?;
    Ok(validate_profile(&profile).into())
}

/// Plain-text completeness report for a drug profile given as JSON.
#[uniffi::export]
pub fn profile_report_json(profile_json: String) -> Result<String, CrivetError> {
    let profile: DrugProfile = serde_json::from_str(&profile_json)?;
    Ok(format_report(&validate_profile(&profile)))
}

/// Validation result for a drug profile given as JSON, serialized as pretty JSON.
#[uniffi::export]
pub fn validation_report_json(profile_json: String) -> Result<String, CrivetError> {
    let profile: DrugProfile = serde_json::from_str(&profile_json)?;
    Ok(validate_profile(&profile).to_json()?)
}

// =========================================================================
// Main API Object
// =========================================================================

/// Read-only calculator bound to a catalog and configuration.
#[derive(uniffi::Object)]
pub struct CrivetCore {
    catalog: Arc<Catalog>,
    config: EngineConfig,
}

impl CrivetCore {
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn indicated_range(
        &self,
        drug_id: &str,
        species: &str,
        mode: &str,
        unit: DoseUnit,
    ) -> Result<Option<IndicatedRange>, CrivetError> {
        let drug = self.catalog.require_drug(drug_id)?;
        Ok(resolve_indicated_dose(
            drug,
            parse_species(species)?,
            parse_mode(mode)?,
            unit,
        ))
    }
}

#[uniffi::export]
impl CrivetCore {
    // =========================================================================
    // Unit Operations
    // =========================================================================

    /// Convert a dose rate between units.
    pub fn convert_dose(
        &self,
        value: f64,
        from_unit: String,
        to_unit: String,
    ) -> Result<FfiConversion, CrivetError> {
        let conversion = convert(value, parse_unit(&from_unit)?, parse_unit(&to_unit)?);
        Ok(conversion.into())
    }

    // =========================================================================
    // Infusion Operations
    // =========================================================================

    /// Pump rate for infusing straight from the vial.
    pub fn calculate_direct_infusion(
        &self,
        dose: f64,
        unit: String,
        weight_kg: f64,
        concentration: f64,
    ) -> Result<FfiDirectInfusion, CrivetError> {
        let result = calculate_direct_infusion(dose, parse_unit(&unit)?, weight_kg, concentration);
        Ok(result.into())
    }

    /// Dilution recipe for a syringe or bag.
    pub fn calculate_preparation(
        &self,
        dose: f64,
        unit: String,
        weight_kg: f64,
        pump_rate_ml_hr: f64,
        vehicle_volume_ml: f64,
        vial_concentration: f64,
        drug_id: Option<String>,
    ) -> Result<FfiPreparation, CrivetError> {
        let request = PreparationRequest {
            dose,
            unit: parse_unit(&unit)?,
            weight_kg,
            pump_rate_ml_hr,
            vehicle_volume_ml,
            vial_concentration,
            drug_id,
        };
        Ok(calculate_preparation_with(&request, &self.config).into())
    }

    // =========================================================================
    // Dose Range Operations
    // =========================================================================

    /// Indicated range for a drug, species and mode, expressed in `unit`.
    pub fn resolve_indicated_dose(
        &self,
        drug_id: String,
        species: String,
        mode: String,
        unit: String,
    ) -> Result<Option<FfiIndicatedRange>, CrivetError> {
        let range = self.indicated_range(&drug_id, &species, &mode, parse_unit(&unit)?)?;
        Ok(range.map(Into::into))
    }

    /// Compare a dose against the indicated range; `None` when within range, when no
    /// range is known, or when the range is not in `unit`.
    pub fn check_dose(
        &self,
        drug_id: String,
        species: String,
        mode: String,
        unit: String,
        value: f64,
    ) -> Result<Option<FfiDoseRangeAlert>, CrivetError> {
        let unit = parse_unit(&unit)?;
        let range = self.indicated_range(&drug_id, &species, &mode, unit)?;
        Ok(range
            .and_then(|r| classify_dose(value, unit, &r))
            .map(Into::into))
    }

    // =========================================================================
    // Alert Operations
    // =========================================================================

    /// Alerts for a drug given explicit condition flags, most severe first.
    pub fn evaluate_alerts(
        &self,
        drug_id: String,
        flags: Vec<String>,
    ) -> Result<Vec<FfiAlert>, CrivetError> {
        let flags = parse_flags(&flags)?;
        let alerts = self.catalog.evaluate_alerts(&drug_id, &flags);
        Ok(alerts.into_iter().map(Into::into).collect())
    }

    /// Alerts for a drug given patient physiology and comorbidities.
    pub fn evaluate_patient_alerts(
        &self,
        drug_id: String,
        physiology: String,
        comorbidities: Vec<String>,
    ) -> Result<Vec<FfiAlert>, CrivetError> {
        let flags = parse_patient(&physiology, &comorbidities)?;
        let alerts = self.catalog.evaluate_alerts(&drug_id, &flags);
        Ok(alerts.into_iter().map(Into::into).collect())
    }

    // =========================================================================
    // Catalog Operations
    // =========================================================================

    /// Get a drug by id.
    pub fn get_drug(&self, drug_id: String) -> Option<FfiDrug> {
        self.catalog.drug(&drug_id).map(Into::into)
    }

    /// All drugs, ordered by id.
    pub fn list_drugs(&self) -> Vec<FfiDrug> {
        self.catalog.drugs().map(Into::into).collect()
    }

    /// Search drugs by name, id or synonym.
    pub fn search_drugs(&self, query: String, limit: u32) -> Vec<FfiSearchHit> {
        self.catalog
            .search(&query, limit as usize)
            .into_iter()
            .map(Into::into)
            .collect()
    }

    /// Drug profile as JSON.
    pub fn get_profile_json(&self, drug_id: String) -> Result<Option<String>, CrivetError> {
        self.catalog
            .profile(&drug_id)
            .map(serde_json::to_string_pretty)
            .transpose()
            .map_err(Into::into)
    }

    /// Completeness of a catalog drug's profile.
    pub fn validate_drug_profile(&self, drug_id: String) -> Result<FfiValidationResult, CrivetError> {
        let profile = self
            .catalog
            .profile(&drug_id)
            .ok_or_else(|| CrivetError::NotFound(format!("profile for {}", drug_id)))?;
        Ok(validate_profile(profile).into())
    }

    /// Compatibility of a diluent with a catalog drug: "compatible", "avoid" or "unknown".
    pub fn diluent_status(&self, drug_id: String, diluent: String) -> Result<String, CrivetError> {
        let diluent = parse_diluent(&diluent)?;
        let drug = self.catalog.require_drug(&drug_id)?;
        Ok(drug.diluent_status(diluent).as_str().to_string())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe conversion outcome.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiConversion {
    pub value: f64,
    /// False when mass and unit-count bases were mixed; `value` is then the input
    pub supported: bool,
}

impl From<Conversion> for FfiConversion {
    fn from(c: Conversion) -> Self {
        Self {
            value: c.value(),
            supported: c.is_supported(),
        }
    }
}

/// FFI-safe direct infusion result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDirectInfusion {
    pub rate_ml_min: f64,
    pub rate_ml_hr: f64,
    pub steps: Vec<String>,
}

impl From<DirectInfusionResult> for FfiDirectInfusion {
    fn from(r: DirectInfusionResult) -> Self {
        Self {
            rate_ml_min: r.rate_ml_min,
            rate_ml_hr: r.rate_ml_hr,
            steps: r.steps,
        }
    }
}

/// FFI-safe pre-dilution sub-recipe.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPreDilution {
    pub reason: String,
    pub vial_draw_ml: f64,
    pub vial_concentration: f64,
    pub diluent_ml: f64,
    pub factor: u32,
    pub pre_diluted_concentration: f64,
    pub pre_diluted_volume_ml: f64,
    pub draw_from_pre_diluted_ml: f64,
    pub instructions: Vec<String>,
}

impl From<engine::PreDilutionRecipe> for FfiPreDilution {
    fn from(p: engine::PreDilutionRecipe) -> Self {
        Self {
            reason: p.reason,
            vial_draw_ml: p.vial_draw_ml,
            vial_concentration: p.vial_concentration,
            diluent_ml: p.diluent_ml,
            factor: p.factor,
            pre_diluted_concentration: p.pre_diluted_concentration,
            pre_diluted_volume_ml: p.pre_diluted_volume_ml,
            draw_from_pre_diluted_ml: p.draw_from_pre_diluted_ml,
            instructions: p.instructions,
        }
    }
}

/// FFI-safe banner for a failed preparation.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPreparationError {
    pub severity: String,
    pub title: String,
    pub message: String,
}

impl From<&PreparationError> for FfiPreparationError {
    fn from(e: &PreparationError) -> Self {
        Self {
            severity: e.severity().as_str().to_string(),
            title: e.title().to_string(),
            message: e.message(),
        }
    }
}

/// FFI-safe preparation result. Exactly one of `recipe` and `error` is set.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPreparation {
    pub steps: Vec<String>,
    pub recipe: Option<FfiPreparationRecipe>,
    pub error: Option<FfiPreparationError>,
}

/// FFI-safe preparation recipe.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPreparationRecipe {
    pub drug_volume_ml: f64,
    pub diluent_volume_ml: f64,
    pub final_concentration: f64,
    pub total_drug_amount: f64,
    /// "mg" or "U"
    pub amount_unit: String,
    pub pre_dilution: Option<FfiPreDilution>,
    pub light_protection_required: bool,
}

impl From<PreparationRecipe> for FfiPreparationRecipe {
    fn from(r: PreparationRecipe) -> Self {
        let amount_unit = if r.amount_basis.is_mass() { "mg" } else { "U" };
        Self {
            drug_volume_ml: r.drug_volume_ml,
            diluent_volume_ml: r.diluent_volume_ml,
            final_concentration: r.final_concentration,
            total_drug_amount: r.total_drug_amount,
            amount_unit: amount_unit.to_string(),
            pre_dilution: r.pre_dilution.map(Into::into),
            light_protection_required: r.light_protection_required,
        }
    }
}

impl From<PreparationResult> for FfiPreparation {
    fn from(r: PreparationResult) -> Self {
        let (recipe, error) = match r.outcome {
            Ok(recipe) => (Some(recipe.into()), None),
            Err(e) => (None, Some((&e).into())),
        };
        Self {
            steps: r.steps,
            recipe,
            error,
        }
    }
}

/// FFI-safe indicated range.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiIndicatedRange {
    pub min: f64,
    pub max: f64,
    pub unit: String,
    pub purpose: String,
    pub note: Option<String>,
    /// "profile" or "legacy"
    pub source: String,
}

impl From<IndicatedRange> for FfiIndicatedRange {
    fn from(r: IndicatedRange) -> Self {
        let source = match r.source {
            engine::RangeSource::Profile => "profile",
            engine::RangeSource::Legacy => "legacy",
        };
        Self {
            min: r.min,
            max: r.max,
            unit: r.unit.to_string(),
            purpose: r.purpose,
            note: r.note,
            source: source.to_string(),
        }
    }
}

/// FFI-safe dose range alert.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDoseRangeAlert {
    pub severity: String,
    pub message: String,
}

impl From<DoseRangeAlert> for FfiDoseRangeAlert {
    fn from(a: DoseRangeAlert) -> Self {
        Self {
            severity: a.severity.as_str().to_string(),
            message: a.message,
        }
    }
}

/// FFI-safe clinical alert.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAlert {
    pub id: String,
    pub level: String,
    pub title: String,
    pub short: String,
    pub why: Vec<String>,
    pub actions: Vec<String>,
}

impl From<Alert> for FfiAlert {
    fn from(a: Alert) -> Self {
        Self {
            id: a.id,
            level: a.level.as_str().to_string(),
            title: a.title,
            short: a.short,
            why: a.why,
            actions: a.actions,
        }
    }
}

/// FFI-safe drug summary.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDrug {
    pub id: String,
    pub name: String,
    pub category: Option<String>,
    pub has_cri: bool,
    pub concentrations: Vec<f64>,
    pub recommended_unit: Option<String>,
    pub recommended_unit_why: Vec<String>,
    pub has_profile_doses: bool,
}

impl From<&Drug> for FfiDrug {
    fn from(d: &Drug) -> Self {
        Self {
            id: d.id.clone(),
            name: d.name.clone(),
            category: d.category.clone(),
            has_cri: d.has_cri,
            concentrations: d.concentrations.clone(),
            recommended_unit: d.recommended_unit.map(String::from),
            recommended_unit_why: d.recommended_unit_why.clone(),
            has_profile_doses: d.doses.is_some(),
        }
    }
}

/// FFI-safe search hit.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSearchHit {
    pub drug_id: String,
    pub name: String,
    pub score: f64,
}

impl From<SearchHit> for FfiSearchHit {
    fn from(h: SearchHit) -> Self {
        Self {
            drug_id: h.drug_id,
            name: h.name,
            score: h.score,
        }
    }
}

/// FFI-safe missing profile field.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMissingField {
    pub section: String,
    pub field: String,
    pub severity: String,
    pub description: String,
}

/// FFI-safe validation result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiValidationResult {
    pub is_valid: bool,
    pub completeness: u8,
    pub missing: Vec<FfiMissingField>,
    pub warnings: Vec<String>,
}

impl From<ValidationResult> for FfiValidationResult {
    fn from(r: ValidationResult) -> Self {
        Self {
            is_valid: r.is_valid,
            completeness: r.completeness,
            missing: r
                .missing
                .into_iter()
                .map(|m| FfiMissingField {
                    section: m.section,
                    field: m.field,
                    severity: m.severity.as_str().to_string(),
                    description: m.description,
                })
                .collect(),
            warnings: r.warnings,
        }
    }
}
