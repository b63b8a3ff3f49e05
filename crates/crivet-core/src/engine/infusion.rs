//! Infusion calculator.
//!
//! Two modes share the unit pipeline:
//! - Direct infusion: dose + vial concentration → pump rate (mL/min, mL/h)
//! - Preparation: dose + chosen pump rate + vehicle volume → dilution recipe
//!
//! Both produce a step-by-step trace for clinical double-checking. Inputs are
//! not re-validated here; gate calls with [`direct_inputs_valid`] /
//! [`preparation_inputs_valid`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::EngineConfig;
use crate::models::Severity;
use crate::units::{
    convert, format_number as num, to_mcg_per_kg_per_min, AmountBasis, Concentration, DoseUnit,
};

/// Pump rates and derivation for a direct infusion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectInfusionResult {
    pub rate_ml_min: f64,
    pub rate_ml_hr: f64,
    pub steps: Vec<String>,
}

/// Inputs for a preparation (dilution) calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreparationRequest {
    pub dose: f64,
    pub unit: DoseUnit,
    pub weight_kg: f64,
    pub pump_rate_ml_hr: f64,
    pub vehicle_volume_ml: f64,
    /// Vial concentration in mg/mL (U/mL for unit-dosed drugs)
    pub vial_concentration: f64,
    /// Enables drug-specific checks (concentrate block, light protection)
    #[serde(default)]
    pub drug_id: Option<String>,
}

/// Two-step recipe used when the calculated draw is too small to measure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreDilutionRecipe {
    pub reason: String,
    /// Volume drawn from the original vial (mL)
    pub vial_draw_ml: f64,
    pub vial_concentration: f64,
    /// Diluent added to the vial draw (mL)
    pub diluent_ml: f64,
    /// Dilution factor (1:N)
    pub factor: u32,
    pub pre_diluted_concentration: f64,
    pub pre_diluted_volume_ml: f64,
    /// Volume of pre-diluted solution to put in the vehicle (mL)
    pub draw_from_pre_diluted_ml: f64,
    pub instructions: Vec<String>,
}

/// A physically possible preparation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreparationRecipe {
    /// Volume to draw into the vehicle (mL)
    pub drug_volume_ml: f64,
    pub diluent_volume_ml: f64,
    /// Final concentration (mg/mL, or U/mL)
    pub final_concentration: f64,
    /// Total drug in the vehicle (mg, or U)
    pub total_drug_amount: f64,
    /// Basis of `final_concentration` and `total_drug_amount`
    pub amount_basis: AmountBasis,
    pub pre_dilution: Option<PreDilutionRecipe>,
    pub light_protection_required: bool,
}

/// Reasons a preparation cannot be made.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PreparationError {
    #[error("Drug volume {drug_volume_ml} mL exceeds vehicle volume {vehicle_volume_ml} mL")]
    ImpossiblePreparation {
        drug_volume_ml: f64,
        vehicle_volume_ml: f64,
        final_concentration: f64,
        total_drug_amount: f64,
    },

    #[error("Vial concentration {concentration} is at or above the direct-CRI limit {limit} for {drug_id}")]
    ConcentrateNotAllowed {
        drug_id: String,
        concentration: f64,
        limit: f64,
    },
}

impl PreparationError {
    pub fn severity(&self) -> Severity {
        Severity::Critical
    }

    /// Banner title.
    pub fn title(&self) -> &'static str {
        match self {
            PreparationError::ImpossiblePreparation { .. } => "Impossible preparation",
            PreparationError::ConcentrateNotAllowed { .. } => {
                "BLOCKED: vial concentration not allowed for a direct CRI"
            }
        }
    }

    /// Banner guidance.
    pub fn message(&self) -> String {
        match self {
            PreparationError::ImpossiblePreparation { .. } => "The drug volume exceeds the vehicle volume. \
                 Reduce the dose, increase the vehicle volume, increase the pump rate \
                 (if clinically appropriate) or review the dose unit."
                .to_string(),
            PreparationError::ConcentrateNotAllowed {
                drug_id,
                concentration,
                limit,
            } => format!(
                "{} at {} per mL must be pre-diluted before preparing a CRI (limit: below {} per mL). \
                 Pre-dilute the ampoule, then enter the pre-diluted concentration as the vial concentration.",
                drug_id,
                num(*concentration, 2),
                num(*limit, 2)
            ),
        }
    }
}

/// Outcome of a preparation calculation; `steps` is kept on failure too.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparationResult {
    pub steps: Vec<String>,
    pub outcome: Result<PreparationRecipe, PreparationError>,
}

impl PreparationResult {
    pub fn recipe(&self) -> Option<&PreparationRecipe> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&PreparationError> {
        self.outcome.as_ref().err()
    }
}

fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Whether the inputs of a direct infusion are all strictly positive.
pub fn direct_inputs_valid(dose: f64, weight_kg: f64, concentration: f64) -> bool {
    positive(dose) && positive(weight_kg) && positive(concentration)
}

/// Whether the inputs of a preparation are all strictly positive.
pub fn preparation_inputs_valid(request: &PreparationRequest) -> bool {
    positive(request.dose)
        && positive(request.weight_kg)
        && positive(request.pump_rate_ml_hr)
        && positive(request.vehicle_volume_ml)
        && positive(request.vial_concentration)
}

/// Pump rate for infusing straight from the vial.
///
/// `concentration` is mg/mL, or U/mL when `unit` is unit-based.
pub fn calculate_direct_infusion(
    dose: f64,
    unit: DoseUnit,
    weight_kg: f64,
    concentration: f64,
) -> DirectInfusionResult {
    if !unit.is_mass() {
        return direct_infusion_units(dose, unit, weight_kg, concentration);
    }

    let mut steps = Vec::new();

    let dose_mcg_kg_min = to_mcg_per_kg_per_min(dose, unit).value();
    steps.push(format!(
        "Normalized dose: {} {} = {} mcg/kg/min",
        num(dose, 4),
        unit,
        num(dose_mcg_kg_min, 4)
    ));

    let total_mcg_min = dose_mcg_kg_min * weight_kg;
    steps.push(format!(
        "Total dose/min: {} × {} kg = {} mcg/min",
        num(dose_mcg_kg_min, 4),
        num(weight_kg, 1),
        num(total_mcg_min, 2)
    ));

    let total_mcg_hr = total_mcg_min * 60.0;
    steps.push(format!(
        "Total dose/h: {} × 60 = {} mcg/h",
        num(total_mcg_min, 2),
        num(total_mcg_hr, 2)
    ));

    let conc = Concentration::from_mg_per_ml(concentration);
    steps.push(format!(
        "Concentration: {} mg/mL = {} mcg/mL",
        num(conc.mg_per_ml, 4),
        num(conc.mcg_per_ml, 4)
    ));

    let rate_ml_min = total_mcg_min / conc.mcg_per_ml;
    steps.push(format!(
        "Rate (mL/min): {} ÷ {} = {} mL/min",
        num(total_mcg_min, 2),
        num(conc.mcg_per_ml, 4),
        num(rate_ml_min, 4)
    ));

    let rate_ml_hr = rate_ml_min * 60.0;
    steps.push(format!(
        "Rate (mL/h): {} × 60 = {} mL/h",
        num(rate_ml_min, 4),
        num(rate_ml_hr, 2)
    ));

    tracing::debug!(%unit, rate_ml_hr, "Direct infusion calculated");

    DirectInfusionResult {
        rate_ml_min,
        rate_ml_hr,
        steps,
    }
}

/// Direct infusion for unit-dosed drugs (concentration in U/mL).
fn direct_infusion_units(
    dose: f64,
    unit: DoseUnit,
    weight_kg: f64,
    concentration_u_ml: f64,
) -> DirectInfusionResult {
    let mut steps = Vec::new();

    let dose_u_kg_hr = convert(dose, unit, DoseUnit::UnitsPerKgPerHour).value();
    steps.push(format!(
        "Normalized dose: {} {} = {} U/kg/h",
        num(dose, 4),
        unit,
        num(dose_u_kg_hr, 4)
    ));

    let total_u_hr = dose_u_kg_hr * weight_kg;
    steps.push(format!(
        "Total dose/h: {} × {} kg = {} U/h",
        num(dose_u_kg_hr, 4),
        num(weight_kg, 1),
        num(total_u_hr, 4)
    ));

    steps.push(format!("Concentration: {} U/mL", num(concentration_u_ml, 4)));

    let rate_ml_hr = total_u_hr / concentration_u_ml;
    steps.push(format!(
        "Rate (mL/h): {} ÷ {} = {} mL/h",
        num(total_u_hr, 4),
        num(concentration_u_ml, 4),
        num(rate_ml_hr, 4)
    ));

    let rate_ml_min = rate_ml_hr / 60.0;
    steps.push(format!(
        "Rate (mL/min): {} ÷ 60 = {} mL/min",
        num(rate_ml_hr, 4),
        num(rate_ml_min, 4)
    ));

    tracing::debug!(%unit, rate_ml_hr, "Direct infusion calculated (unit-based)");

    DirectInfusionResult {
        rate_ml_min,
        rate_ml_hr,
        steps,
    }
}

/// Preparation recipe with default settings and no drug-specific checks.
pub fn calculate_preparation(
    dose: f64,
    unit: DoseUnit,
    weight_kg: f64,
    pump_rate_ml_hr: f64,
    vehicle_volume_ml: f64,
    vial_concentration: f64,
) -> PreparationResult {
    let request = PreparationRequest {
        dose,
        unit,
        weight_kg,
        pump_rate_ml_hr,
        vehicle_volume_ml,
        vial_concentration,
        drug_id: None,
    };
    calculate_preparation_with(&request, &EngineConfig::default())
}

/// Preparation recipe: how much drug and diluent to put in the vehicle.
pub fn calculate_preparation_with(
    request: &PreparationRequest,
    config: &EngineConfig,
) -> PreparationResult {
    let mut steps = Vec::new();
    let drug_id = request.drug_id.as_deref();

    if let Some(error) = drug_id.and_then(|id| check_concentrate(id, request.vial_concentration, config)) {
        tracing::warn!(drug_id, "Preparation blocked: concentrate not allowed for direct CRI");
        return PreparationResult {
            steps,
            outcome: Err(error),
        };
    }

    let light_protection_required = drug_id.is_some_and(|id| config.is_light_sensitive(id));

    let (hourly_unit, amount_basis) = if request.unit.is_mass() {
        (DoseUnit::MgPerKgPerHour, AmountBasis::Milligrams)
    } else {
        (DoseUnit::UnitsPerKgPerHour, AmountBasis::Units)
    };
    let amount = amount_label(amount_basis);

    let dose_per_kg_hr = convert(request.dose, request.unit, hourly_unit).value();
    steps.push(format!(
        "Normalized dose: {} {} = {} {}",
        num(request.dose, 4),
        request.unit,
        num(dose_per_kg_hr, 4),
        hourly_unit
    ));

    let dose_per_hr = dose_per_kg_hr * request.weight_kg;
    steps.push(format!(
        "Dose per hour: {} × {} kg = {} {}/h",
        num(dose_per_kg_hr, 4),
        num(request.weight_kg, 1),
        num(dose_per_hr, 4),
        amount
    ));

    let final_concentration = dose_per_hr / request.pump_rate_ml_hr;
    steps.push(format!(
        "Required concentration: {} ÷ {} mL/h = {} {}/mL",
        num(dose_per_hr, 4),
        num(request.pump_rate_ml_hr, 1),
        num(final_concentration, 4),
        amount
    ));

    let total_drug_amount = final_concentration * request.vehicle_volume_ml;
    steps.push(format!(
        "Total drug: {} × {} mL = {} {}",
        num(final_concentration, 4),
        num(request.vehicle_volume_ml, 2),
        num(total_drug_amount, 4),
        amount
    ));

    let drug_volume_ml = total_drug_amount / request.vial_concentration;
    steps.push(format!(
        "Volume to draw: {} ÷ {} {}/mL = {} mL",
        num(total_drug_amount, 4),
        num(request.vial_concentration, 4),
        amount,
        num(drug_volume_ml, 4)
    ));

    let impossible = |drug_volume_ml: f64| PreparationError::ImpossiblePreparation {
        drug_volume_ml,
        vehicle_volume_ml: request.vehicle_volume_ml,
        final_concentration,
        total_drug_amount,
    };

    if drug_volume_ml > 0.0 && drug_volume_ml < config.min_draw_volume_ml {
        let pre_dilution = build_pre_dilution(
            drug_volume_ml,
            request.vial_concentration,
            total_drug_amount,
            amount_basis,
            config,
        );
        steps.push(format!(
            "Calculated volume {} mL < minimum measurable ({} mL) → pre-dilution required",
            num(drug_volume_ml, 3),
            num(config.min_draw_volume_ml, 2)
        ));

        let draw_ml = pre_dilution.draw_from_pre_diluted_ml;
        if draw_ml > request.vehicle_volume_ml {
            return PreparationResult {
                steps,
                outcome: Err(impossible(draw_ml)),
            };
        }

        let diluent_volume_ml = request.vehicle_volume_ml - draw_ml;
        steps.push(format!(
            "Diluent volume: {} - {} = {} mL",
            num(request.vehicle_volume_ml, 2),
            num(draw_ml, 4),
            num(diluent_volume_ml, 4)
        ));
        if light_protection_required {
            steps.push(LIGHT_PROTECTION_STEP.to_string());
        }

        return PreparationResult {
            steps,
            outcome: Ok(PreparationRecipe {
                drug_volume_ml: draw_ml,
                diluent_volume_ml,
                final_concentration,
                total_drug_amount,
                amount_basis,
                pre_dilution: Some(pre_dilution),
                light_protection_required,
            }),
        };
    }

    if drug_volume_ml > request.vehicle_volume_ml {
        tracing::debug!(
            drug_volume_ml,
            vehicle_volume_ml = request.vehicle_volume_ml,
            "Preparation impossible: drug volume exceeds vehicle"
        );
        return PreparationResult {
            steps,
            outcome: Err(impossible(drug_volume_ml)),
        };
    }

    let diluent_volume_ml = request.vehicle_volume_ml - drug_volume_ml;
    steps.push(format!(
        "Diluent volume: {} - {} = {} mL",
        num(request.vehicle_volume_ml, 2),
        num(drug_volume_ml, 4),
        num(diluent_volume_ml, 4)
    ));
    if light_protection_required {
        steps.push(LIGHT_PROTECTION_STEP.to_string());
    }

    PreparationResult {
        steps,
        outcome: Ok(PreparationRecipe {
            drug_volume_ml,
            diluent_volume_ml,
            final_concentration,
            total_drug_amount,
            amount_basis,
            pre_dilution: None,
            light_protection_required,
        }),
    }
}

const LIGHT_PROTECTION_STEP: &str =
    "Light protection: shield the line and syringe/bag from light (photosensitive formulation)";

fn amount_label(basis: AmountBasis) -> &'static str {
    match basis {
        AmountBasis::Micrograms => "mcg",
        AmountBasis::Milligrams => "mg",
        AmountBasis::Units => "U",
    }
}

fn check_concentrate(
    drug_id: &str,
    vial_concentration: f64,
    config: &EngineConfig,
) -> Option<PreparationError> {
    let limit = config.concentrate_limit(drug_id)?;
    (vial_concentration >= limit).then(|| PreparationError::ConcentrateNotAllowed {
        drug_id: drug_id.to_string(),
        concentration: vial_concentration,
        limit,
    })
}

/// Pre-dilute 1 mL of vial so the final draw reaches the target volume.
fn build_pre_dilution(
    drug_volume_ml: f64,
    vial_concentration: f64,
    total_drug_amount: f64,
    amount_basis: AmountBasis,
    config: &EngineConfig,
) -> PreDilutionRecipe {
    let amount = amount_label(amount_basis);
    let target_ml = config
        .pre_dilution_target_ml
        .max(config.min_draw_volume_ml * 5.0);

    let needed = (target_ml / drug_volume_ml).ceil();
    let factor = if needed.is_finite() {
        (needed as u32).clamp(2, config.max_pre_dilution_factor)
    } else {
        config.max_pre_dilution_factor
    };

    let vial_draw_ml = 1.0;
    let diluent_ml = vial_draw_ml * f64::from(factor - 1);
    let pre_diluted_concentration = vial_concentration / f64::from(factor);
    let pre_diluted_volume_ml = vial_draw_ml + diluent_ml;
    let draw_from_pre_diluted_ml = total_drug_amount / pre_diluted_concentration;

    let instructions = vec![
        format!(
            "Draw {} mL from the vial ({} {}/mL)",
            num(vial_draw_ml, 1),
            num(vial_concentration, 4),
            amount
        ),
        format!(
            "Add {} mL of 0.9% NaCl → 1:{} solution = {} {}/mL",
            num(diluent_ml, 1),
            factor,
            num(pre_diluted_concentration, 4),
            amount
        ),
        format!(
            "From this solution, draw {} mL into the CRI syringe/bag",
            num(draw_from_pre_diluted_ml, 2)
        ),
        "Complete with diluent to the final vehicle volume".to_string(),
        "Label with final concentration and date/time".to_string(),
    ];

    PreDilutionRecipe {
        reason: format!(
            "Calculated volume ({} mL) is below the minimum accurately measurable volume ({} mL); \
             small volumes in large syringes can carry 40-100% error.",
            num(drug_volume_ml, 3),
            num(config.min_draw_volume_ml, 2)
        ),
        vial_draw_ml,
        vial_concentration,
        diluent_ml,
        factor,
        pre_diluted_concentration,
        pre_diluted_volume_ml,
        draw_from_pre_diluted_ml,
        instructions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_direct_infusion_mcg_per_min() {
        let result = calculate_direct_infusion(2.0, DoseUnit::McgPerKgPerMin, 10.0, 1.0);
        assert!(approx(result.rate_ml_min, 0.02));
        assert!(approx(result.rate_ml_hr, 1.2));
        assert_eq!(result.steps.len(), 6);
        assert_eq!(result.steps[0], "Normalized dose: 2 mcg/kg/min = 2 mcg/kg/min");
        assert_eq!(result.steps[5], "Rate (mL/h): 0.02 × 60 = 1.2 mL/h");
    }

    #[test]
    fn test_direct_infusion_mg_per_hour() {
        // 0.6 mg/kg/h = 10 mcg/kg/min; 20 kg → 200 mcg/min; 50 mg/mL → 0.004 mL/min
        let result = calculate_direct_infusion(0.6, DoseUnit::MgPerKgPerHour, 20.0, 50.0);
        assert!(approx(result.rate_ml_min, 0.004));
        assert!(approx(result.rate_ml_hr, 0.24));
    }

    #[test]
    fn test_direct_infusion_units() {
        // Insulin 0.1 U/kg/h, 5 kg, 1 U/mL → 0.5 mL/h
        let result = calculate_direct_infusion(0.1, DoseUnit::UnitsPerKgPerHour, 5.0, 1.0);
        assert!(approx(result.rate_ml_hr, 0.5));
        assert!(approx(result.rate_ml_min, 0.5 / 60.0));
        assert!(result.steps[0].contains("U/kg/h"));
    }

    #[test]
    fn test_preparation_recipe() {
        let result = calculate_preparation(2.0, DoseUnit::MgPerKgPerHour, 10.0, 5.0, 20.0, 10.0);
        let recipe = result.recipe().unwrap();
        assert!(approx(recipe.drug_volume_ml, 8.0));
        assert!(approx(recipe.diluent_volume_ml, 12.0));
        assert!(approx(recipe.final_concentration, 4.0));
        assert!(approx(recipe.total_drug_amount, 80.0));
        assert_eq!(recipe.amount_basis, AmountBasis::Milligrams);
        assert!(recipe.pre_dilution.is_none());
        assert!(!recipe.light_protection_required);
        assert_eq!(result.steps.len(), 6);
    }

    #[test]
    fn test_preparation_impossible_keeps_trace() {
        let result = calculate_preparation(10.0, DoseUnit::MgPerKgPerHour, 10.0, 1.0, 5.0, 1.0);
        match result.error() {
            Some(PreparationError::ImpossiblePreparation {
                drug_volume_ml,
                vehicle_volume_ml,
                ..
            }) => {
                assert!(approx(*drug_volume_ml, 500.0));
                assert!(approx(*vehicle_volume_ml, 5.0));
            }
            other => panic!("expected impossible preparation, got {:?}", other),
        }
        let error = result.error().unwrap();
        assert_eq!(error.severity(), Severity::Critical);
        assert_eq!(error.title(), "Impossible preparation");
        assert!(error.message().contains("vehicle volume"));
        assert_eq!(result.steps.len(), 5);
    }

    #[test]
    fn test_drug_volume_equal_to_vehicle_is_allowed() {
        // 1 mg/kg/h × 10 kg = 10 mg/h; /1 mL/h = 10 mg/mL; × 5 mL = 50 mg; /10 = 5 mL
        let result = calculate_preparation(1.0, DoseUnit::MgPerKgPerHour, 10.0, 1.0, 5.0, 10.0);
        let recipe = result.recipe().unwrap();
        assert!(approx(recipe.drug_volume_ml, 5.0));
        assert!(approx(recipe.diluent_volume_ml, 0.0));
    }

    #[test]
    fn test_pre_dilution_for_tiny_volume() {
        // Fentanyl 5 mcg/kg/h, 4 kg, 2 mL/h, 10 mL syringe, 0.05 mg/mL
        // 0.02 mg/h → 0.01 mg/mL → 0.1 mg → 2 mL: no pre-dilution
        let normal = calculate_preparation(5.0, DoseUnit::McgPerKgPerHour, 4.0, 2.0, 10.0, 0.05);
        assert!(normal.recipe().unwrap().pre_dilution.is_none());

        // Same with a 50 mg/mL vial: 0.1 mg / 50 = 0.002 mL
        let result = calculate_preparation(5.0, DoseUnit::McgPerKgPerHour, 4.0, 2.0, 10.0, 50.0);
        let recipe = result.recipe().unwrap();
        let pre = recipe.pre_dilution.as_ref().unwrap();
        assert_eq!(pre.factor, 100);
        assert!(approx(pre.diluent_ml, 99.0));
        assert!(approx(pre.pre_diluted_concentration, 0.5));
        assert!(approx(pre.draw_from_pre_diluted_ml, 0.2));
        assert!(approx(recipe.drug_volume_ml, 0.2));
        assert!(approx(recipe.diluent_volume_ml, 9.8));
        assert!(result.steps.iter().any(|s| s.contains("pre-dilution required")));
    }

    #[test]
    fn test_pre_dilution_factor_from_target() {
        // 0.1 mL draw → ceil(1.0 / 0.1) = 10
        // 1 mg/kg/h × 1 kg = 1 mg/h; /1 = 1 mg/mL; × 1 mL = 1 mg; /10 mg/mL = 0.1 mL
        let result = calculate_preparation(1.0, DoseUnit::MgPerKgPerHour, 1.0, 1.0, 1.0, 10.0);
        let pre = result.recipe().unwrap().pre_dilution.clone().unwrap();
        assert_eq!(pre.factor, 10);
        assert!(approx(pre.pre_diluted_concentration, 1.0));
        assert!(approx(pre.draw_from_pre_diluted_ml, 1.0));
        assert_eq!(pre.instructions.len(), 5);
    }

    #[test]
    fn test_pre_diluted_draw_exceeds_vehicle() {
        // 1 mg/h / 2 mL/h = 0.5 mg/mL; × 0.5 mL = 0.25 mg; /2.5 = 0.1 mL → 1:10
        // 0.25 mg / 0.25 mg/mL = 1 mL, more than the 0.5 mL vehicle
        let result = calculate_preparation(1.0, DoseUnit::MgPerKgPerHour, 1.0, 2.0, 0.5, 2.5);
        match result.error() {
            Some(PreparationError::ImpossiblePreparation {
                drug_volume_ml,
                vehicle_volume_ml,
                final_concentration,
                total_drug_amount,
            }) => {
                assert!(approx(*drug_volume_ml, 1.0));
                assert!(approx(*vehicle_volume_ml, 0.5));
                assert!(approx(*final_concentration, 0.5));
                assert!(approx(*total_drug_amount, 0.25));
            }
            other => panic!("expected impossible preparation, got {:?}", other),
        }
        assert!(result.steps.iter().any(|s| s.contains("pre-dilution required")));
        assert!(!result.steps.iter().any(|s| s.starts_with("Diluent volume")));
    }

    #[test]
    fn test_concentrate_block() {
        let request = PreparationRequest {
            dose: 0.001,
            unit: DoseUnit::UnitsPerKgPerMin,
            weight_kg: 20.0,
            pump_rate_ml_hr: 5.0,
            vehicle_volume_ml: 50.0,
            vial_concentration: 20.0,
            drug_id: Some("vasopressin".into()),
        };
        let result = calculate_preparation_with(&request, &EngineConfig::default());
        assert!(matches!(
            result.error(),
            Some(PreparationError::ConcentrateNotAllowed { limit, .. }) if *limit == 10.0
        ));
        assert!(result.steps.is_empty());

        let diluted = PreparationRequest {
            vial_concentration: 1.0,
            ..request
        };
        let result = calculate_preparation_with(&diluted, &EngineConfig::default());
        let recipe = result.recipe().unwrap();
        assert_eq!(recipe.amount_basis, AmountBasis::Units);
        // 0.06 U/kg/h × 20 = 1.2 U/h; /5 = 0.24 U/mL; × 50 = 12 U; /1 = 12 mL
        assert!(approx(recipe.drug_volume_ml, 12.0));
        assert!(approx(recipe.diluent_volume_ml, 38.0));
    }

    #[test]
    fn test_light_protection() {
        let request = PreparationRequest {
            dose: 2.0,
            unit: DoseUnit::MgPerKgPerHour,
            weight_kg: 10.0,
            pump_rate_ml_hr: 5.0,
            vehicle_volume_ml: 20.0,
            vial_concentration: 10.0,
            drug_id: Some("metoclopramide".into()),
        };
        let result = calculate_preparation_with(&request, &EngineConfig::default());
        assert!(result.recipe().unwrap().light_protection_required);
        assert_eq!(result.steps.last().map(String::as_str), Some(LIGHT_PROTECTION_STEP));
    }

    #[test]
    fn test_input_gates() {
        assert!(direct_inputs_valid(2.0, 10.0, 1.0));
        assert!(!direct_inputs_valid(2.0, 0.0, 1.0));
        assert!(!direct_inputs_valid(-1.0, 10.0, 1.0));
        assert!(!direct_inputs_valid(2.0, 10.0, f64::NAN));

        let mut request = PreparationRequest {
            dose: 2.0,
            unit: DoseUnit::MgPerKgPerHour,
            weight_kg: 10.0,
            pump_rate_ml_hr: 5.0,
            vehicle_volume_ml: 20.0,
            vial_concentration: 10.0,
            drug_id: None,
        };
        assert!(preparation_inputs_valid(&request));
        request.pump_rate_ml_hr = 0.0;
        assert!(!preparation_inputs_valid(&request));
    }
}
