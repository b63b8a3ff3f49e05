//! Indicated dose resolution.
//!
//! Resolution order:
//! 1. Structured per-species profile doses (canonical key, then first present key)
//! 2. Legacy indicated-dose list, filtered by mode and species
//! 3. None
//!
//! CRI ranges are converted into the caller's display unit; bolus ranges stay
//! in their native per-kg unit.

use serde::{Deserialize, Serialize};

use crate::models::{DoseMode, DoseRange, Drug, Severity, Species};
use crate::units::{convert, format_number, Conversion, DoseUnit, IndicatedUnit};

/// Where an indicated range came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeSource {
    Profile,
    Legacy,
}

/// An indicated dose range, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatedRange {
    pub min: f64,
    pub max: f64,
    /// Unit of `min`/`max`; the native unit when conversion was not possible
    pub unit: IndicatedUnit,
    pub purpose: String,
    pub note: Option<String>,
    pub source: RangeSource,
}

/// Outcome of comparing a dose against its indicated range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoseRangeAlert {
    pub severity: Severity,
    pub message: String,
}

/// Resolve the indicated range for `drug` in `species` and `mode`, expressed in `unit`.
pub fn resolve_indicated_dose(
    drug: &Drug,
    species: Species,
    mode: DoseMode,
    unit: DoseUnit,
) -> Option<IndicatedRange> {
    let resolved = from_profile(drug, species, mode, unit).or_else(|| from_legacy(drug, species, mode, unit));

    match &resolved {
        Some(range) => tracing::debug!(
            drug_id = %drug.id,
            source = ?range.source,
            min = range.min,
            max = range.max,
            "Indicated dose resolved"
        ),
        None => tracing::debug!(drug_id = %drug.id, ?species, ?mode, "No indicated dose"),
    }
    resolved
}

fn from_profile(
    drug: &Drug,
    species: Species,
    mode: DoseMode,
    unit: DoseUnit,
) -> Option<IndicatedRange> {
    let doses = drug.doses.as_ref()?;
    let species_doses = doses.for_species(species)?;

    match mode {
        DoseMode::Cri => {
            let cri = species_doses.cri.as_ref()?;
            let (native, range) = doses
                .unit_standard_cri
                .and_then(|standard| cri.range_for(standard).map(|r| (standard, r)))
                .or_else(|| cri.first_present())?;
            Some(rate_range(
                range.min,
                range.max,
                native,
                unit,
                "CRI".to_string(),
                range.note.clone(),
                RangeSource::Profile,
            ))
        }
        DoseMode::Bolus => {
            let bolus = species_doses.bolus.as_ref()?;
            let (basis, range) = bolus.first_present()?;
            Some(per_kg_range(range, IndicatedUnit::PerKg(basis)))
        }
    }
}

fn per_kg_range(range: &DoseRange, unit: IndicatedUnit) -> IndicatedRange {
    IndicatedRange {
        min: range.min,
        max: range.max,
        unit,
        purpose: "Bolus".to_string(),
        note: range.note.clone(),
        source: RangeSource::Profile,
    }
}

fn from_legacy(
    drug: &Drug,
    species: Species,
    mode: DoseMode,
    unit: DoseUnit,
) -> Option<IndicatedRange> {
    let dose = drug
        .indicated_doses
        .iter()
        .find(|d| d.mode == mode && d.species.includes(species))?;

    match (dose.mode, dose.unit) {
        (DoseMode::Cri, IndicatedUnit::Rate(native)) => Some(rate_range(
            dose.range.min,
            dose.range.max,
            native,
            unit,
            dose.purpose.clone(),
            dose.note.clone(),
            RangeSource::Legacy,
        )),
        _ => Some(IndicatedRange {
            min: dose.range.min,
            max: dose.range.max,
            unit: dose.unit,
            purpose: dose.purpose.clone(),
            note: dose.note.clone(),
            source: RangeSource::Legacy,
        }),
    }
}

/// Convert both bounds; on an unsupported pair keep native values and unit.
fn rate_range(
    min: f64,
    max: f64,
    native: DoseUnit,
    display: DoseUnit,
    purpose: String,
    note: Option<String>,
    source: RangeSource,
) -> IndicatedRange {
    let (min, max, unit) = match (convert(min, native, display), convert(max, native, display)) {
        (Conversion::Converted(lo), Conversion::Converted(hi)) => (lo, hi, display),
        _ => (min, max, native),
    };
    IndicatedRange {
        min,
        max,
        unit: IndicatedUnit::Rate(unit),
        purpose,
        note,
        source,
    }
}

/// Decimals shown for range boundaries; vasopressin limits go down to 0.0005.
const BOUNDARY_DECIMALS: usize = 4;

/// Compare a dose given in `unit` against its indicated range.
///
/// Non-positive doses and doses inside the range produce no alert. A range
/// in another unit (bolus per-kg, or a conversion that fell back to the
/// native unit) is not comparable and produces no alert either.
pub fn classify_dose(value: f64, unit: DoseUnit, range: &IndicatedRange) -> Option<DoseRangeAlert> {
    if value.is_nan() || value <= 0.0 {
        return None;
    }
    if range.unit != IndicatedUnit::Rate(unit) {
        tracing::debug!(%unit, range_unit = %range.unit, "Dose not comparable with indicated range");
        return None;
    }
    if value < range.min {
        return Some(DoseRangeAlert {
            severity: Severity::Warning,
            message: format!(
                "UNDERDOSE: below {} {} → dose may be insufficient. Reassess dose and titration.",
                format_number(range.min, BOUNDARY_DECIMALS),
                range.unit
            ),
        });
    }
    if value > range.max {
        return Some(DoseRangeAlert {
            severity: Severity::Critical,
            message: format!(
                "OVERDOSE: above {} {} → risk of serious adverse effects. Reassess dose immediately.",
                format_number(range.max, BOUNDARY_DECIMALS),
                range.unit
            ),
        });
    }
    None
}
