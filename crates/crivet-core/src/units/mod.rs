//! Dose-rate units and conversion.
//!
//! Handles:
//! - Weight-normalized rate units (mcg/kg/min, mg/kg/h, U/kg/h, ...)
//! - Per-kg bolus units (mcg/kg, mg/kg, U/kg)
//! - Conversion between rate units via a canonical mg/kg/h form

mod converter;
mod format;

pub use converter::*;
pub use format::*;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unit errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UnitError {
    #[error("Unknown dose unit: {0}")]
    Unknown(String),
}

pub type UnitResult<T> = Result<T, UnitError>;

/// What the numerator of a dose counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountBasis {
    /// Micrograms
    Micrograms,
    /// Milligrams
    Milligrams,
    /// Biological units (insulin, vasopressin)
    Units,
}

impl AmountBasis {
    /// Mass bases convert into each other; unit counts never convert to mass.
    pub fn is_mass(self) -> bool {
        matches!(self, AmountBasis::Micrograms | AmountBasis::Milligrams)
    }

    fn label(self) -> &'static str {
        match self {
            AmountBasis::Micrograms => "mcg",
            AmountBasis::Milligrams => "mg",
            AmountBasis::Units => "U",
        }
    }
}

/// Time denominator of a rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBasis {
    PerMinute,
    PerHour,
}

/// A weight-normalized infusion rate unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DoseUnit {
    McgPerKgPerMin,
    McgPerKgPerHour,
    MgPerKgPerMin,
    MgPerKgPerHour,
    UnitsPerKgPerMin,
    UnitsPerKgPerHour,
}

impl DoseUnit {
    /// Every rate unit, in the order offered to clinicians.
    pub const ALL: [DoseUnit; 6] = [
        DoseUnit::McgPerKgPerMin,
        DoseUnit::McgPerKgPerHour,
        DoseUnit::MgPerKgPerMin,
        DoseUnit::MgPerKgPerHour,
        DoseUnit::UnitsPerKgPerHour,
        DoseUnit::UnitsPerKgPerMin,
    ];

    /// Build a unit from its two bases.
    pub fn new(amount: AmountBasis, time: TimeBasis) -> Self {
        match (amount, time) {
            (AmountBasis::Micrograms, TimeBasis::PerMinute) => DoseUnit::McgPerKgPerMin,
            (AmountBasis::Micrograms, TimeBasis::PerHour) => DoseUnit::McgPerKgPerHour,
            (AmountBasis::Milligrams, TimeBasis::PerMinute) => DoseUnit::MgPerKgPerMin,
            (AmountBasis::Milligrams, TimeBasis::PerHour) => DoseUnit::MgPerKgPerHour,
            (AmountBasis::Units, TimeBasis::PerMinute) => DoseUnit::UnitsPerKgPerMin,
            (AmountBasis::Units, TimeBasis::PerHour) => DoseUnit::UnitsPerKgPerHour,
        }
    }

    pub fn amount(self) -> AmountBasis {
        match self {
            DoseUnit::McgPerKgPerMin | DoseUnit::McgPerKgPerHour => AmountBasis::Micrograms,
            DoseUnit::MgPerKgPerMin | DoseUnit::MgPerKgPerHour => AmountBasis::Milligrams,
            DoseUnit::UnitsPerKgPerMin | DoseUnit::UnitsPerKgPerHour => AmountBasis::Units,
        }
    }

    pub fn time(self) -> TimeBasis {
        match self {
            DoseUnit::McgPerKgPerMin | DoseUnit::MgPerKgPerMin | DoseUnit::UnitsPerKgPerMin => {
                TimeBasis::PerMinute
            }
            _ => TimeBasis::PerHour,
        }
    }

    /// True for mcg- and mg-based units.
    pub fn is_mass(self) -> bool {
        self.amount().is_mass()
    }

    /// Canonical label (e.g., "mcg/kg/min").
    pub fn as_str(self) -> &'static str {
        match self {
            DoseUnit::McgPerKgPerMin => "mcg/kg/min",
            DoseUnit::McgPerKgPerHour => "mcg/kg/h",
            DoseUnit::MgPerKgPerMin => "mg/kg/min",
            DoseUnit::MgPerKgPerHour => "mg/kg/h",
            DoseUnit::UnitsPerKgPerMin => "U/kg/min",
            DoseUnit::UnitsPerKgPerHour => "U/kg/h",
        }
    }
}

impl fmt::Display for DoseUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DoseUnit {
    type Err = UnitError;

    fn from_str(s: &str) -> UnitResult<Self> {
        let compact: String = s.split_whitespace().collect();
        let mut parts = compact.split('/');
        let (Some(amount), Some(kg), Some(time), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(UnitError::Unknown(s.to_string()));
        };
        if !kg.eq_ignore_ascii_case("kg") {
            return Err(UnitError::Unknown(s.to_string()));
        }
        let amount = parse_amount(amount).ok_or_else(|| UnitError::Unknown(s.to_string()))?;
        let time = match time.to_lowercase().as_str() {
            "min" => TimeBasis::PerMinute,
            "h" | "hr" | "hour" => TimeBasis::PerHour,
            _ => return Err(UnitError::Unknown(s.to_string())),
        };
        Ok(DoseUnit::new(amount, time))
    }
}

impl TryFrom<String> for DoseUnit {
    type Error = UnitError;

    fn try_from(value: String) -> UnitResult<Self> {
        value.parse()
    }
}

impl From<DoseUnit> for String {
    fn from(unit: DoseUnit) -> Self {
        unit.as_str().to_string()
    }
}

/// Unit attached to an indicated dose: a rate for CRI, a per-kg amount for bolus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum IndicatedUnit {
    Rate(DoseUnit),
    PerKg(AmountBasis),
}

impl fmt::Display for IndicatedUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatedUnit::Rate(unit) => f.write_str(unit.as_str()),
            IndicatedUnit::PerKg(amount) => write!(f, "{}/kg", amount.label()),
        }
    }
}

impl FromStr for IndicatedUnit {
    type Err = UnitError;

    fn from_str(s: &str) -> UnitResult<Self> {
        if let Ok(rate) = s.parse::<DoseUnit>() {
            return Ok(IndicatedUnit::Rate(rate));
        }
        let compact: String = s.split_whitespace().collect();
        match compact.split_once('/') {
            Some((amount, kg)) if kg.eq_ignore_ascii_case("kg") => parse_amount(amount)
                .map(IndicatedUnit::PerKg)
                .ok_or_else(|| UnitError::Unknown(s.to_string())),
            _ => Err(UnitError::Unknown(s.to_string())),
        }
    }
}

impl TryFrom<String> for IndicatedUnit {
    type Error = UnitError;

    fn try_from(value: String) -> UnitResult<Self> {
        value.parse()
    }
}

impl From<IndicatedUnit> for String {
    fn from(unit: IndicatedUnit) -> Self {
        unit.to_string()
    }
}

fn parse_amount(s: &str) -> Option<AmountBasis> {
    match s.to_lowercase().as_str() {
        "mcg" | "µg" | "ug" => Some(AmountBasis::Micrograms),
        "mg" => Some(AmountBasis::Milligrams),
        "u" | "iu" => Some(AmountBasis::Units),
        _ => None,
    }
}
