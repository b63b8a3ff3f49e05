//! Dose-rate conversion.
//!
//! Mass units go through mg/kg/h. Unit-count units only change their time
//! basis. Mass to unit-count is never attempted: the value comes back
//! unchanged, tagged as [`Conversion::Unsupported`].

use serde::{Deserialize, Serialize};

use super::{AmountBasis, DoseUnit, TimeBasis};

/// Outcome of a rate conversion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Conversion {
    Converted(f64),
    /// Mass and unit-count bases are not interchangeable; `value` is the input.
    Unsupported {
        value: f64,
        from: DoseUnit,
        to: DoseUnit,
    },
}

impl Conversion {
    /// The resulting number; the original input when unsupported.
    pub fn value(&self) -> f64 {
        match *self {
            Conversion::Converted(v) => v,
            Conversion::Unsupported { value, .. } => value,
        }
    }

    pub fn is_supported(&self) -> bool {
        matches!(self, Conversion::Converted(_))
    }
}

/// Convert a dose rate between units.
///
/// No rounding is applied.
pub fn convert(value: f64, from: DoseUnit, to: DoseUnit) -> Conversion {
    if from == to {
        return Conversion::Converted(value);
    }

    if from.is_mass() != to.is_mass() {
        tracing::warn!(
            from = %from,
            to = %to,
            value,
            "Unsupported dose conversion between mass and unit-count bases; value left unchanged"
        );
        return Conversion::Unsupported { value, from, to };
    }

    if !from.is_mass() {
        let per_hour = to_per_hour(value, from.time());
        return Conversion::Converted(from_per_hour(per_hour, to.time()));
    }

    Conversion::Converted(from_canonical(to_canonical(value, from), to))
}

/// Convert a mass-based rate to mg/kg/h.
fn to_canonical(value: f64, from: DoseUnit) -> f64 {
    let mg = match from.amount() {
        AmountBasis::Micrograms => value / 1000.0,
        _ => value,
    };
    to_per_hour(mg, from.time())
}

/// Convert a mg/kg/h value to a mass-based rate unit.
fn from_canonical(mg_per_kg_per_hour: f64, to: DoseUnit) -> f64 {
    let out = from_per_hour(mg_per_kg_per_hour, to.time());
    match to.amount() {
        AmountBasis::Micrograms => out * 1000.0,
        _ => out,
    }
}

fn to_per_hour(value: f64, time: TimeBasis) -> f64 {
    match time {
        TimeBasis::PerMinute => value * 60.0,
        TimeBasis::PerHour => value,
    }
}

fn from_per_hour(value: f64, time: TimeBasis) -> f64 {
    match time {
        TimeBasis::PerMinute => value / 60.0,
        TimeBasis::PerHour => value,
    }
}

/// Express a dose in mcg/kg/min.
pub fn to_mcg_per_kg_per_min(dose: f64, unit: DoseUnit) -> Conversion {
    convert(dose, unit, DoseUnit::McgPerKgPerMin)
}

/// Express a dose in mg/kg/h.
pub fn to_mg_per_kg_per_hour(dose: f64, unit: DoseUnit) -> Conversion {
    convert(dose, unit, DoseUnit::MgPerKgPerHour)
}

/// A vial or solution concentration given in mg/mL, with its mcg/mL equivalent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Concentration {
    pub mg_per_ml: f64,
    pub mcg_per_ml: f64,
}

impl Concentration {
    pub fn from_mg_per_ml(mg_per_ml: f64) -> Self {
        Self {
            mg_per_ml,
            mcg_per_ml: mg_per_ml * 1000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
    }

    #[test]
    fn test_identity() {
        assert_eq!(
            convert(3.7, DoseUnit::MgPerKgPerMin, DoseUnit::MgPerKgPerMin),
            Conversion::Converted(3.7)
        );
    }

    #[test]
    fn test_mass_conversions() {
        let v = convert(10.0, DoseUnit::McgPerKgPerMin, DoseUnit::MgPerKgPerHour).value();
        assert!(approx(v, 0.6));

        let v = convert(0.6, DoseUnit::MgPerKgPerHour, DoseUnit::McgPerKgPerMin).value();
        assert!(approx(v, 10.0));

        let v = convert(5.0, DoseUnit::McgPerKgPerHour, DoseUnit::McgPerKgPerMin).value();
        assert!(approx(v, 5.0 / 60.0));

        let v = convert(1.0, DoseUnit::MgPerKgPerMin, DoseUnit::McgPerKgPerHour).value();
        assert!(approx(v, 60_000.0));
    }

    #[test]
    fn test_unit_count_time_basis() {
        let v = convert(0.1, DoseUnit::UnitsPerKgPerHour, DoseUnit::UnitsPerKgPerMin);
        assert!(v.is_supported());
        assert!(approx(v.value(), 0.1 / 60.0));

        let v = convert(0.002, DoseUnit::UnitsPerKgPerMin, DoseUnit::UnitsPerKgPerHour);
        assert!(approx(v.value(), 0.12));
    }

    #[test]
    fn test_mass_to_unit_count_is_unsupported() {
        let result = convert(2.0, DoseUnit::McgPerKgPerMin, DoseUnit::UnitsPerKgPerHour);
        assert_eq!(
            result,
            Conversion::Unsupported {
                value: 2.0,
                from: DoseUnit::McgPerKgPerMin,
                to: DoseUnit::UnitsPerKgPerHour,
            }
        );
        assert_eq!(result.value(), 2.0);

        let back = convert(0.5, DoseUnit::UnitsPerKgPerMin, DoseUnit::MgPerKgPerHour);
        assert!(!back.is_supported());
        assert_eq!(back.value(), 0.5);
    }

    #[test]
    fn test_concentration() {
        let c = Concentration::from_mg_per_ml(0.05);
        assert!(approx(c.mcg_per_ml, 50.0));
    }
}
