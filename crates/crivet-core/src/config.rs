//! Engine configuration.
//!
//! Thresholds are per-service tunables; defaults follow common small-animal
//! ICU practice.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Calculation thresholds and per-drug safety settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Smallest volume that can be drawn accurately (mL)
    pub min_draw_volume_ml: f64,
    /// Volume a pre-dilution should bring the draw up to (mL)
    pub pre_dilution_target_ml: f64,
    /// Largest pre-dilution factor suggested (1:N)
    pub max_pre_dilution_factor: u32,
    /// Vial concentration at or above which a direct CRI preparation is blocked, per drug id
    pub concentrate_limits: HashMap<String, f64>,
    /// Drugs whose line and bag must be protected from light
    pub light_sensitive_drugs: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let mut concentrate_limits = HashMap::new();
        // Vasopressin ampoules are 20 U/mL; CRI requires 0.1-1 U/mL.
        concentrate_limits.insert("vasopressin".to_string(), 10.0);

        Self {
            min_draw_volume_ml: 0.2,
            pre_dilution_target_ml: 1.0,
            max_pre_dilution_factor: 100,
            concentrate_limits,
            light_sensitive_drugs: vec!["metoclopramide".to_string()],
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON configuration. Missing fields take defaults.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every threshold is usable.
    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.min_draw_volume_ml.is_finite() && self.min_draw_volume_ml >= 0.0) {
            return Err(ConfigError::Invalid {
                field: "min_draw_volume_ml",
                reason: format!("must be >= 0, got {}", self.min_draw_volume_ml),
            });
        }
        if !(self.pre_dilution_target_ml.is_finite() && self.pre_dilution_target_ml > 0.0) {
            return Err(ConfigError::Invalid {
                field: "pre_dilution_target_ml",
                reason: format!("must be > 0, got {}", self.pre_dilution_target_ml),
            });
        }
        if self.max_pre_dilution_factor < 2 {
            return Err(ConfigError::Invalid {
                field: "max_pre_dilution_factor",
                reason: format!("must be >= 2, got {}", self.max_pre_dilution_factor),
            });
        }
        if let Some((drug, limit)) = self
            .concentrate_limits
            .iter()
            .find(|(_, limit)| !(limit.is_finite() && **limit > 0.0))
        {
            return Err(ConfigError::Invalid {
                field: "concentrate_limits",
                reason: format!("limit for {drug} must be > 0, got {limit}"),
            });
        }
        Ok(())
    }

    /// Concentration limit for a drug, if one is configured.
    pub fn concentrate_limit(&self, drug_id: &str) -> Option<f64> {
        self.concentrate_limits.get(drug_id).copied()
    }

    pub fn is_light_sensitive(&self, drug_id: &str) -> bool {
        self.light_sensitive_drugs.iter().any(|d| d == drug_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.min_draw_volume_ml, 0.2);
        assert_eq!(config.concentrate_limit("vasopressin"), Some(10.0));
        assert!(config.is_light_sensitive("metoclopramide"));
        assert!(!config.is_light_sensitive("ketamine"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EngineConfig::from_json(r#"{ "min_draw_volume_ml": 0.1 }"#).unwrap();
        assert_eq!(config.min_draw_volume_ml, 0.1);
        assert_eq!(config.max_pre_dilution_factor, 100);
        assert!(config.is_light_sensitive("metoclopramide"));
    }

    #[test]
    fn test_rejects_invalid_thresholds() {
        let err = EngineConfig::from_json(r#"{ "pre_dilution_target_ml": 0 }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "pre_dilution_target_ml",
                ..
            }
        ));

        let err = EngineConfig::from_json(r#"{ "concentrate_limits": { "x": -1 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(
            EngineConfig::from_json("{ not json"),
            Err(ConfigError::Json(_))
        ));
    }
}
