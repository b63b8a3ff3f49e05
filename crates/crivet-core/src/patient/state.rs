//! Transient per-call patient attributes.

use serde::{Deserialize, Serialize};

use crate::models::Species;

/// Physiological life stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhysiologyStage {
    Neonate,
    Juvenile,
    Adult,
    Senior,
}

impl PhysiologyStage {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "neonate" | "neonato" => Some(PhysiologyStage::Neonate),
            "juvenile" | "puppy" | "kitten" | "filhote" => Some(PhysiologyStage::Juvenile),
            "adult" | "adulto" => Some(PhysiologyStage::Adult),
            "senior" | "geriatric" | "idoso" => Some(PhysiologyStage::Senior),
            _ => None,
        }
    }
}

/// Comorbidity groups captured at the bedside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comorbidity {
    Hepatic,
    Renal,
    Cardiac,
    Endocrine,
}

impl Comorbidity {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "hepatic" | "hepatopata" => Some(Comorbidity::Hepatic),
            "renal" | "renopata" => Some(Comorbidity::Renal),
            "cardiac" | "cardiopata" => Some(Comorbidity::Cardiac),
            "endocrine" | "endocrinopata" => Some(Comorbidity::Endocrine),
            _ => None,
        }
    }
}

/// Patient attributes relevant to dosing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientState {
    pub species: Species,
    pub physiology: PhysiologyStage,
    #[serde(default)]
    pub comorbidities: Vec<Comorbidity>,
}

impl PatientState {
    /// Create an adult patient with no comorbidities.
    pub fn new(species: Species) -> Self {
        Self {
            species,
            physiology: PhysiologyStage::Adult,
            comorbidities: Vec::new(),
        }
    }

    pub fn with_physiology(mut self, physiology: PhysiologyStage) -> Self {
        self.physiology = physiology;
        self
    }

    pub fn with_comorbidity(mut self, comorbidity: Comorbidity) -> Self {
        if !self.comorbidities.contains(&comorbidity) {
            self.comorbidities.push(comorbidity);
        }
        self
    }

    /// Condition flags for this patient.
    pub fn flags(&self) -> super::FlagSet {
        super::derive_flags(self.physiology, &self.comorbidities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_synonyms() {
        assert_eq!(PhysiologyStage::parse("Idoso"), Some(PhysiologyStage::Senior));
        assert_eq!(PhysiologyStage::parse("kitten"), Some(PhysiologyStage::Juvenile));
        assert_eq!(Comorbidity::parse("Cardiopata"), Some(Comorbidity::Cardiac));
        assert_eq!(Comorbidity::parse("dermatologic"), None);
    }

    #[test]
    fn test_builder_dedupes_comorbidities() {
        let patient = PatientState::new(Species::Cat)
            .with_comorbidity(Comorbidity::Renal)
            .with_comorbidity(Comorbidity::Renal);
        assert_eq!(patient.comorbidities, vec![Comorbidity::Renal]);
        assert_eq!(patient.physiology, PhysiologyStage::Adult);
    }
}
