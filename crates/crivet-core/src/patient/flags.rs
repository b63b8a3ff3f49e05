//! Canonical condition flags used to match alert rules.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Comorbidity, PhysiologyStage};

/// A clinically relevant patient condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConditionFlag {
    Neonate,
    Geriatric,
    HepaticImpairment,
    HepaticShunt,
    RenalImpairment,
    CardiacFailure,
    EndocrineDiabetes,
    Sepsis,
    IntracranialHypertension,
    Glaucoma,
    UncontrolledSeizures,
}

impl ConditionFlag {
    pub fn as_str(self) -> &'static str {
        match self {
            ConditionFlag::Neonate => "neonate",
            ConditionFlag::Geriatric => "geriatric",
            ConditionFlag::HepaticImpairment => "hepatic-impairment",
            ConditionFlag::HepaticShunt => "hepatic-shunt",
            ConditionFlag::RenalImpairment => "renal-impairment",
            ConditionFlag::CardiacFailure => "cardiac-failure",
            ConditionFlag::EndocrineDiabetes => "endocrine-diabetes",
            ConditionFlag::Sepsis => "sepsis",
            ConditionFlag::IntracranialHypertension => "intracranial-hypertension",
            ConditionFlag::Glaucoma => "glaucoma",
            ConditionFlag::UncontrolledSeizures => "uncontrolled-seizures",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        const ALL: [ConditionFlag; 11] = [
            ConditionFlag::Neonate,
            ConditionFlag::Geriatric,
            ConditionFlag::HepaticImpairment,
            ConditionFlag::HepaticShunt,
            ConditionFlag::RenalImpairment,
            ConditionFlag::CardiacFailure,
            ConditionFlag::EndocrineDiabetes,
            ConditionFlag::Sepsis,
            ConditionFlag::IntracranialHypertension,
            ConditionFlag::Glaucoma,
            ConditionFlag::UncontrolledSeizures,
        ];
        let wanted = s.trim().to_lowercase();
        ALL.into_iter().find(|f| f.as_str() == wanted)
    }
}

impl fmt::Display for ConditionFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A duplicate-free set of flags.
pub type FlagSet = BTreeSet<ConditionFlag>;

/// Map physiology and comorbidities to condition flags.
pub fn derive_flags(physiology: PhysiologyStage, comorbidities: &[Comorbidity]) -> FlagSet {
    let mut flags = FlagSet::new();

    match physiology {
        PhysiologyStage::Neonate | PhysiologyStage::Juvenile => {
            flags.insert(ConditionFlag::Neonate);
        }
        PhysiologyStage::Senior => {
            flags.insert(ConditionFlag::Geriatric);
        }
        PhysiologyStage::Adult => {}
    }

    for comorbidity in comorbidities {
        flags.insert(match comorbidity {
            Comorbidity::Hepatic => ConditionFlag::HepaticImpairment,
            Comorbidity::Renal => ConditionFlag::RenalImpairment,
            Comorbidity::Cardiac => ConditionFlag::CardiacFailure,
            // Addison's is not distinguished from diabetes yet.
            Comorbidity::Endocrine => ConditionFlag::EndocrineDiabetes,
        });
    }

    flags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_senior_cardiac() {
        let flags = derive_flags(PhysiologyStage::Senior, &[Comorbidity::Cardiac]);
        let expected: FlagSet = [ConditionFlag::Geriatric, ConditionFlag::CardiacFailure]
            .into_iter()
            .collect();
        assert_eq!(flags, expected);
    }

    #[test]
    fn test_juvenile_maps_to_neonate() {
        let flags = derive_flags(PhysiologyStage::Juvenile, &[]);
        assert!(flags.contains(&ConditionFlag::Neonate));
        assert_eq!(flags.len(), 1);
    }

    #[test]
    fn test_adult_without_comorbidities_is_empty() {
        assert!(derive_flags(PhysiologyStage::Adult, &[]).is_empty());
    }

    #[test]
    fn test_order_independent_and_deduplicated() {
        let a = derive_flags(
            PhysiologyStage::Adult,
            &[Comorbidity::Renal, Comorbidity::Hepatic, Comorbidity::Renal],
        );
        let b = derive_flags(
            PhysiologyStage::Adult,
            &[Comorbidity::Hepatic, Comorbidity::Renal],
        );
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn test_endocrine_defaults_to_diabetes() {
        let flags = derive_flags(PhysiologyStage::Adult, &[Comorbidity::Endocrine]);
        assert!(flags.contains(&ConditionFlag::EndocrineDiabetes));
    }

    #[test]
    fn test_flag_labels_round_trip_through_parse() {
        assert_eq!(
            ConditionFlag::parse("cardiac-failure"),
            Some(ConditionFlag::CardiacFailure)
        );
        assert_eq!(ConditionFlag::parse("unknown"), None);
        let json = serde_json::to_string(&ConditionFlag::HepaticImpairment).unwrap();
        assert_eq!(json, "\"hepatic-impairment\"");
    }
}
