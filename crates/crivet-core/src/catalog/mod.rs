//! Drug catalog: immutable registry of drugs, profiles and alert rules.
//!
//! Built once and shared read-only. The built-in reference data ships with
//! the crate as JSON resources.

mod search;

pub use search::*;

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use serde::Deserialize;
use thiserror::Error;

use crate::engine::{evaluate_alerts, RuleTable};
use crate::models::{Alert, Drug, DrugProfile, DrugRule};
use crate::patient::FlagSet;

/// Catalog errors.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Duplicate drug id: {0}")]
    DuplicateDrug(String),

    #[error("Duplicate profile for drug: {0}")]
    DuplicateProfile(String),

    #[error("Unknown drug: {0}")]
    UnknownDrug(String),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Serialized form accepted by [`Catalog::from_json`].
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CatalogDocument {
    drugs: Vec<Drug>,
    profiles: Vec<DrugProfile>,
    rules: Vec<DrugRule>,
}

static BUILTIN: OnceLock<Arc<Catalog>> = OnceLock::new();

const BUILTIN_DRUGS: &str = include_str!("../../resources/drugs.json");
const BUILTIN_PROFILES: &str = include_str!("../../resources/profiles.json");
const BUILTIN_RULES: &str = include_str!("../../resources/rules.json");

/// Read-only drug registry.
#[derive(Debug, Default)]
pub struct Catalog {
    drugs: BTreeMap<String, Drug>,
    profiles: BTreeMap<String, DrugProfile>,
    rules: RuleTable,
}

impl Catalog {
    /// Assemble a catalog.
    ///
    /// Profile doses fill in drugs that carry none, and profile alert rules
    /// are registered under the drug's rule key.
    pub fn new(
        drugs: Vec<Drug>,
        profiles: Vec<DrugProfile>,
        rules: Vec<DrugRule>,
    ) -> CatalogResult<Self> {
        let mut by_id: BTreeMap<String, Drug> = BTreeMap::new();
        for drug in drugs {
            if by_id.contains_key(&drug.id) {
                return Err(CatalogError::DuplicateDrug(drug.id));
            }
            by_id.insert(drug.id.clone(), drug);
        }

        let mut table = RuleTable::from_legacy(rules);
        let mut by_drug: BTreeMap<String, DrugProfile> = BTreeMap::new();
        for profile in profiles {
            if by_drug.contains_key(&profile.drug_id) {
                return Err(CatalogError::DuplicateProfile(profile.drug_id));
            }

            let rule_key = match by_id.get_mut(&profile.drug_id) {
                Some(drug) => {
                    if drug.doses.is_none() {
                        drug.doses = profile.doses.clone();
                    }
                    drug.rule_key().to_string()
                }
                None => {
                    tracing::warn!(drug_id = %profile.drug_id, "Profile has no matching drug");
                    profile.drug_id.clone()
                }
            };
            table.add_profile_rules(&rule_key, profile.alert_rules.iter().cloned());
            by_drug.insert(profile.drug_id.clone(), profile);
        }

        tracing::info!(
            drugs = by_id.len(),
            profiles = by_drug.len(),
            rules = table.len(),
            "Catalog assembled"
        );

        Ok(Self {
            drugs: by_id,
            profiles: by_drug,
            rules: table,
        })
    }

    /// Build a catalog from a `{ "drugs": [...], "profiles": [...], "rules": [...] }` document.
    pub fn from_json(json: &str) -> CatalogResult<Self> {
        let doc: CatalogDocument = serde_json::from_str(json)?;
        Self::new(doc.drugs, doc.profiles, doc.rules)
    }

    /// The built-in catalog, assembled on first use and shared afterwards.
    pub fn builtin() -> CatalogResult<Arc<Catalog>> {
        if let Some(catalog) = BUILTIN.get() {
            return Ok(Arc::clone(catalog));
        }
        let catalog = Arc::new(Self::load_builtin()?);
        Ok(Arc::clone(BUILTIN.get_or_init(|| catalog)))
    }

    fn load_builtin() -> CatalogResult<Self> {
        let drugs: Vec<Drug> = serde_json::from_str(BUILTIN_DRUGS)?;
        let profiles: Vec<DrugProfile> = serde_json::from_str(BUILTIN_PROFILES)?;
        let rules: Vec<DrugRule> = serde_json::from_str(BUILTIN_RULES)?;
        Self::new(drugs, profiles, rules)
    }

    pub fn drug(&self, id: &str) -> Option<&Drug> {
        self.drugs.get(id)
    }

    /// Like [`Catalog::drug`], but an unknown id is an error.
    pub fn require_drug(&self, id: &str) -> CatalogResult<&Drug> {
        self.drug(id)
            .ok_or_else(|| CatalogError::UnknownDrug(id.to_string()))
    }

    pub fn profile(&self, drug_id: &str) -> Option<&DrugProfile> {
        self.profiles.get(drug_id)
    }

    /// All drugs, ordered by id.
    pub fn drugs(&self) -> impl Iterator<Item = &Drug> {
        self.drugs.values()
    }

    pub fn profiles(&self) -> impl Iterator<Item = &DrugProfile> {
        self.profiles.values()
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.drugs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drugs.is_empty()
    }

    /// Alerts for a drug id, resolved through the drug's rule key.
    ///
    /// Unknown drugs are looked up by id and normally yield nothing.
    pub fn evaluate_alerts(&self, drug_id: &str, flags: &FlagSet) -> Vec<Alert> {
        let key = self.drug(drug_id).map_or(drug_id, Drug::rule_key);
        evaluate_alerts(&self.rules, key, flags)
    }
}
