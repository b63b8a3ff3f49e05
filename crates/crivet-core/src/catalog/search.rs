//! Fuzzy drug lookup by name, id or synonym.

use serde::{Deserialize, Serialize};
use strsim::{jaro_winkler, normalized_levenshtein};

use super::Catalog;

/// Minimum similarity for a drug to be returned.
const MIN_SCORE: f64 = 0.6;

/// A search match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub drug_id: String,
    pub name: String,
    /// Similarity (0.0 - 1.0)
    pub score: f64,
}

impl Catalog {
    /// Drugs whose name, id or synonyms resemble `query`, best first.
    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchHit> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }

        let mut hits: Vec<SearchHit> = self
            .drugs()
            .filter_map(|drug| {
                let mut names = vec![drug.id.to_lowercase(), drug.name.to_lowercase()];
                if let Some(profile) = self.profile(&drug.id) {
                    names.push(profile.name.to_lowercase());
                    names.push(profile.name_en.to_lowercase());
                    names.extend(profile.synonyms.iter().map(|s| s.to_lowercase()));
                }

                let score = names
                    .iter()
                    .filter(|n| !n.is_empty())
                    .map(|n| score_name(&query, n))
                    .fold(0.0, f64::max);

                (score >= MIN_SCORE).then(|| SearchHit {
                    drug_id: drug.id.clone(),
                    name: drug.name.clone(),
                    score,
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.drug_id.cmp(&b.drug_id))
        });
        hits.truncate(limit);
        hits
    }
}

fn score_name(query: &str, name: &str) -> f64 {
    if name == query || name.starts_with(query) {
        return 1.0;
    }
    if name.contains(query) {
        return 0.9;
    }
    fuzzy_match(query, name)
}

fn fuzzy_match(a: &str, b: &str) -> f64 {
    // Jaro-Winkler favours shared prefixes; Levenshtein overall similarity
    jaro_winkler(a, b) * 0.6 + normalized_levenshtein(a, b) * 0.4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_and_prefix() {
        let catalog = Catalog::builtin().unwrap();
        let hits = catalog.search("Ketamine", 5);
        assert_eq!(hits[0].drug_id, "ketamine");
        assert_eq!(hits[0].score, 1.0);

        let hits = catalog.search("dobu", 5);
        assert_eq!(hits[0].drug_id, "dobutamine");
    }

    #[test]
    fn test_typo() {
        let catalog = Catalog::builtin().unwrap();
        let hits = catalog.search("fentanil", 3);
        assert_eq!(hits[0].drug_id, "fentanyl");
    }

    #[test]
    fn test_synonym() {
        let catalog = Catalog::builtin().unwrap();
        let hits = catalog.search("cetamina", 3);
        assert_eq!(hits[0].drug_id, "ketamine");
    }

    #[test]
    fn test_empty_and_limit() {
        let catalog = Catalog::builtin().unwrap();
        assert!(catalog.search("   ", 5).is_empty());
        assert!(catalog.search("in", 2).len() <= 2);
        assert!(catalog.search("zzzzqqqq", 5).is_empty());
    }

    #[test]
    fn test_fuzzy_match_range() {
        assert!((fuzzy_match("abc", "abc") - 1.0).abs() < 1e-9);
        assert!(fuzzy_match("abc", "xyz") < 0.5);
    }
}
