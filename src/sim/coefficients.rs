use std::collections::HashMap;

use crate::error::{AppError, Result};
use crate::types::Typology;

/// Name of the intercept term, present in every seeded coefficient set.
pub const INTERCEPT: &str = "Intercept";

/// Read-only store of OLS regression coefficients, one set per typology.
///
/// Populated once at startup from the `ols_coefficient` table and shared
/// immutably across concurrent simulation requests — single writer at
/// startup, many readers forever, no locking needed.
#[derive(Debug, Default)]
pub struct CoefficientStore {
    sets: HashMap<Typology, HashMap<String, f64>>,
}

impl CoefficientStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the full coefficient set for one typology. Startup-time
    /// only; the store is never mutated after loading.
    pub fn insert_set(&mut self, typology: Typology, coefficients: HashMap<String, f64>) {
        self.sets.insert(typology, coefficients);
    }

    /// The complete coefficient mapping for a typology, intercept included.
    pub fn coefficients_for(&self, typology: Typology) -> Result<&HashMap<String, f64>> {
        self.sets
            .get(&typology)
            .ok_or_else(|| AppError::UnknownTypology(typology.to_string()))
    }

    pub fn typology_count(&self) -> usize {
        self.sets.len()
    }

    /// True when every loaded set carries an intercept term. Checked once
    /// after loading; a set without an intercept is a seed-data defect.
    pub fn all_sets_have_intercept(&self) -> bool {
        self.sets.values().all(|s| s.contains_key(INTERCEPT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_set() -> HashMap<String, f64> {
        HashMap::from([
            (INTERCEPT.to_string(), 1_500_000.0),
            ("frentes_propios".to_string(), 45_000.0),
            ("sku_propios".to_string(), 12_000.0),
        ])
    }

    #[test]
    fn lookup_returns_seeded_set() {
        let mut store = CoefficientStore::new();
        store.insert_set(Typology::Conveniencia, sample_set());

        let set = store.coefficients_for(Typology::Conveniencia).unwrap();
        assert_eq!(set[INTERCEPT], 1_500_000.0);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn missing_typology_is_unknown_typology_error() {
        let store = CoefficientStore::new();
        let err = store.coefficients_for(Typology::Droguerias).unwrap_err();
        assert!(matches!(err, AppError::UnknownTypology(name) if name == "Droguerías"));
    }

    #[test]
    fn intercept_audit_flags_missing_intercept() {
        let mut store = CoefficientStore::new();
        store.insert_set(Typology::SuperHiper, sample_set());
        assert!(store.all_sets_have_intercept());

        store.insert_set(
            Typology::Droguerias,
            HashMap::from([("frentes_propios".to_string(), 1.0)]),
        );
        assert!(!store.all_sets_have_intercept());
    }
}
