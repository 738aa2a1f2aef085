use std::collections::HashMap;

use crate::types::{Lever, StoreSize, Typology};

/// Structural model inputs, all required and strictly positive. "Propios"
/// counts the brand's own fixtures, "competencia" the competition's.
pub const STRUCTURAL_FEATURES: [&str; 8] = [
    "frentes_propios",
    "frentes_competencia",
    "sku_propios",
    "sku_competencia",
    "equipos_frio_propios",
    "equipos_frio_competencia",
    "puertas_propias",
    "puertas_competencia",
];

/// Recommended structural values for a typology and store size. These seed
/// the feature vector; user overrides replace individual entries.
pub fn recommended_defaults(typology: Typology, size: StoreSize) -> HashMap<String, f64> {
    // [frentes_p, frentes_c, sku_p, sku_c, frio_p, frio_c, puertas_p, puertas_c]
    let v: [f64; 8] = match (typology, size) {
        (Typology::SuperHiper, StoreSize::Mediano) => [4.0, 6.0, 12.0, 18.0, 1.0, 2.0, 2.0, 3.0],
        (Typology::SuperHiper, StoreSize::Grande) => [8.0, 10.0, 24.0, 30.0, 2.0, 3.0, 4.0, 6.0],
        (Typology::Conveniencia, StoreSize::Pequeno) => [2.0, 3.0, 6.0, 8.0, 1.0, 1.0, 1.0, 1.0],
        (Typology::Conveniencia, StoreSize::Mediano) => [3.0, 4.0, 9.0, 12.0, 1.0, 2.0, 2.0, 2.0],
        (Typology::Droguerias, StoreSize::Pequeno) => [1.0, 2.0, 4.0, 6.0, 1.0, 1.0, 1.0, 1.0],
        (Typology::Droguerias, StoreSize::Mediano) => [2.0, 3.0, 6.0, 9.0, 1.0, 2.0, 1.0, 2.0],
        // Combinations rejected by the compatibility check never reach here;
        // fall back to the smallest profile of the typology.
        (Typology::SuperHiper, StoreSize::Pequeno) => [4.0, 6.0, 12.0, 18.0, 1.0, 2.0, 2.0, 3.0],
        (Typology::Conveniencia, StoreSize::Grande) => [3.0, 4.0, 9.0, 12.0, 1.0, 2.0, 2.0, 2.0],
        (Typology::Droguerias, StoreSize::Grande) => [2.0, 3.0, 6.0, 9.0, 1.0, 2.0, 1.0, 2.0],
    };
    STRUCTURAL_FEATURES
        .iter()
        .zip(v)
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

/// Named numeric inputs for one model evaluation. Ephemeral — built per
/// scenario (treatment or control) and discarded with the request.
///
/// Invariant: every value is finite and ≥ 0; validation rejects the request
/// before a vector is ever constructed otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: HashMap<String, f64>,
}

impl FeatureVector {
    /// Assembles a scenario vector: recommended defaults, then user
    /// overrides, then the selected levers' indicator features at
    /// `indicator_value` (active magnitude for treatment, 0.0 for control).
    pub fn assemble(
        typology: Typology,
        size: StoreSize,
        overrides: &HashMap<String, f64>,
        levers: &[Lever],
        indicator_value: f64,
    ) -> Self {
        let mut values = recommended_defaults(typology, size);
        for (name, value) in overrides {
            values.insert(name.clone(), *value);
        }
        for lever in levers {
            values.insert(lever.indicator_feature.clone(), indicator_value);
        }
        Self { values }
    }

    pub fn get(&self, feature: &str) -> Option<f64> {
        self.values.get(feature).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
