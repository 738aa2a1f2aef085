use crate::error::Result;
use crate::sim::coefficients::{CoefficientStore, INTERCEPT};
use crate::sim::features::FeatureVector;
use crate::types::Typology;

/// Evaluates the linear model for one scenario:
/// `Intercept + Σ coefficient[f] · vector[f]`.
///
/// A feature present in the vector but absent from the typology's
/// coefficient set contributes 0 rather than failing — the engine stays
/// tolerant of optional UI fields the model was not fitted on. The inverse
/// (a fitted coefficient with no vector entry) also contributes 0.
pub fn predict(
    store: &CoefficientStore,
    typology: Typology,
    vector: &FeatureVector,
) -> Result<f64> {
    let coefficients = store.coefficients_for(typology)?;
    let intercept = coefficients.get(INTERCEPT).copied().unwrap_or(0.0);

    let weighted: f64 = vector
        .iter()
        .filter(|(name, _)| *name != INTERCEPT)
        .map(|(name, value)| coefficients.get(name).copied().unwrap_or(0.0) * value)
        .sum();

    Ok(intercept + weighted)
}
