use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::config::{LEVER_ACTIVE_VALUE, MULTIPLE_MODE_MIN_LEVERS, PCT_SCALE, SIMPLE_MODE_LEVERS};
use crate::error::{AppError, Result};
use crate::sim::coefficients::CoefficientStore;
use crate::sim::features::{FeatureVector, STRUCTURAL_FEATURES};
use crate::sim::{financials, predictor};
use crate::types::{Lever, LeverMode, SimulationRequest, SimulationResult, StoreSize, Typology};

// ---------------------------------------------------------------------------
// Lever catalog
// ---------------------------------------------------------------------------

/// Known levers keyed by wire name. Loaded from `lever_master` at startup
/// and read-only afterwards, same lifecycle as the coefficient store.
#[derive(Debug, Default)]
pub struct LeverCatalog {
    levers: HashMap<String, Lever>,
}

impl LeverCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, lever: Lever) {
        self.levers.insert(lever.name.clone(), lever);
    }

    pub fn get(&self, name: &str) -> Option<&Lever> {
        self.levers.get(name)
    }

    pub fn len(&self) -> usize {
        self.levers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levers.is_empty()
    }

    /// Resolves selected lever names, failing on the first unknown one.
    fn resolve(&self, names: &[String]) -> Result<Vec<Lever>> {
        names
            .iter()
            .map(|name| {
                self.levers
                    .get(name)
                    .cloned()
                    .ok_or_else(|| AppError::UnknownLever(name.clone()))
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Compatibility table
// ---------------------------------------------------------------------------

/// Which store sizes a typology supports. Fixed reference data: hypermarkets
/// have no small format, convenience stores and drugstores no large one.
pub fn size_allowed(typology: Typology, size: StoreSize) -> bool {
    matches!(
        (typology, size),
        (Typology::SuperHiper, StoreSize::Mediano | StoreSize::Grande)
            | (Typology::Conveniencia, StoreSize::Pequeno | StoreSize::Mediano)
            | (Typology::Droguerias, StoreSize::Pequeno | StoreSize::Mediano)
    )
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Validates a simulation request, assembles the treatment and control
/// feature vectors, and runs the prediction engine and financial calculator.
/// Stateless per request; the injected stores are read-only.
pub struct SimulationOrchestrator {
    store: Arc<CoefficientStore>,
    catalog: Arc<LeverCatalog>,
}

impl SimulationOrchestrator {
    pub fn new(store: Arc<CoefficientStore>, catalog: Arc<LeverCatalog>) -> Self {
        Self { store, catalog }
    }

    pub fn run(&self, request: &SimulationRequest) -> Result<SimulationResult> {
        self.validate(request)?;
        let levers = self.catalog.resolve(&request.levers)?;

        let treatment = FeatureVector::assemble(
            request.typology,
            request.store_size,
            &request.features,
            &levers,
            LEVER_ACTIVE_VALUE,
        );
        let control = FeatureVector::assemble(
            request.typology,
            request.store_size,
            &request.features,
            &levers,
            0.0,
        );

        let prediction_treatment = predictor::predict(&self.store, request.typology, &treatment)?;
        let prediction_control = predictor::predict(&self.store, request.typology, &control)?;

        debug!(
            typology = %request.typology,
            levers = request.levers.len(),
            prediction_treatment,
            prediction_control,
            "model evaluated"
        );

        Ok(financials::calculate(
            prediction_treatment,
            prediction_control,
            request.margin_pct,
            request.capex,
            request.monthly_fee,
        ))
    }

    /// Single validation pass. Collects every offending field so the caller
    /// can correct the request in one resubmission; nothing is computed and
    /// no feature vector is built unless this succeeds.
    fn validate(&self, request: &SimulationRequest) -> Result<()> {
        let mut fields: Vec<String> = Vec::new();

        let lever_count_ok = match request.lever_mode {
            LeverMode::Simple => request.levers.len() == SIMPLE_MODE_LEVERS,
            LeverMode::Multiple => request.levers.len() >= MULTIPLE_MODE_MIN_LEVERS,
        };
        if !lever_count_ok {
            fields.push(format!(
                "levers (mode {} got {})",
                request.lever_mode,
                request.levers.len()
            ));
        }

        if !size_allowed(request.typology, request.store_size) {
            fields.push(format!(
                "store_size ({} not offered for {})",
                request.store_size, request.typology
            ));
        } else if request.lever_mode == LeverMode::Multiple
            && request.store_size == StoreSize::Pequeno
        {
            // Small stores lack the floor space to run combined interventions.
            fields.push("store_size (multiple mode requires Mediano or Grande)".to_string());
        }

        if !(request.capex.is_finite() && request.capex >= 0.0) {
            fields.push("capex".to_string());
        }
        if !(request.monthly_fee.is_finite() && request.monthly_fee >= 0.0) {
            fields.push("monthly_fee".to_string());
        }
        if !(request.margin_pct.is_finite()
            && (0.0..=PCT_SCALE).contains(&request.margin_pct))
        {
            fields.push("margin_pct".to_string());
        }
        if !(request.exchange_rate.is_finite() && request.exchange_rate > 0.0) {
            fields.push("exchange_rate".to_string());
        }

        for (name, value) in &request.features {
            let required = STRUCTURAL_FEATURES.contains(&name.as_str());
            let ok = if required {
                value.is_finite() && *value > 0.0
            } else {
                value.is_finite() && *value >= 0.0
            };
            if !ok {
                fields.push(format!("features.{name}"));
            }
        }

        if fields.is_empty() {
            Ok(())
        } else {
            fields.sort();
            Err(AppError::validation(fields))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::coefficients::INTERCEPT;
    use crate::types::{Metric, Payback};

    fn test_store() -> Arc<CoefficientStore> {
        let mut store = CoefficientStore::new();
        store.insert_set(
            Typology::SuperHiper,
            HashMap::from([
                (INTERCEPT.to_string(), 1_500_000.0),
                ("frentes_propios".to_string(), 45_000.0),
                ("sku_propios".to_string(), 12_000.0),
                ("palanca_punta_gondola".to_string(), 180_000.0),
                ("palanca_metro_cuadrado".to_string(), 120_000.0),
            ]),
        );
        store.insert_set(
            Typology::Conveniencia,
            HashMap::from([
                (INTERCEPT.to_string(), 600_000.0),
                ("frentes_propios".to_string(), 20_000.0),
                ("palanca_punta_gondola".to_string(), 90_000.0),
            ]),
        );
        Arc::new(store)
    }

    fn test_catalog() -> Arc<LeverCatalog> {
        let mut catalog = LeverCatalog::new();
        catalog.insert(Lever {
            name: "Punta de góndola".to_string(),
            indicator_feature: "palanca_punta_gondola".to_string(),
        });
        catalog.insert(Lever {
            name: "Metro cuadrado".to_string(),
            indicator_feature: "palanca_metro_cuadrado".to_string(),
        });
        Arc::new(catalog)
    }

    fn orchestrator() -> SimulationOrchestrator {
        SimulationOrchestrator::new(test_store(), test_catalog())
    }

    fn valid_request() -> SimulationRequest {
        SimulationRequest {
            typology: Typology::SuperHiper,
            lever_mode: LeverMode::Simple,
            levers: vec!["Punta de góndola".to_string()],
            store_size: StoreSize::Mediano,
            features: HashMap::new(),
            capex: 89_180.0,
            monthly_fee: 20_000.0,
            margin_pct: 35.0,
            exchange_rate: 3_912.0,
        }
    }

    fn validation_fields(err: AppError) -> Vec<String> {
        match err {
            AppError::Validation { fields } => fields,
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn valid_simple_request_produces_result() {
        let result = orchestrator().run(&valid_request()).unwrap();
        // One active lever: treatment exceeds control by its coefficient.
        let delta = result.prediction_treatment - result.prediction_control;
        assert!((delta - 180_000.0).abs() < 1e-6);
        assert!(result.uplift_pct.value().unwrap() > 0.0);
    }

    #[test]
    fn multiple_mode_sums_lever_indicators() {
        let mut request = valid_request();
        request.lever_mode = LeverMode::Multiple;
        request.levers = vec![
            "Punta de góndola".to_string(),
            "Metro cuadrado".to_string(),
        ];
        let result = orchestrator().run(&request).unwrap();
        let delta = result.prediction_treatment - result.prediction_control;
        assert!((delta - 300_000.0).abs() < 1e-6);
    }

    #[test]
    fn simple_mode_rejects_zero_and_two_levers() {
        let mut request = valid_request();
        request.levers = vec![];
        let fields = validation_fields(orchestrator().run(&request).unwrap_err());
        assert!(fields.iter().any(|f| f.starts_with("levers")));

        let mut request = valid_request();
        request.levers = vec![
            "Punta de góndola".to_string(),
            "Metro cuadrado".to_string(),
        ];
        let fields = validation_fields(orchestrator().run(&request).unwrap_err());
        assert!(fields.iter().any(|f| f.starts_with("levers")));
    }

    #[test]
    fn multiple_mode_rejects_single_lever() {
        let mut request = valid_request();
        request.lever_mode = LeverMode::Multiple;
        let fields = validation_fields(orchestrator().run(&request).unwrap_err());
        assert!(fields.iter().any(|f| f.starts_with("levers")));
    }

    #[test]
    fn disallowed_size_for_typology_is_rejected() {
        let mut request = valid_request();
        request.store_size = StoreSize::Pequeno; // Super e hiper has no small format
        let fields = validation_fields(orchestrator().run(&request).unwrap_err());
        assert!(fields.iter().any(|f| f.starts_with("store_size")));
    }

    #[test]
    fn multiple_mode_rejects_small_stores() {
        let mut request = valid_request();
        request.typology = Typology::Conveniencia;
        request.store_size = StoreSize::Pequeno;
        request.lever_mode = LeverMode::Multiple;
        request.levers = vec![
            "Punta de góndola".to_string(),
            "Metro cuadrado".to_string(),
        ];
        let fields = validation_fields(orchestrator().run(&request).unwrap_err());
        assert!(fields.iter().any(|f| f.contains("multiple mode")));
    }

    #[test]
    fn bad_numeric_inputs_are_all_reported_at_once() {
        let mut request = valid_request();
        request.capex = -1.0;
        request.margin_pct = 140.0;
        request.exchange_rate = 0.0;
        request
            .features
            .insert("sku_propios".to_string(), 0.0); // required ⇒ strictly positive
        let fields = validation_fields(orchestrator().run(&request).unwrap_err());
        assert_eq!(
            fields,
            vec![
                "capex".to_string(),
                "exchange_rate".to_string(),
                "features.sku_propios".to_string(),
                "margin_pct".to_string(),
            ]
        );
    }

    #[test]
    fn non_finite_override_is_rejected() {
        let mut request = valid_request();
        request
            .features
            .insert("frentes_propios".to_string(), f64::NAN);
        let fields = validation_fields(orchestrator().run(&request).unwrap_err());
        assert_eq!(fields, vec!["features.frentes_propios".to_string()]);
    }

    #[test]
    fn optional_extra_feature_may_be_zero() {
        let mut request = valid_request();
        request
            .features
            .insert("campo_opcional_ui".to_string(), 0.0);
        assert!(orchestrator().run(&request).is_ok());
    }

    #[test]
    fn unknown_lever_is_its_own_error() {
        let mut request = valid_request();
        request.levers = vec!["Palanca fantasma".to_string()];
        let err = orchestrator().run(&request).unwrap_err();
        assert!(matches!(err, AppError::UnknownLever(name) if name == "Palanca fantasma"));
    }

    #[test]
    fn unseeded_typology_surfaces_unknown_typology() {
        let mut request = valid_request();
        request.typology = Typology::Droguerias;
        request.store_size = StoreSize::Mediano;
        let err = orchestrator().run(&request).unwrap_err();
        assert!(matches!(err, AppError::UnknownTypology(_)));
    }

    #[test]
    fn crushing_fee_yields_not_recoverable_payback() {
        let mut request = valid_request();
        request.monthly_fee = 2_518_022.66;
        let result = orchestrator().run(&request).unwrap();
        assert_eq!(result.payback_months, Payback::NotRecoverable);
        // ROI still resolves — deeply negative, but defined.
        assert!(result.roi.value().unwrap() < 0.0);
    }

    #[test]
    fn run_is_deterministic_for_identical_requests() {
        let orch = orchestrator();
        let request = valid_request();
        assert_eq!(orch.run(&request).unwrap(), orch.run(&request).unwrap());
    }

    #[test]
    fn uplift_is_value_not_nan_when_control_positive() {
        let result = orchestrator().run(&valid_request()).unwrap();
        match result.uplift_pct {
            Metric::Value(v) => assert!(v.is_finite()),
            Metric::NotApplicable => panic!("control prediction was positive"),
        }
    }
}
