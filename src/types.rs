use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Reference vocabulary
// ---------------------------------------------------------------------------

/// Store-format category. Each typology owns exactly one coefficient set.
/// Wire values keep the Spanish names used across the retail data warehouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Typology {
    #[serde(rename = "Super e hiper")]
    SuperHiper,
    #[serde(rename = "Conveniencia")]
    Conveniencia,
    #[serde(rename = "Droguerías")]
    Droguerias,
}

impl std::fmt::Display for Typology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Typology::SuperHiper => "Super e hiper",
            Typology::Conveniencia => "Conveniencia",
            Typology::Droguerias => "Droguerías",
        };
        write!(f, "{s}")
    }
}

impl Typology {
    pub const ALL: [Typology; 3] = [
        Typology::SuperHiper,
        Typology::Conveniencia,
        Typology::Droguerias,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Super e hiper" => Some(Typology::SuperHiper),
            "Conveniencia" => Some(Typology::Conveniencia),
            "Droguerías" => Some(Typology::Droguerias),
            _ => None,
        }
    }
}

/// Store-size category used to pick recommended feature defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreSize {
    #[serde(rename = "Pequeño")]
    Pequeno,
    #[serde(rename = "Mediano")]
    Mediano,
    #[serde(rename = "Grande")]
    Grande,
}

impl std::fmt::Display for StoreSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StoreSize::Pequeno => "Pequeño",
            StoreSize::Mediano => "Mediano",
            StoreSize::Grande => "Grande",
        };
        write!(f, "{s}")
    }
}

/// How many levers a simulation activates at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeverMode {
    /// Exactly one lever.
    Simple,
    /// Two or more levers combined.
    Multiple,
}

impl std::fmt::Display for LeverMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LeverMode::Simple => write!(f, "simple"),
            LeverMode::Multiple => write!(f, "multiple"),
        }
    }
}

/// A marketing intervention under test ("palanca"). Activating it sets its
/// indicator feature to the active magnitude in the treatment vector.
#[derive(Debug, Clone, Serialize)]
pub struct Lever {
    pub name: String,
    /// Model feature toggled by this lever (e.g. "palanca_punta_gondola").
    pub indicator_feature: String,
}

// ---------------------------------------------------------------------------
// Simulation request / result
// ---------------------------------------------------------------------------

/// One simulation request, validated once and then immutable.
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationRequest {
    pub typology: Typology,
    pub lever_mode: LeverMode,
    pub levers: Vec<String>,
    pub store_size: StoreSize,
    /// User overrides for the structural features; recommended defaults fill
    /// anything not supplied.
    #[serde(default)]
    pub features: HashMap<String, f64>,
    /// One-time capital expenditure (USD).
    pub capex: f64,
    /// Recurring monthly fee (USD).
    pub monthly_fee: f64,
    /// Margin on incremental sales, 0–100 scale.
    pub margin_pct: f64,
    /// USD → COP conversion, used only for display totals.
    pub exchange_rate: f64,
}

/// A metric that can be undefined (division by zero in its formula).
/// Serializes as a plain number or JSON null — NaN and infinity never
/// cross this boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Metric {
    Value(f64),
    NotApplicable,
}

impl Metric {
    pub fn value(self) -> Option<f64> {
        match self {
            Metric::Value(v) => Some(v),
            Metric::NotApplicable => None,
        }
    }
}

/// Payback outcome. NotRecoverable is a defined business result (recurring
/// cost meets or exceeds recurring benefit), not a numeric failure, so it is
/// a separate type from [`Metric::NotApplicable`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payback {
    Months(f64),
    NotRecoverable,
}

impl Payback {
    pub fn months(self) -> Option<f64> {
        match self {
            Payback::Months(m) => Some(m),
            Payback::NotRecoverable => None,
        }
    }
}

/// Output aggregate of one simulation. Pure function of its inputs; never
/// persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationResult {
    pub prediction_treatment: f64,
    pub prediction_control: f64,
    pub uplift_pct: Metric,
    pub roi: Metric,
    pub payback_months: Payback,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typology_wire_names_round_trip() {
        for t in Typology::ALL {
            let json = serde_json::to_string(&t).unwrap();
            let back: Typology = serde_json::from_str(&json).unwrap();
            assert_eq!(back, t);
            assert_eq!(Typology::from_name(&t.to_string()), Some(t));
        }
    }

    #[test]
    fn unknown_typology_name_is_none() {
        assert_eq!(Typology::from_name("Mayorista"), None);
    }

    #[test]
    fn undefined_metrics_serialize_as_null() {
        assert_eq!(
            serde_json::to_string(&Metric::NotApplicable).unwrap(),
            "null"
        );
        assert_eq!(
            serde_json::to_string(&Payback::NotRecoverable).unwrap(),
            "null"
        );
        assert_eq!(serde_json::to_string(&Metric::Value(2.5)).unwrap(), "2.5");
    }

    #[test]
    fn lever_mode_wire_values_are_lowercase() {
        assert_eq!(serde_json::to_string(&LeverMode::Simple).unwrap(), "\"simple\"");
        let m: LeverMode = serde_json::from_str("\"multiple\"").unwrap();
        assert_eq!(m, LeverMode::Multiple);
    }
}
