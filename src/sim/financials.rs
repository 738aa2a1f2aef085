use crate::config::{PCT_SCALE, ROI_HORIZON_MONTHS};
use crate::types::{Metric, Payback, SimulationResult};

/// Derives the three financial metrics from a pair of model predictions.
///
/// All guards resolve to tagged sentinels rather than raising or leaking
/// NaN/Infinity — the dashboard renders "N/A", it never crashes:
/// - control prediction of 0 makes uplift undefined;
/// - zero total investment makes ROI undefined;
/// - non-positive net monthly gain means the investment never pays back,
///   a defined business outcome distinct from the undefined-metric cases.
pub fn calculate(
    prediction_treatment: f64,
    prediction_control: f64,
    margin_pct: f64,
    capex: f64,
    monthly_fee: f64,
) -> SimulationResult {
    let delta = prediction_treatment - prediction_control;

    let uplift_pct = if prediction_control == 0.0 {
        Metric::NotApplicable
    } else {
        Metric::Value(delta / prediction_control * PCT_SCALE)
    };

    let incremental_monthly_gain = delta * margin_pct / PCT_SCALE;
    let net_monthly_gain = incremental_monthly_gain - monthly_fee;

    let payback_months = if net_monthly_gain > 0.0 {
        Payback::Months(capex / net_monthly_gain)
    } else {
        Payback::NotRecoverable
    };

    let annual_gain = incremental_monthly_gain * ROI_HORIZON_MONTHS;
    let annual_fee = monthly_fee * ROI_HORIZON_MONTHS;
    let total_investment = capex + annual_fee;
    let roi = if total_investment == 0.0 {
        Metric::NotApplicable
    } else {
        Metric::Value((annual_gain - annual_fee - capex) / total_investment)
    };

    SimulationResult {
        prediction_treatment,
        prediction_control,
        uplift_pct,
        roi,
        payback_months,
    }
}
