//! Database row types used by runtime-checked sqlx queries.

#[derive(Debug, sqlx::FromRow)]
pub struct CoefficientRow {
    pub typology_name: String,
    pub feature_name: String,
    pub coefficient: f64,
}

#[derive(Debug, sqlx::FromRow)]
pub struct LeverRow {
    pub lever_name: String,
    pub indicator_feature: String,
}

#[derive(Debug, sqlx::FromRow)]
pub struct CapexFeeRow {
    pub lever_name: String,
    pub capex_usd: f64,
    pub monthly_fee_usd: f64,
}

#[derive(Debug, sqlx::FromRow)]
pub struct SummaryRow {
    pub source_name: String,
    pub typology_name: String,
    pub lever_name: String,
    pub category_name: String,
    pub unit_name: String,
    pub average_variation: Option<f64>,
    pub difference_vs_control: Option<f64>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct TimelineRow {
    pub period_label: String,
    /// ISO date, cast to text in the query to keep the row type plain.
    pub start_date: String,
    pub avg_value: Option<f64>,
}
