use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::db::models::{CapexFeeRow, SummaryRow, TimelineRow};
use crate::error::AppError;
use crate::sim::{CoefficientStore, SimulationOrchestrator};
use crate::types::{Metric, Payback, SimulationRequest, Typology};

#[derive(Clone)]
pub struct ApiState {
    pub pool: sqlx::PgPool,
    pub store: Arc<CoefficientStore>,
    pub orchestrator: Arc<SimulationOrchestrator>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/simulation/calculate", post(calculate_simulation))
        .route("/api/simulation/ols-params", get(get_ols_params))
        .route("/api/simulation/capex-fee", get(get_capex_fee))
        .route("/api/dashboard/results", get(get_dashboard_results))
        .route("/api/dashboard/filter-options", get(get_filter_options))
        .route("/api/dashboard/evolution-data", get(get_evolution_data))
        .route("/api/health", get(health_check))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Query param structs
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct TypologyQuery {
    pub typology: String,
}

#[derive(Deserialize)]
pub struct CapexFeeQuery {
    pub typology: String,
    /// Comma-separated lever names.
    pub levers: String,
}

#[derive(Deserialize)]
pub struct ResultsQuery {
    pub typology: Option<String>,
    pub source: Option<String>,
    pub unit: Option<String>,
    pub category: Option<String>,
}

#[derive(Deserialize)]
pub struct EvolutionQuery {
    pub lever: String,
    pub kpi: String,
    pub typology: Option<String>,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct SimulationResponse {
    pub prediction_treatment: f64,
    pub prediction_control: f64,
    pub uplift_pct: Metric,
    pub roi: Metric,
    pub payback_months: Payback,
    /// Display-only COP conversions (exchange_rate is not part of the model).
    pub total_capex_cop: f64,
    pub total_fee_cop: f64,
}

#[derive(Serialize)]
pub struct OlsParamsResponse {
    pub typology: Typology,
    /// BTreeMap keeps the JSON keys sorted for stable output.
    pub coefficients: BTreeMap<String, f64>,
}

#[derive(Serialize)]
pub struct CapexFeeItem {
    pub lever: String,
    pub capex_usd: f64,
    pub monthly_fee_usd: f64,
}

#[derive(Serialize)]
pub struct CapexFeeResponse {
    pub typology: String,
    pub items: Vec<CapexFeeItem>,
    pub total_capex_usd: f64,
    pub total_monthly_fee_usd: f64,
}

#[derive(Serialize)]
pub struct SummaryItem {
    pub source: String,
    pub typology: String,
    pub lever: String,
    pub category: String,
    pub unit: String,
    pub average_variation: f64,
    pub difference_vs_control: f64,
}

#[derive(Serialize)]
pub struct ResultsResponse {
    pub data: Vec<SummaryItem>,
    pub levers: Vec<String>,
    pub sources: Vec<String>,
    pub categories: Vec<String>,
    pub units: Vec<String>,
}

#[derive(Serialize)]
pub struct FilterOptionsResponse {
    pub typologies: Vec<String>,
    pub levers: Vec<String>,
    pub categories: Vec<String>,
    pub sources: Vec<String>,
    pub units: Vec<String>,
}

#[derive(Serialize)]
pub struct TimelinePoint {
    pub period: String,
    pub avg_value: Option<f64>,
    pub period_label: String,
    pub start_date: String,
}

#[derive(Serialize)]
pub struct EvolutionResponse {
    pub data: Vec<TimelinePoint>,
    pub lever: String,
    pub kpi: String,
}

// ---------------------------------------------------------------------------
// Simulation handlers
// ---------------------------------------------------------------------------

async fn calculate_simulation(
    State(state): State<ApiState>,
    Json(request): Json<SimulationRequest>,
) -> Result<Json<SimulationResponse>, AppError> {
    let result = state.orchestrator.run(&request)?;

    info!(
        typology = %request.typology,
        lever_mode = %request.lever_mode,
        levers = request.levers.len(),
        uplift_pct = ?result.uplift_pct,
        "simulation calculated"
    );

    Ok(Json(SimulationResponse {
        prediction_treatment: result.prediction_treatment,
        prediction_control: result.prediction_control,
        uplift_pct: result.uplift_pct,
        roi: result.roi,
        payback_months: result.payback_months,
        total_capex_cop: request.capex * request.exchange_rate,
        total_fee_cop: request.monthly_fee * request.exchange_rate,
    }))
}

async fn get_ols_params(
    State(state): State<ApiState>,
    Query(params): Query<TypologyQuery>,
) -> Result<Json<OlsParamsResponse>, AppError> {
    let typology = Typology::from_name(&params.typology)
        .ok_or_else(|| AppError::UnknownTypology(params.typology.clone()))?;
    let coefficients = state.store.coefficients_for(typology)?;

    Ok(Json(OlsParamsResponse {
        typology,
        coefficients: coefficients
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect(),
    }))
}

async fn get_capex_fee(
    State(state): State<ApiState>,
    Query(params): Query<CapexFeeQuery>,
) -> Result<Json<CapexFeeResponse>, AppError> {
    let typology = Typology::from_name(&params.typology)
        .ok_or_else(|| AppError::UnknownTypology(params.typology.clone()))?;

    let levers: Vec<String> = params
        .levers
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if levers.is_empty() {
        return Err(AppError::validation(vec!["levers".to_string()]));
    }

    let rows: Vec<CapexFeeRow> = sqlx::query_as(
        r#"
        SELECT l.lever_name, cf.capex_usd, cf.monthly_fee_usd
        FROM capex_fee cf
        JOIN typology_master t ON t.typology_id = cf.typology_id
        JOIN lever_master l ON l.lever_id = cf.lever_id
        WHERE t.typology_name = $1 AND l.lever_name = ANY($2)
        ORDER BY l.lever_name
        "#,
    )
    .bind(typology.to_string())
    .bind(&levers)
    .fetch_all(&state.pool)
    .await?;

    // Every requested lever must have a seeded row for this typology.
    for name in &levers {
        if !rows.iter().any(|r| &r.lever_name == name) {
            return Err(AppError::UnknownLever(name.clone()));
        }
    }

    let total_capex_usd = rows.iter().map(|r| r.capex_usd).sum();
    let total_monthly_fee_usd = rows.iter().map(|r| r.monthly_fee_usd).sum();

    Ok(Json(CapexFeeResponse {
        typology: typology.to_string(),
        items: rows
            .into_iter()
            .map(|r| CapexFeeItem {
                lever: r.lever_name,
                capex_usd: r.capex_usd,
                monthly_fee_usd: r.monthly_fee_usd,
            })
            .collect(),
        total_capex_usd,
        total_monthly_fee_usd,
    }))
}

// ---------------------------------------------------------------------------
// Dashboard handlers — plain parameterized aggregations
// ---------------------------------------------------------------------------

async fn get_dashboard_results(
    State(state): State<ApiState>,
    Query(params): Query<ResultsQuery>,
) -> Result<Json<ResultsResponse>, AppError> {
    let rows: Vec<SummaryRow> = sqlx::query_as(
        r#"
        SELECT s.source_name, t.typology_name, l.lever_name,
               c.category_name, u.unit_name,
               ab.average_variation, ab.difference_vs_control
        FROM ab_test_summary ab
        JOIN typology_master t ON t.typology_id = ab.typology_id
        JOIN lever_master l ON l.lever_id = ab.lever_id
        JOIN category_master c ON c.category_id = ab.category_id
        JOIN measurement_unit_master u ON u.unit_id = ab.unit_id
        JOIN data_source_master s ON s.source_id = ab.source_id
        WHERE ($1::text IS NULL OR t.typology_name = $1)
          AND ($2::text IS NULL OR s.source_name = $2)
          AND ($3::text IS NULL OR u.unit_name = $3)
          AND ($4::text IS NULL OR c.category_name = $4)
          AND l.lever_name != 'Control'
        ORDER BY s.source_name, c.category_name, u.unit_name, l.lever_name
        "#,
    )
    .bind(&params.typology)
    .bind(&params.source)
    .bind(&params.unit)
    .bind(&params.category)
    .fetch_all(&state.pool)
    .await?;

    let data: Vec<SummaryItem> = rows
        .into_iter()
        .map(|r| SummaryItem {
            source: r.source_name,
            typology: r.typology_name,
            lever: r.lever_name,
            category: r.category_name,
            unit: r.unit_name,
            average_variation: r.average_variation.unwrap_or(0.0),
            difference_vs_control: r.difference_vs_control.unwrap_or(0.0),
        })
        .collect();

    let mut levers: Vec<String> = data.iter().map(|d| d.lever.clone()).collect();
    let mut sources: Vec<String> = data.iter().map(|d| d.source.clone()).collect();
    let mut categories: Vec<String> = data.iter().map(|d| d.category.clone()).collect();
    let mut units: Vec<String> = data.iter().map(|d| d.unit.clone()).collect();
    for list in [&mut levers, &mut sources, &mut categories, &mut units] {
        list.sort();
        list.dedup();
    }

    Ok(Json(ResultsResponse {
        data,
        levers,
        sources,
        categories,
        units,
    }))
}

async fn get_filter_options(
    State(state): State<ApiState>,
) -> Result<Json<FilterOptionsResponse>, AppError> {
    let typologies: Vec<String> =
        sqlx::query_scalar("SELECT typology_name FROM typology_master ORDER BY typology_name")
            .fetch_all(&state.pool)
            .await?;
    let levers: Vec<String> = sqlx::query_scalar(
        "SELECT lever_name FROM lever_master WHERE lever_name != 'Control' ORDER BY lever_name",
    )
    .fetch_all(&state.pool)
    .await?;
    let categories: Vec<String> =
        sqlx::query_scalar("SELECT category_name FROM category_master ORDER BY category_name")
            .fetch_all(&state.pool)
            .await?;
    let sources: Vec<String> =
        sqlx::query_scalar("SELECT source_name FROM data_source_master ORDER BY source_name")
            .fetch_all(&state.pool)
            .await?;
    let units: Vec<String> = sqlx::query_scalar(
        "SELECT unit_name FROM measurement_unit_master ORDER BY unit_name",
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(FilterOptionsResponse {
        typologies,
        levers,
        categories,
        sources,
        units,
    }))
}

async fn get_evolution_data(
    State(state): State<ApiState>,
    Query(params): Query<EvolutionQuery>,
) -> Result<Json<EvolutionResponse>, AppError> {
    let rows: Vec<TimelineRow> = sqlx::query_as(
        r#"
        SELECT tl.period_label, tl.start_date::text AS start_date,
               AVG(tl.avg_value) AS avg_value
        FROM ab_test_timeline tl
        JOIN typology_master t ON t.typology_id = tl.typology_id
        JOIN lever_master l ON l.lever_id = tl.lever_id
        JOIN category_master c ON c.category_id = tl.category_id
        WHERE l.lever_name = $1
          AND c.category_name = $2
          AND ($3::text IS NULL OR t.typology_name = $3)
        GROUP BY tl.period_label, tl.start_date
        ORDER BY tl.start_date
        "#,
    )
    .bind(&params.lever)
    .bind(&params.kpi)
    .bind(&params.typology)
    .fetch_all(&state.pool)
    .await?;

    let data = rows
        .into_iter()
        .enumerate()
        .map(|(i, r)| TimelinePoint {
            period: format!("Período {}", i + 1),
            avg_value: r.avg_value,
            period_label: r.period_label,
            start_date: r.start_date,
        })
        .collect();

    Ok(Json(EvolutionResponse {
        data,
        lever: params.lever,
        kpi: params.kpi,
    }))
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

async fn health_check(State(state): State<ApiState>) -> Result<Json<serde_json::Value>, AppError> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&state.pool)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": "uplift-sim",
        "typologies_loaded": state.store.typology_count(),
    })))
}
