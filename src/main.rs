mod api;
mod config;
mod db;
mod error;
mod sim;
mod types;

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::api::routes::{router, ApiState};
use crate::config::Config;
use crate::db::loader::{load_coefficient_store, load_lever_catalog};
use crate::error::Result;
use crate::sim::SimulationOrchestrator;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    // --- Database setup ---
    let pool = sqlx::PgPool::connect(&cfg.database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database ready");

    // --- Startup loads: coefficient sets and lever catalog ---
    // Read once, shared immutably across all requests afterwards.
    let store = Arc::new(load_coefficient_store(&pool).await?);
    let catalog = Arc::new(load_lever_catalog(&pool).await?);
    let orchestrator = Arc::new(SimulationOrchestrator::new(
        Arc::clone(&store),
        Arc::clone(&catalog),
    ));

    // --- HTTP API server ---
    let api_state = ApiState {
        pool: pool.clone(),
        store,
        orchestrator,
    };
    let app = router(api_state);
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
