use std::collections::HashMap;

use sqlx::PgPool;
use tracing::{info, warn};

use crate::db::models::{CoefficientRow, LeverRow};
use crate::error::{AppError, Result};
use crate::sim::coefficients::{CoefficientStore, INTERCEPT};
use crate::sim::orchestrator::LeverCatalog;
use crate::types::{Lever, Typology};

/// Loads every seeded coefficient set into memory. Runs once at startup;
/// the returned store is shared read-only for the process lifetime.
pub async fn load_coefficient_store(pool: &PgPool) -> Result<CoefficientStore> {
    let rows: Vec<CoefficientRow> = sqlx::query_as(
        r#"
        SELECT t.typology_name, c.feature_name, c.coefficient
        FROM ols_coefficient c
        JOIN typology_master t ON t.typology_id = c.typology_id
        ORDER BY t.typology_name, c.feature_name
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut sets: HashMap<Typology, HashMap<String, f64>> = HashMap::new();
    for row in rows {
        let Some(typology) = Typology::from_name(&row.typology_name) else {
            warn!(
                typology = %row.typology_name,
                "skipping coefficient row for typology not in the fixed set"
            );
            continue;
        };
        sets.entry(typology)
            .or_default()
            .insert(row.feature_name, row.coefficient);
    }

    let mut store = CoefficientStore::new();
    for (typology, coefficients) in sets {
        if !coefficients.contains_key(INTERCEPT) {
            return Err(AppError::Config(format!(
                "coefficient set for {typology} has no {INTERCEPT} term"
            )));
        }
        store.insert_set(typology, coefficients);
    }

    if store.typology_count() == 0 {
        return Err(AppError::Config(
            "ols_coefficient table is empty — run migrations with seed data".to_string(),
        ));
    }

    info!(
        typologies = store.typology_count(),
        "coefficient store loaded"
    );
    Ok(store)
}

/// Loads the lever catalog from `lever_master`. The "Control" pseudo-lever
/// marks baseline stores in the test data and is not selectable.
pub async fn load_lever_catalog(pool: &PgPool) -> Result<LeverCatalog> {
    let rows: Vec<LeverRow> = sqlx::query_as(
        r#"
        SELECT lever_name, indicator_feature
        FROM lever_master
        WHERE lever_name != 'Control'
        ORDER BY lever_name
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut catalog = LeverCatalog::new();
    for row in rows {
        catalog.insert(Lever {
            name: row.lever_name,
            indicator_feature: row.indicator_feature,
        });
    }

    if catalog.is_empty() {
        return Err(AppError::Config(
            "lever_master has no selectable levers".to_string(),
        ));
    }

    info!(levers = catalog.len(), "lever catalog loaded");
    Ok(catalog)
}
