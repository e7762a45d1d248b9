//! Catalog routes
//!
//! Read the reference data the estimator uses and override material
//! prices and labor rates. Overrides are persisted first and then applied
//! to the in-memory catalog, which invalidates cached calculations.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::DataResponse;
use crate::app::AppState;
use crate::domain::{
    LaborRole, MaterialCatalogEntry, MaterialUnit, ProjectTemplate, ProjectType, RiskFactorTable,
};
use crate::error::{ApiError, ApiResult};
use crate::services::cache::keys;

#[derive(Debug, Deserialize)]
pub struct UpsertMaterialRequest {
    pub unit_price: f64,
    /// Defaults to the current unit when the material already exists
    #[serde(default)]
    pub unit: Option<MaterialUnit>,
    #[serde(default)]
    pub unit_weight: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct SetLaborRateRequest {
    pub hourly_rate: f64,
}

#[derive(Debug, Serialize)]
pub struct LaborRateResponse {
    pub role: LaborRole,
    pub hourly_rate: f64,
}

#[derive(Debug, Serialize)]
pub struct ProjectTypeResponse {
    pub project_type: ProjectType,
    #[serde(flatten)]
    pub template: ProjectTemplate,
}

/// Validate a money amount and round it to cents, for both the database
/// and the live catalog.
fn non_negative(field: &str, value: f64) -> ApiResult<(Decimal, f64)> {
    if !value.is_finite() || value < 0.0 {
        return Err(ApiError::Validation(format!(
            "{} must be a non-negative number, got {}",
            field, value
        )));
    }
    let rounded = Decimal::from_f64(value)
        .map(|d| d.round_dp(2))
        .ok_or_else(|| ApiError::Validation(format!("{} is out of range", field)))?;
    let as_f64 = rounded
        .to_f64()
        .ok_or_else(|| ApiError::Validation(format!("{} is out of range", field)))?;
    Ok((rounded, as_f64))
}

async fn invalidate_calculations(state: &AppState) {
    if let Some(cache) = &state.cache {
        if let Err(e) = cache.delete_pattern(&keys::calculation_pattern()).await {
            tracing::warn!(error = %e, "Failed to invalidate cached estimates");
        }
    }
}

/// GET /catalog/materials
pub async fn list_materials(
    State(state): State<Arc<AppState>>,
) -> DataResponse<Vec<MaterialCatalogEntry>> {
    let materials: Vec<MaterialCatalogEntry> = state
        .catalog
        .read(|data, _| data.materials.values().cloned().collect());
    DataResponse::new(materials)
}

/// PUT /catalog/materials/:name
pub async fn upsert_material(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    payload: Result<Json<UpsertMaterialRequest>, JsonRejection>,
) -> ApiResult<DataResponse<MaterialCatalogEntry>> {
    let Json(req) = payload?;
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::Validation("material name must not be empty".to_string()));
    }

    let (stored_price, unit_price) = non_negative("unit_price", req.unit_price)?;
    let existing = state.catalog.read(|data, _| data.material(&name).ok().cloned());
    let unit = req
        .unit
        .or(existing.as_ref().map(|m| m.unit))
        .ok_or_else(|| ApiError::Validation("unit is required for a new material".to_string()))?;
    let unit_weight = req
        .unit_weight
        .or(existing.as_ref().map(|m| m.unit_weight))
        .unwrap_or(0.0);
    if !unit_weight.is_finite() || unit_weight < 0.0 {
        return Err(ApiError::Validation(format!(
            "unit_weight must be a non-negative number, got {}",
            unit_weight
        )));
    }

    sqlx::query(
        r#"
        INSERT INTO material_prices (name, unit, unit_price, unit_weight)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (name) DO UPDATE
        SET unit = EXCLUDED.unit,
            unit_price = EXCLUDED.unit_price,
            unit_weight = EXCLUDED.unit_weight,
            updated_at = NOW()
        "#,
    )
    .bind(&name)
    .bind(unit.as_str())
    .bind(stored_price)
    .bind(unit_weight)
    .execute(&state.db)
    .await?;

    let entry = MaterialCatalogEntry {
        name,
        unit_price,
        unit,
        unit_weight,
    };
    let revision = state.catalog.upsert_material(entry.clone());
    invalidate_calculations(&state).await;

    tracing::info!(
        material = %entry.name,
        unit_price = entry.unit_price,
        catalog_revision = revision,
        "Material price updated"
    );

    Ok(DataResponse::new(entry))
}

/// GET /catalog/labor-rates
pub async fn list_labor_rates(
    State(state): State<Arc<AppState>>,
) -> DataResponse<Vec<LaborRateResponse>> {
    let rates: Vec<LaborRateResponse> = state.catalog.read(|data, _| {
        data.labor_rates
            .iter()
            .map(|(&role, &hourly_rate)| LaborRateResponse { role, hourly_rate })
            .collect()
    });
    DataResponse::new(rates)
}

/// PUT /catalog/labor-rates/:role
pub async fn set_labor_rate(
    State(state): State<Arc<AppState>>,
    Path(role): Path<String>,
    payload: Result<Json<SetLaborRateRequest>, JsonRejection>,
) -> ApiResult<DataResponse<LaborRateResponse>> {
    let role = LaborRole::parse(&role)
        .ok_or_else(|| ApiError::not_found(format!("unknown labor role: {}", role)))?;
    let Json(req) = payload?;
    let (stored_rate, hourly_rate) = non_negative("hourly_rate", req.hourly_rate)?;

    sqlx::query(
        r#"
        INSERT INTO labor_rates (role, hourly_rate)
        VALUES ($1, $2)
        ON CONFLICT (role) DO UPDATE
        SET hourly_rate = EXCLUDED.hourly_rate,
            updated_at = NOW()
        "#,
    )
    .bind(role.as_str())
    .bind(stored_rate)
    .execute(&state.db)
    .await?;

    let revision = state.catalog.set_labor_rate(role, hourly_rate);
    invalidate_calculations(&state).await;

    tracing::info!(
        role = role.as_str(),
        hourly_rate = hourly_rate,
        catalog_revision = revision,
        "Labor rate updated"
    );

    Ok(DataResponse::new(LaborRateResponse { role, hourly_rate }))
}

/// GET /catalog/project-types
pub async fn list_project_types(
    State(state): State<Arc<AppState>>,
) -> DataResponse<Vec<ProjectTypeResponse>> {
    let types: Vec<ProjectTypeResponse> = state.catalog.read(|data, _| {
        data.project_types
            .iter()
            .map(|(&project_type, template)| ProjectTypeResponse {
                project_type,
                template: template.clone(),
            })
            .collect()
    });
    DataResponse::new(types)
}

/// GET /catalog/risk-factors
pub async fn get_risk_factors(State(state): State<Arc<AppState>>) -> DataResponse<RiskFactorTable> {
    DataResponse::new(state.catalog.read(|data, _| data.risk_factors.clone()))
}
