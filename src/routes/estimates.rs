//! Estimate routes
//!
//! Calculate estimates on demand, and store, list, fetch and delete saved
//! ones.

use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::{Created, DataResponse, NoContent, Paginated, PaginationParams};
use crate::app::AppState;
use crate::domain::{
    CalculateEstimateRequest, EstimateResult, ProjectInput, ProjectType, SavedEstimateResponse,
    SavedEstimateSummary,
};
use crate::error::{ApiError, ApiResult};
use crate::estimator::{self, EngineVersion, EstimateOptions};
use crate::services::cache::keys;

/// Database row for a saved estimate
#[derive(Debug, sqlx::FromRow)]
struct SavedEstimateRow {
    id: Uuid,
    project_name: String,
    client_name: Option<String>,
    final_price: Decimal,
    input: sqlx::types::Json<ProjectInput>,
    estimate: sqlx::types::Json<EstimateResult>,
    created_at: DateTime<Utc>,
}

impl From<SavedEstimateRow> for SavedEstimateResponse {
    fn from(row: SavedEstimateRow) -> Self {
        let estimate = row.estimate.0;
        Self {
            id: row.id,
            project_name: row.project_name,
            client_name: row.client_name,
            project_type: estimate.project_type,
            engine: estimate.engine,
            final_price: row.final_price.to_f64().unwrap_or(estimate.final_price),
            input: row.input.0,
            estimate,
            created_at: row.created_at,
        }
    }
}

/// Database row for the estimate list
#[derive(Debug, sqlx::FromRow)]
struct SavedEstimateSummaryRow {
    id: Uuid,
    project_name: String,
    client_name: Option<String>,
    project_type: String,
    engine: String,
    final_price: Decimal,
    created_at: DateTime<Utc>,
}

impl TryFrom<SavedEstimateSummaryRow> for SavedEstimateSummary {
    type Error = ApiError;

    fn try_from(row: SavedEstimateSummaryRow) -> Result<Self, Self::Error> {
        let project_type = ProjectType::parse(&row.project_type).ok_or_else(|| {
            ApiError::internal(format!("stored project type {:?} is unknown", row.project_type))
        })?;
        let engine = EngineVersion::from_str(&row.engine).ok_or_else(|| {
            ApiError::internal(format!("stored engine {:?} is unknown", row.engine))
        })?;

        Ok(Self {
            id: row.id,
            project_name: row.project_name,
            client_name: row.client_name,
            project_type,
            engine,
            final_price: row.final_price.to_f64().unwrap_or_default(),
            created_at: row.created_at,
        })
    }
}

/// Validate and calculate against one reference-data snapshot.
///
/// Calculated results are cached by engine, schedule date, catalog
/// revision and a digest of the validated input.
async fn run_estimate(
    state: &AppState,
    req: CalculateEstimateRequest,
) -> ApiResult<(ProjectInput, EstimateResult)> {
    let engine = req.engine.unwrap_or(state.settings.default_engine);
    let today = state.today();

    let (input, revision) = state.catalog.read(|data, revision| {
        req.project
            .validate(|t| data.needs_length(t))
            .map(|input| (input, revision))
    })?;

    let payload = serde_json::to_vec(&input).context("Failed to serialize estimate input")?;
    let cache_key = keys::calculation(engine, today, revision, &keys::digest(&payload));

    if let Some(cache) = &state.cache {
        if let Some(estimate) = cache.get::<EstimateResult>(&cache_key).await {
            return Ok((input, estimate));
        }
    }

    let options = EstimateOptions { engine, today };
    let (estimate, used_revision) = state.catalog.read(|data, revision| {
        estimator::calculate_estimate(&input, data, options).map(|e| (e, revision))
    })?;

    // A catalog update between the two reads means the key is stale
    if let (Some(cache), true) = (&state.cache, used_revision == revision) {
        if let Err(e) = cache.set(&cache_key, &estimate).await {
            tracing::warn!(error = %e, "Failed to cache estimate");
        }
    }

    Ok((input, estimate))
}

/// POST /estimates/calculate
///
/// Calculate an estimate without storing it.
pub async fn calculate_estimate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CalculateEstimateRequest>, JsonRejection>,
) -> ApiResult<DataResponse<EstimateResult>> {
    let Json(req) = payload?;
    let (_, estimate) = run_estimate(&state, req).await?;

    tracing::info!(
        project_type = %estimate.project_type,
        engine = %estimate.engine,
        final_price = estimate.final_price,
        "Estimate calculated"
    );

    Ok(DataResponse::new(estimate))
}

/// POST /estimates
///
/// Calculate an estimate and store it.
pub async fn save_estimate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CalculateEstimateRequest>, JsonRejection>,
) -> ApiResult<Created<SavedEstimateResponse>> {
    let Json(req) = payload?;
    let (input, estimate) = run_estimate(&state, req).await?;

    let id = Uuid::new_v4();
    let final_price = Decimal::from_f64(estimate.final_price)
        .map(|d| d.round_dp(2))
        .ok_or_else(|| ApiError::internal("final price is not representable"))?;

    let created_at: DateTime<Utc> = sqlx::query_scalar(
        r#"
        INSERT INTO saved_estimates
            (id, project_name, client_name, project_type, engine, final_price, input, estimate)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING created_at
        "#,
    )
    .bind(id)
    .bind(&input.name)
    .bind(&input.client_name)
    .bind(input.project_type.as_str())
    .bind(estimate.engine.as_str())
    .bind(final_price)
    .bind(sqlx::types::Json(&input))
    .bind(sqlx::types::Json(&estimate))
    .fetch_one(&state.db)
    .await?;

    tracing::info!(
        estimate_id = %id,
        project_name = %input.name,
        final_price = %final_price,
        "Estimate saved"
    );

    Ok(Created(SavedEstimateResponse {
        id,
        project_name: input.name.clone(),
        client_name: input.client_name.clone(),
        project_type: input.project_type,
        engine: estimate.engine,
        final_price: final_price.to_f64().unwrap_or(estimate.final_price),
        input,
        estimate,
        created_at,
    }))
}

/// GET /estimates
///
/// List saved estimates, newest first.
pub async fn list_estimates(
    State(state): State<Arc<AppState>>,
    Query(pagination): Query<PaginationParams>,
) -> ApiResult<Paginated<SavedEstimateSummary>> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM saved_estimates")
        .fetch_one(&state.db)
        .await?;

    let rows = sqlx::query_as::<_, SavedEstimateSummaryRow>(
        r#"
        SELECT id, project_name, client_name, project_type, engine, final_price, created_at
        FROM saved_estimates
        ORDER BY created_at DESC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(&state.db)
    .await?;

    let data = rows
        .into_iter()
        .map(SavedEstimateSummary::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Paginated::new(data, &pagination, total.max(0) as u64))
}

/// GET /estimates/:estimate_id
pub async fn get_estimate(
    State(state): State<Arc<AppState>>,
    Path(estimate_id): Path<Uuid>,
) -> ApiResult<DataResponse<SavedEstimateResponse>> {
    let cache_key = keys::saved_estimate(estimate_id);
    if let Some(cache) = &state.cache {
        if let Some(saved) = cache.get::<SavedEstimateResponse>(&cache_key).await {
            return Ok(DataResponse::new(saved));
        }
    }

    let row = sqlx::query_as::<_, SavedEstimateRow>(
        r#"
        SELECT id, project_name, client_name, final_price, input, estimate, created_at
        FROM saved_estimates
        WHERE id = $1
        "#,
    )
    .bind(estimate_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found(format!("estimate {} not found", estimate_id)))?;

    let saved = SavedEstimateResponse::from(row);

    if let Some(cache) = &state.cache {
        if let Err(e) = cache.set(&cache_key, &saved).await {
            tracing::warn!(error = %e, "Failed to cache saved estimate");
        }
    }

    Ok(DataResponse::new(saved))
}

/// DELETE /estimates/:estimate_id
pub async fn delete_estimate(
    State(state): State<Arc<AppState>>,
    Path(estimate_id): Path<Uuid>,
) -> ApiResult<NoContent> {
    let result = sqlx::query("DELETE FROM saved_estimates WHERE id = $1")
        .bind(estimate_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found(format!("estimate {} not found", estimate_id)));
    }

    if let Some(cache) = &state.cache {
        if let Err(e) = cache.delete(&keys::saved_estimate(estimate_id)).await {
            tracing::warn!(error = %e, "Failed to evict saved estimate from cache");
        }
    }

    tracing::info!(estimate_id = %estimate_id, "Estimate deleted");
    Ok(NoContent)
}
