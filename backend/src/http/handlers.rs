//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the
//! service layer for business logic.

use axum::{
    extract::{rejection::QueryRejection, Extension, Path, Query, State},
    http::StatusCode,
    Json,
};

use super::dto::{
    AnalyticsParams, HealthResponse, IrrigationAnalytics, SectorInfo, SectorListResponse,
};
use super::error::AppError;
use super::request_id::RequestId;
use super::state::AppState;
use crate::db::services as db_services;
use crate::services::{self, request::parse_farm_id, AnalyticsRequest};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Always answers 200; a failing database check is reported in the body.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let (healthy, database) = match db_services::health_check(state.repository.as_ref()).await {
        Ok(true) => (true, "connected".to_string()),
        Ok(false) => (false, "disconnected".to_string()),
        Err(e) => {
            tracing::warn!(error = %e, "health check failed");
            (false, format!("error: {}", e))
        }
    };

    let (status, message) = if healthy {
        ("healthy", format!("{} is running", state.service_name))
    } else {
        ("unhealthy", "database is not reachable".to_string())
    };

    Json(HealthResponse {
        status: status.to_string(),
        message,
        version: state.version.clone(),
        database,
    })
}

// =============================================================================
// Irrigation Analytics
// =============================================================================

/// GET /v1/farms/{farm_id}/irrigation/analytics
///
/// Responds 206 instead of 200 when an earlier-year comparison has no data.
/// Repeated query keys keep their first value.
pub async fn get_irrigation_analytics(
    State(state): State<AppState>,
    Path(farm_id): Path<String>,
    request_id: Option<Extension<RequestId>>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<(StatusCode, Json<IrrigationAnalytics>), AppError> {
    let Query(pairs) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let params = AnalyticsParams::from_pairs(pairs);
    let farm_id = parse_farm_id(&farm_id)?;
    let request = AnalyticsRequest::from_params(farm_id, &params, chrono::Utc::now())?;

    let farm = db_services::find_farm(state.repository.as_ref(), farm_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("farm {} not found", farm_id)))?;

    let analytics =
        services::get_irrigation_analytics(state.repository.as_ref(), &farm, &request).await?;

    let status = if analytics.is_partial() {
        StatusCode::PARTIAL_CONTENT
    } else {
        StatusCode::OK
    };

    tracing::info!(
        request_id = request_id.as_ref().map(|Extension(id)| id.as_str()).unwrap_or("-"),
        farm_id = %farm_id,
        aggregation = %request.granularity,
        buckets = analytics.time_series.data.len(),
        status = status.as_u16(),
        "irrigation analytics served"
    );

    Ok((status, Json(analytics)))
}

// =============================================================================
// Farm Directory
// =============================================================================

/// GET /v1/farms/{farm_id}/sectors
pub async fn list_sectors(
    State(state): State<AppState>,
    Path(farm_id): Path<String>,
) -> HandlerResult<SectorListResponse> {
    let farm_id = parse_farm_id(&farm_id)?;
    let (farm, sectors) = db_services::list_sectors(state.repository.as_ref(), farm_id).await?;

    let sectors: Vec<SectorInfo> = sectors.into_iter().map(Into::into).collect();
    let total = sectors.len();

    Ok(Json(SectorListResponse {
        farm_id: farm.id,
        sectors,
        total,
    }))
}
