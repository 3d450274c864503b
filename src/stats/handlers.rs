use axum::{
    extract::{Path, State},
    Json,
};

use super::models::StatsReport;
use super::service::StatsError;
use crate::error::ErrorResponse;
use crate::AppState;

/// Compute stats for a user on demand
///
/// GET /api/v1/stats/{user_id}
#[utoipa::path(
    get,
    path = "/api/v1/stats/{user_id}",
    tag = "stats",
    params(("user_id" = String, Path, description = "Social-graph user id")),
    responses(
        (status = 200, description = "Freshly computed stats", body = StatsReport),
        (status = 404, description = "No profile for this id", body = ErrorResponse),
        (status = 409, description = "Id matched several profiles", body = ErrorResponse),
        (status = 429, description = "Social API rate limit", body = ErrorResponse),
        (status = 502, description = "Social API failure", body = ErrorResponse)
    )
)]
pub async fn get_stats(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<StatsReport>, StatsError> {
    let report = state.stats_service.compute_report(&user_id).await?;
    Ok(Json(report))
}
