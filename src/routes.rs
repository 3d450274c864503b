use axum::{
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::openapi::swagger_ui;
use crate::poller::handlers as board_handlers;
use crate::stats::handlers as stats_handlers;
use crate::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// On-demand stats computation
fn stats_routes() -> Router<AppState> {
    Router::new().route("/stats/{user_id}", get(stats_handlers::get_stats))
}

/// Poll-and-replace board of tracked users
fn board_routes() -> Router<AppState> {
    Router::new()
        .route("/board", get(board_handlers::list_board))
        .route("/board/{user_id}", get(board_handlers::get_snapshot))
        .route(
            "/board/{user_id}/refresh",
            post(board_handlers::refresh_user),
        )
}

/// Everything mounted under `/api/v1`
pub fn api_v1_routes() -> Router<AppState> {
    Router::new().merge(stats_routes()).merge(board_routes())
}

/// Build the complete application router
pub fn build_router() -> Router<AppState> {
    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .nest("/api/v1", api_v1_routes())
        .merge(swagger_ui())
}
