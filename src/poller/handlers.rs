use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use super::board::StatsSnapshot;
use crate::cache::normalize_user_id;
use crate::error::{ErrorResponse, HttpError};
use crate::impl_into_response;
use crate::stats::StatsError;
use crate::AppState;

#[derive(Error, Debug)]
pub enum BoardError {
    #[error("User is not tracked: {0}")]
    NotTracked(String),

    #[error(transparent)]
    Refresh(#[from] StatsError),
}

impl HttpError for BoardError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotTracked(_) => StatusCode::NOT_FOUND,
            Self::Refresh(e) => e.status_code(),
        }
    }

    fn error_code(&self) -> Option<&'static str> {
        match self {
            Self::NotTracked(_) => Some("NOT_TRACKED"),
            Self::Refresh(e) => e.error_code(),
        }
    }
}

impl_into_response!(BoardError);

#[derive(Debug, Serialize, ToSchema)]
pub struct BoardResponse {
    pub users: Vec<StatsSnapshot>,
    pub count: usize,
}

/// Latest snapshot for every tracked user
#[utoipa::path(
    get,
    path = "/api/v1/board",
    tag = "board",
    responses((status = 200, description = "All snapshots", body = BoardResponse))
)]
pub async fn list_board(State(state): State<AppState>) -> Json<BoardResponse> {
    let users = state.board.all();
    Json(BoardResponse {
        count: users.len(),
        users,
    })
}

/// Latest snapshot for one user
#[utoipa::path(
    get,
    path = "/api/v1/board/{user_id}",
    tag = "board",
    params(("user_id" = String, Path, description = "Social-graph user id")),
    responses(
        (status = 200, description = "Snapshot", body = StatsSnapshot),
        (status = 404, description = "User has never been refreshed", body = ErrorResponse)
    )
)]
pub async fn get_snapshot(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<StatsSnapshot>, BoardError> {
    let user_id = normalize_user_id(&user_id);
    let snapshot = state.board.get(&user_id);
    snapshot.map(Json).ok_or(BoardError::NotTracked(user_id))
}

/// Recompute one user now and apply the outcome to the board
///
/// A failed refresh of a tracked user still returns 200: the snapshot carries
/// the error next to the last good result. An id that never resolved is not
/// added to the board and gets the lookup error instead.
#[utoipa::path(
    post,
    path = "/api/v1/board/{user_id}/refresh",
    tag = "board",
    params(("user_id" = String, Path, description = "Social-graph user id")),
    responses(
        (status = 200, description = "Snapshot after the refresh", body = StatsSnapshot),
        (status = 404, description = "Unknown user, nothing was recorded", body = ErrorResponse),
        (status = 409, description = "Id matched several profiles", body = ErrorResponse)
    )
)]
pub async fn refresh_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<StatsSnapshot>, BoardError> {
    let snapshot = state.poller.refresh(&user_id).await?;
    Ok(Json(snapshot))
}
