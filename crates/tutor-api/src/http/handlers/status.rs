//! Live status of the running bot.

use std::time::Instant;

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use tutor_infra::archive::ArchiveStatus;

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct LiveStatus {
    pub active_sessions: usize,
    /// Turns held in memory, not yet archived.
    pub unarchived_entries: usize,
    pub archive: ArchiveStatus,
}

/// GET /api/v1/status
pub async fn get_status(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<LiveStatus>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let archive = state.storage.archive.status().await?;
    let data = LiveStatus {
        active_sessions: state.sessions.active_sessions().len(),
        unarchived_entries: state.storage.log.total_entries(),
        archive,
    };

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(data, request_id, elapsed)))
}
