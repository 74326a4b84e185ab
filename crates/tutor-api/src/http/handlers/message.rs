//! Inbound chat message handler.

use std::time::Instant;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// A message posted in a student channel.
#[derive(Debug, Deserialize)]
pub struct PostMessageRequest {
    /// Channel label, `<student id>-<level>`.
    pub channel: String,
    pub content: String,
}

/// What to send back to the channel, in order.
#[derive(Debug, Serialize)]
pub struct MessageReply {
    pub kind: &'static str,
    pub chunks: Vec<String>,
}

/// POST /api/v1/messages
pub async fn post_message(
    State(state): State<AppState>,
    Json(body): Json<PostMessageRequest>,
) -> Result<Json<ApiResponse<MessageReply>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    if body.content.trim().is_empty() {
        return Err(AppError::Validation("content must not be empty".to_string()));
    }

    let reply = state.tutor.handle(&body.channel, &body.content).await;
    let data = MessageReply {
        kind: reply.kind(),
        chunks: reply.chunks(),
    };

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(data, request_id, elapsed)))
}
