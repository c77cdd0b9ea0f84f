use axum::Json;
use axum::extract::State;
use tracing::info;

use corkboard_types::api::{
    BanUserRequest, ClearMessagesRequest, SetTopicRequest, StatusResponse, TopicResponse,
};

use crate::AppState;
use crate::error::ApiError;

const NO_TOPIC_FALLBACK: &str = "No topic is set";

/// Compares the supplied secret against the configured one without
/// short-circuiting on the first mismatching byte.
pub fn verify_secret(supplied: &str, expected: &str) -> bool {
    let a = supplied.as_bytes();
    let b = expected.as_bytes();

    let mut diff = a.len() ^ b.len();
    for i in 0..a.len().min(b.len()) {
        diff |= (a[i] ^ b[i]) as usize;
    }
    diff == 0
}

fn require_admin(password: &str, state: &AppState) -> Result<(), ApiError> {
    if !verify_secret(password, &state.admin_password) {
        return Err(ApiError::Unauthorized("Invalid admin password".into()));
    }
    Ok(())
}

/// POST /api/clear-messages. Admin wipe; message ids are not reused
/// afterwards.
pub async fn clear_messages(
    State(state): State<AppState>,
    Json(req): Json<ClearMessagesRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    require_admin(&req.password, &state)?;

    let db = state.clone();
    let deleted = tokio::task::spawn_blocking(move || db.db.clear_messages()).await??;

    info!("Cleared {} messages", deleted);
    Ok(Json(StatusResponse {
        message: "All messages cleared".into(),
    }))
}

/// POST /api/ban-user. Explicit ban; re-banning an already banned user is
/// reported as a conflict.
pub async fn ban_user(
    State(state): State<AppState>,
    Json(req): Json<BanUserRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    if req.user_id_to_ban.is_empty() {
        return Err(ApiError::Validation("userIdToBan is required".into()));
    }

    let db = state.clone();
    let user_id = req.user_id_to_ban.clone();
    let newly_banned = tokio::task::spawn_blocking(move || db.db.ban_user(&user_id)).await??;

    if !newly_banned {
        return Err(ApiError::Conflict("This user is already banned".into()));
    }

    info!("Banned user {}", req.user_id_to_ban);
    Ok(Json(StatusResponse {
        message: format!("User {} has been banned", req.user_id_to_ban),
    }))
}

/// POST /api/set-topic.
pub async fn set_topic(
    State(state): State<AppState>,
    Json(req): Json<SetTopicRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    require_admin(&req.password, &state)?;

    let db = state.clone();
    let topic = req.topic.clone();
    tokio::task::spawn_blocking(move || db.db.set_topic(&topic)).await??;

    info!("Topic set to {:?}", req.topic);
    Ok(Json(StatusResponse {
        message: "Topic updated successfully".into(),
    }))
}

/// GET /api/get-topic.
pub async fn get_topic(State(state): State<AppState>) -> Result<Json<TopicResponse>, ApiError> {
    let db = state.clone();
    let topic = tokio::task::spawn_blocking(move || db.db.topic()).await??;

    Ok(Json(TopicResponse {
        topic: topic.unwrap_or_else(|| NO_TOPIC_FALLBACK.into()),
    }))
}
