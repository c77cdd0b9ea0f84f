use axum::Json;
use axum::extract::{Query, State};
use chrono::{DateTime, FixedOffset, Utc};
use tracing::warn;

use corkboard_db::models::MessageRow;
use corkboard_db::queries::PostAttempt;
use corkboard_types::api::{
    CheckNameRequest, CheckNameResponse, MessageListResponse, MessageResponse, NewMessagesQuery,
    PostMessageRequest, PostMessageResponse, StatusResponse,
};

use crate::AppState;
use crate::error::ApiError;

/// Sender id used for server-generated posts. Never scanned or banned.
const BOT_SENDER: &str = "BOT";

const MAX_NAME_CHARS: usize = 15;

/// POST /api/post-message. The moderated write path: banned senders are
/// rejected, blocklisted content is rejected and bans the sender.
pub async fn post_message(
    State(state): State<AppState>,
    Json(req): Json<PostMessageRequest>,
) -> Result<Json<PostMessageResponse>, ApiError> {
    if req.sender_id.is_empty() || req.content.is_empty() {
        return Err(ApiError::Validation(
            "sender_id and content are required".into(),
        ));
    }

    let db = state.clone();
    let sender_id = req.sender_id.clone();
    let content = req.content.clone();
    let attempt =
        tokio::task::spawn_blocking(move || db.db.post_message(&sender_id, &content)).await??;

    match attempt {
        PostAttempt::Posted(row) => Ok(Json(PostMessageResponse {
            message: "Message posted successfully".into(),
            id: row.id,
        })),
        PostAttempt::SenderBanned => {
            Err(ApiError::Forbidden("You are banned from posting".into()))
        }
        PostAttempt::ContentBlocked { word } => {
            warn!("Blocked message from {}: matched {:?}", req.sender_id, word);
            Err(ApiError::Forbidden(
                "Inappropriate content detected. You have been banned".into(),
            ))
        }
    }
}

/// GET /api/get-all-messages.
pub async fn get_all_messages(
    State(state): State<AppState>,
) -> Result<Json<MessageListResponse>, ApiError> {
    list_after(state, 0).await
}

/// GET /api/get-new-messages?lastMessageId=N. Returns only messages the
/// polling client has not seen yet. A cursor that does not parse reads
/// as 0, returning everything.
pub async fn get_new_messages(
    State(state): State<AppState>,
    Query(query): Query<NewMessagesQuery>,
) -> Result<Json<MessageListResponse>, ApiError> {
    let after_id = query
        .last_message_id
        .as_deref()
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(0);
    list_after(state, after_id).await
}

async fn list_after(state: AppState, after_id: i64) -> Result<Json<MessageListResponse>, ApiError> {
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.messages_after(after_id)).await??;

    let data = rows.into_iter().map(to_response).collect();
    Ok(Json(MessageListResponse { data }))
}

/// POST /api/get-time. Posts the current Japan time to the board as the
/// bot sender, bypassing moderation.
pub async fn post_time(State(state): State<AppState>) -> Result<Json<StatusResponse>, ApiError> {
    let offset = FixedOffset::east_opt(9 * 3600).expect("static UTC+9 offset");
    let now = Utc::now().with_timezone(&offset);
    let content = format!("Current time in Japan: {}", now.format("%Y/%m/%d %H:%M:%S"));

    let db = state.clone();
    tokio::task::spawn_blocking(move || db.db.insert_message(BOT_SENDER, &content)).await??;

    Ok(Json(StatusResponse {
        message: "Time message posted successfully".into(),
    }))
}

/// POST /api/check-name. Screens a display name and reports whether it has
/// already posted. A blocklisted name is rejected but never banned.
pub async fn check_name(
    State(state): State<AppState>,
    Json(req): Json<CheckNameRequest>,
) -> Result<Json<CheckNameResponse>, ApiError> {
    if req.name.is_empty() || req.name.chars().count() > MAX_NAME_CHARS {
        return Err(ApiError::Validation(
            "Name must be between 1 and 15 characters".into(),
        ));
    }

    let db = state.clone();
    let name = req.name.clone();
    let (blocked, exists) = tokio::task::spawn_blocking(move || {
        match db.db.blocked_word(&name)? {
            Some(word) => anyhow::Ok((Some(word), false)),
            None => anyhow::Ok((None, db.db.name_in_use(&name)?)),
        }
    })
    .await??;

    if let Some(word) = blocked {
        warn!("Rejected name {:?}: matched {:?}", req.name, word);
        return Err(ApiError::Forbidden(
            "Name contains inappropriate words".into(),
        ));
    }

    Ok(Json(CheckNameResponse { exists }))
}

fn to_response(row: MessageRow) -> MessageResponse {
    let created_at = parse_created_at(&row.created_at, row.id);
    MessageResponse {
        id: row.id,
        sender_id: row.sender_id,
        content: row.content,
        created_at,
    }
}

fn parse_created_at(raw: &str, id: i64) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
            // Parse as naive UTC and convert.
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt created_at '{}' on message {}: {}", raw, id, e);
            DateTime::default()
        })
}
