use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Inbound fields default to empty rather than rejecting at deserialization,
// so missing-field errors surface as 400 with the usual error body.

// -- Messages --

#[derive(Debug, Deserialize)]
pub struct PostMessageRequest {
    #[serde(default)]
    pub sender_id: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct PostMessageResponse {
    pub message: String,
    pub id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub id: i64,
    pub sender_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct MessageListResponse {
    pub data: Vec<MessageResponse>,
}

/// Poll cursor: the highest message id the client has already seen.
/// Kept as raw text; the handler reads anything unparseable as 0.
#[derive(Debug, Deserialize)]
pub struct NewMessagesQuery {
    #[serde(default, rename = "lastMessageId")]
    pub last_message_id: Option<String>,
}

// -- Display names --

#[derive(Debug, Deserialize)]
pub struct CheckNameRequest {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct CheckNameResponse {
    pub exists: bool,
}

// -- Admin --

#[derive(Debug, Deserialize)]
pub struct ClearMessagesRequest {
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct BanUserRequest {
    #[serde(default, rename = "userIdToBan")]
    pub user_id_to_ban: String,
}

// -- Topic --

#[derive(Debug, Deserialize)]
pub struct SetTopicRequest {
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub topic: String,
}

#[derive(Debug, Serialize)]
pub struct TopicResponse {
    pub topic: String,
}

// -- Envelopes --

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
