use axum::Json;
use axum::extract::multipart::{Field, Multipart};
use axum::extract::State;
use tracing::{info, warn};

use corkboard_types::api::PostMessageResponse;

use crate::AppState;
use crate::error::ApiError;
use crate::storage::sanitize_filename;

/// POST /api/upload-file. Multipart upload: `file` carries the payload,
/// `senderId` and `senderName` identify the uploader. The stored file is
/// announced on the board as a message linking to `/{stored name}`.
///
/// The display name is what gets screened against the blocklist; a hit
/// rejects the upload but does not ban. The ban check runs against the
/// stable `senderId`.
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<PostMessageResponse>, ApiError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut sender_id: Option<String> = None;
    let mut sender_name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("Malformed multipart data: {}", e)))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                let original_name = field.file_name().unwrap_or("").to_string();
                let data = field.bytes().await.map_err(|e| {
                    ApiError::Validation(format!("Failed to read file data: {}", e))
                })?;
                file = Some((original_name, data.to_vec()));
            }
            "senderId" => {
                sender_id = Some(read_text(field).await?);
            }
            "senderName" => {
                sender_name = Some(read_text(field).await?);
            }
            other => {
                warn!("Ignoring unknown upload field {:?}", other);
            }
        }
    }

    let (original_name, data) =
        file.ok_or_else(|| ApiError::Validation("No file part".into()))?;
    if original_name.is_empty() {
        return Err(ApiError::Validation("No filename".into()));
    }

    let sender_id = sender_id.filter(|s| !s.is_empty());
    let sender_name = sender_name.filter(|s| !s.is_empty());

    let display_name = match sender_name.or_else(|| sender_id.clone()) {
        Some(name) => name,
        None => {
            return Err(ApiError::Validation(
                "senderId or senderName is required".into(),
            ));
        }
    };

    {
        let db = state.clone();
        let target = display_name.clone();
        let blocked =
            tokio::task::spawn_blocking(move || db.db.blocked_word(&target)).await??;
        if let Some(word) = blocked {
            warn!("Rejected upload from {:?}: matched {:?}", display_name, word);
            return Err(ApiError::Forbidden(
                "Sender name contains inappropriate words".into(),
            ));
        }
    }

    if let Some(id) = sender_id {
        let db = state.clone();
        let check_id = id.clone();
        if tokio::task::spawn_blocking(move || db.db.is_banned(&check_id)).await?? {
            return Err(ApiError::Forbidden("You are banned from posting".into()));
        }
    }

    let stored_name = sanitize_filename(&original_name);
    if stored_name.is_empty() {
        return Err(ApiError::Validation(
            "Filename has no usable characters".into(),
        ));
    }

    state.storage.save(&stored_name, &data).await?;

    let content = format!(
        "File uploaded: <a href=\"/{}\" target=\"_blank\" class=\"uploaded-file\">{}</a>",
        stored_name, original_name
    );

    let db = state.clone();
    let poster = display_name.clone();
    let recorded_name = stored_name.clone();
    let row = tokio::task::spawn_blocking(move || {
        db.db.record_file(&recorded_name)?;
        db.db.insert_message(&poster, &content)
    })
    .await??;

    info!(
        "Stored upload {} ({} bytes) from {}",
        stored_name,
        data.len(),
        display_name
    );

    Ok(Json(PostMessageResponse {
        message: "File uploaded successfully".into(),
        id: row.id,
    }))
}

async fn read_text(field: Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::Validation(format!("Malformed multipart field: {}", e)))
}
