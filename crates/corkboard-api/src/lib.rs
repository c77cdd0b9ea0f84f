pub mod admin;
pub mod cleanup;
pub mod error;
pub mod messages;
pub mod storage;
pub mod uploads;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};

use corkboard_db::Database;

use crate::storage::Storage;

pub struct AppStateInner {
    pub db: Database,
    pub storage: Storage,
    pub admin_password: String,
}

pub type AppState = Arc<AppStateInner>;

const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024; // 50 MB

/// The full API surface. The binary layers static file serving, CORS and
/// tracing on top.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/post-message", post(messages::post_message))
        .route("/api/get-all-messages", get(messages::get_all_messages))
        .route("/api/get-new-messages", get(messages::get_new_messages))
        .route("/api/get-time", post(messages::post_time))
        .route("/api/check-name", post(messages::check_name))
        .route("/api/clear-messages", post(admin::clear_messages))
        .route("/api/ban-user", post(admin::ban_user))
        .route("/api/upload-file", post(uploads::upload_file))
        .route("/api/set-topic", post(admin::set_topic))
        .route("/api/get-topic", get(admin::get_topic))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
