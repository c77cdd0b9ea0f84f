/// Integration tests: drive the real router end to end, from HTTP request
/// to SQLite rows and the upload directory.
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use corkboard_api::storage::Storage;
use corkboard_api::{AppStateInner, router};
use corkboard_db::Database;

const ADMIN_PASSWORD: &str = "test-admin";
const BOUNDARY: &str = "X-BOUNDARY-7f3k";

struct TestApp {
    app: Router,
    public_dir: PathBuf,
    // Held so the upload directory outlives the test
    _dir: tempfile::TempDir,
}

async fn spawn_app(blocklist: &[&str]) -> TestApp {
    let dir = tempfile::tempdir().expect("tempdir");
    let public_dir = dir.path().join("public");

    let db = Database::open_in_memory().expect("open db");
    for word in blocklist {
        db.add_blocked_word(word).expect("seed blocklist");
    }
    let storage = Storage::new(public_dir.clone()).await.expect("storage");

    let state = Arc::new(AppStateInner {
        db,
        storage,
        admin_password: ADMIN_PASSWORD.to_string(),
    });

    TestApp {
        app: router(state),
        public_dir,
        _dir: dir,
    }
}

async fn send_json(app: &Router, path: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request");

    read_json(app.clone().oneshot(request).await.expect("response")).await
}

async fn get_json(app: &Router, path: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .uri(path)
        .body(Body::empty())
        .expect("request");

    read_json(app.clone().oneshot(request).await.expect("response")).await
}

async fn read_json(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let value = serde_json::from_slice(&bytes).expect("json body");
    (status, value)
}

fn multipart_body(
    file: Option<(&str, &[u8])>,
    sender_id: Option<&str>,
    sender_name: Option<&str>,
) -> Vec<u8> {
    let mut body = Vec::new();
    if let Some((filename, data)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    if let Some(id) = sender_id {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"senderId\"\r\n\r\n{id}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some(name) = sender_name {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"senderName\"\r\n\r\n{name}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn send_multipart(app: &Router, body: Vec<u8>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/api/upload-file")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("request");

    read_json(app.clone().oneshot(request).await.expect("response")).await
}

#[tokio::test]
async fn test_post_and_list_roundtrip() {
    let t = spawn_app(&[]).await;

    let (status, body) = send_json(
        &t.app,
        "/api/post-message",
        json!({ "sender_id": "alice", "content": "hello" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Message posted successfully");
    assert_eq!(body["id"], 1);

    let (status, body) = get_json(&t.app, "/api/get-all-messages").await;
    assert_eq!(status, StatusCode::OK);
    let data = body["data"].as_array().expect("data array");
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["id"], 1);
    assert_eq!(data[0]["sender_id"], "alice");
    assert_eq!(data[0]["content"], "hello");
    assert!(data[0]["created_at"].is_string());
}

#[tokio::test]
async fn test_post_message_missing_fields() {
    let t = spawn_app(&[]).await;

    let (status, body) = send_json(&t.app, "/api/post-message", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = send_json(
        &t.app,
        "/api/post-message",
        json!({ "sender_id": "alice" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_json(&t.app, "/api/post-message", json!({ "content": "hi" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Nothing was stored
    let (_, body) = get_json(&t.app, "/api/get-all-messages").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_banned_sender_cannot_post() {
    let t = spawn_app(&[]).await;

    let (status, _) = send_json(
        &t.app,
        "/api/ban-user",
        json!({ "userIdToBan": "mallory" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send_json(
        &t.app,
        "/api/post-message",
        json!({ "sender_id": "mallory", "content": "totally harmless" }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_blocklisted_content_bans_sender() {
    let t = spawn_app(&["zebra"]).await;

    let (status, _) = send_json(
        &t.app,
        "/api/post-message",
        json!({ "sender_id": "eve", "content": "a ZEBRA crossed the road" }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The ban covers clean content from the same sender too
    let (status, _) = send_json(
        &t.app,
        "/api/post-message",
        json!({ "sender_id": "eve", "content": "clean message" }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = get_json(&t.app, "/api/get-all-messages").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_new_messages_cursor() {
    let t = spawn_app(&[]).await;

    for content in ["one", "two", "three"] {
        let (status, _) = send_json(
            &t.app,
            "/api/post-message",
            json!({ "sender_id": "alice", "content": content }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = get_json(&t.app, "/api/get-new-messages?lastMessageId=1").await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![2, 3]);

    let (_, body) = get_json(&t.app, "/api/get-new-messages?lastMessageId=3").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);

    // Beyond the max id is simply empty, not an error
    let (status, body) = get_json(&t.app, "/api/get-new-messages?lastMessageId=99").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 0);

    // Missing cursor means everything
    let (_, body) = get_json(&t.app, "/api/get-new-messages").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 3);

    // So does a cursor that does not parse as an integer
    let (status, body) = get_json(&t.app, "/api/get-new-messages?lastMessageId=abc").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_ban_user_validation_and_conflict() {
    let t = spawn_app(&[]).await;

    let (status, _) = send_json(&t.app, "/api/ban-user", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send_json(&t.app, "/api/ban-user", json!({ "userIdToBan": "bob" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User bob has been banned");

    let (status, body) = send_json(&t.app, "/api/ban-user", json!({ "userIdToBan": "bob" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_clear_messages_requires_password() {
    let t = spawn_app(&[]).await;

    for content in ["one", "two", "three"] {
        send_json(
            &t.app,
            "/api/post-message",
            json!({ "sender_id": "alice", "content": content }),
        )
        .await;
    }

    let (status, _) = send_json(
        &t.app,
        "/api/clear-messages",
        json!({ "password": "wrong" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (_, body) = get_json(&t.app, "/api/get-all-messages").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 3);

    let (status, _) = send_json(
        &t.app,
        "/api/clear-messages",
        json!({ "password": ADMIN_PASSWORD }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = get_json(&t.app, "/api/get-all-messages").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);

    // Ids keep counting after a clear, so stale cursors stay valid
    let (_, body) = send_json(
        &t.app,
        "/api/post-message",
        json!({ "sender_id": "alice", "content": "four" }),
    )
    .await;
    assert_eq!(body["id"], 4);
}

#[tokio::test]
async fn test_check_name() {
    let t = spawn_app(&["zebra"]).await;

    let (status, _) = send_json(
        &t.app,
        "/api/check-name",
        json!({ "name": "a-very-long-name-x" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_json(&t.app, "/api/check-name", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_json(&t.app, "/api/check-name", json!({ "name": "zebrafan" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send_json(&t.app, "/api/check-name", json!({ "name": "alice" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["exists"], false);

    send_json(
        &t.app,
        "/api/post-message",
        json!({ "sender_id": "alice", "content": "hi" }),
    )
    .await;
    let (_, body) = send_json(&t.app, "/api/check-name", json!({ "name": "alice" })).await;
    assert_eq!(body["exists"], true);
}

#[tokio::test]
async fn test_topic_flow() {
    let t = spawn_app(&[]).await;

    let (status, body) = get_json(&t.app, "/api/get-topic").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["topic"], "No topic has been set yet");

    let (status, _) = send_json(
        &t.app,
        "/api/set-topic",
        json!({ "password": "wrong", "topic": "hijack" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send_json(
        &t.app,
        "/api/set-topic",
        json!({ "password": ADMIN_PASSWORD, "topic": "release day" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = get_json(&t.app, "/api/get-topic").await;
    assert_eq!(body["topic"], "release day");
}

#[tokio::test]
async fn test_get_time_posts_bot_message() {
    let t = spawn_app(&[]).await;

    let (status, body) = send_json(&t.app, "/api/get-time", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Time message posted successfully");

    let (_, body) = get_json(&t.app, "/api/get-all-messages").await;
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["sender_id"], "BOT");
    assert!(
        data[0]["content"]
            .as_str()
            .unwrap()
            .starts_with("Current time in Japan: ")
    );
}

#[tokio::test]
async fn test_upload_file_roundtrip() {
    let t = spawn_app(&[]).await;

    let body = multipart_body(
        Some(("weekly report.txt", b"quarterly numbers")),
        Some("u-123"),
        Some("Reporter"),
    );
    let (status, body) = send_multipart(&t.app, body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "File uploaded successfully");
    assert_eq!(body["id"], 1);

    // Stored under the sanitized name
    let stored = t.public_dir.join("weekly_report.txt");
    assert_eq!(std::fs::read(&stored).unwrap(), b"quarterly numbers");

    // Announced on the board as a link, attributed to the display name
    let (_, body) = get_json(&t.app, "/api/get-all-messages").await;
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["sender_id"], "Reporter");
    let content = data[0]["content"].as_str().unwrap();
    assert!(content.contains("<a href=\"/weekly_report.txt\""));
    assert!(content.contains(">weekly report.txt</a>"));
}

#[tokio::test]
async fn test_upload_file_missing_parts() {
    let t = spawn_app(&[]).await;

    // No file part at all
    let body = multipart_body(None, Some("u-123"), Some("Reporter"));
    let (status, body) = send_multipart(&t.app, body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    // File but nobody sending it
    let body = multipart_body(Some(("report.txt", b"data")), None, None);
    let (status, _) = send_multipart(&t.app, body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!t.public_dir.join("report.txt").exists());
}

#[tokio::test]
async fn test_upload_banned_sender_rejected() {
    let t = spawn_app(&[]).await;

    send_json(&t.app, "/api/ban-user", json!({ "userIdToBan": "mallory" })).await;

    let body = multipart_body(
        Some(("report.txt", b"data")),
        Some("mallory"),
        Some("Nice Name"),
    );
    let (status, body) = send_multipart(&t.app, body).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].as_str().unwrap().contains("banned"));
    assert!(!t.public_dir.join("report.txt").exists());
}

#[tokio::test]
async fn test_upload_blocklisted_name_rejected_without_ban() {
    let t = spawn_app(&["zebra"]).await;

    let body = multipart_body(
        Some(("report.txt", b"data")),
        Some("u-123"),
        Some("zebra fan"),
    );
    let (status, body) = send_multipart(&t.app, body).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].as_str().unwrap().contains("inappropriate"));
    assert!(!t.public_dir.join("report.txt").exists());

    // The name screen does not ban the sender id behind it
    let (status, _) = send_json(
        &t.app,
        "/api/post-message",
        json!({ "sender_id": "u-123", "content": "still here" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_health() {
    let t = spawn_app(&[]).await;

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .expect("request");
    let response = t.app.clone().oneshot(request).await.expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    assert_eq!(&bytes[..], b"ok");
}
