use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        -- AUTOINCREMENT: ids are never reused, even after a full clear,
        -- so poll cursors held by clients stay valid.
        CREATE TABLE IF NOT EXISTS messages (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            sender_id   TEXT NOT NULL,
            content     TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_messages_sender
            ON messages(sender_id);

        CREATE TABLE IF NOT EXISTS banned_users (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id    TEXT NOT NULL UNIQUE,
            banned_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS inappropriate_words (
            id    INTEGER PRIMARY KEY AUTOINCREMENT,
            word  TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS files (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            filename     TEXT NOT NULL,
            uploaded_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS topic (
            id       INTEGER PRIMARY KEY,
            content  TEXT NOT NULL
        );

        -- Seed the topic singleton
        INSERT OR IGNORE INTO topic (id, content)
            VALUES (1, 'No topic has been set yet');
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
