use crate::Database;
use crate::models::MessageRow;
use anyhow::Result;
use chrono::{Duration, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::info;

/// Outcome of a moderated post attempt.
pub enum PostAttempt {
    Posted(MessageRow),
    SenderBanned,
    ContentBlocked { word: String },
}

impl Database {
    // -- Messages --

    /// Moderated write path: ban check, blocklist scan, then insert.
    /// A blocklist hit bans the sender as a side effect; INSERT OR IGNORE
    /// folds an already-present ban row into success.
    pub fn post_message(&self, sender_id: &str, content: &str) -> Result<PostAttempt> {
        self.with_conn(|conn| {
            if query_is_banned(conn, sender_id)? {
                return Ok(PostAttempt::SenderBanned);
            }

            if let Some(word) = query_blocked_word(conn, content)? {
                conn.execute(
                    "INSERT OR IGNORE INTO banned_users (user_id) VALUES (?1)",
                    [sender_id],
                )?;
                info!("Banned {} for posting a blocked word", sender_id);
                return Ok(PostAttempt::ContentBlocked { word });
            }

            let row = insert_message(conn, sender_id, content)?;
            Ok(PostAttempt::Posted(row))
        })
    }

    /// Unmoderated insert for system senders.
    pub fn insert_message(&self, sender_id: &str, content: &str) -> Result<MessageRow> {
        self.with_conn(|conn| insert_message(conn, sender_id, content))
    }

    /// Messages with id strictly greater than `after_id`, oldest first.
    /// `after_id = 0` returns everything.
    pub fn messages_after(&self, after_id: i64) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| query_messages_after(conn, after_id))
    }

    // -- Moderation --

    pub fn is_banned(&self, user_id: &str) -> Result<bool> {
        self.with_conn(|conn| query_is_banned(conn, user_id))
    }

    /// Explicit ban. Returns false when the user was already banned.
    pub fn ban_user(&self, user_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "INSERT OR IGNORE INTO banned_users (user_id) VALUES (?1)",
                [user_id],
            )?;
            Ok(changed > 0)
        })
    }

    /// First blocklist word contained in `text`, matched case-insensitively.
    pub fn blocked_word(&self, text: &str) -> Result<Option<String>> {
        self.with_conn(|conn| query_blocked_word(conn, text))
    }

    /// Seed one blocklist entry. Returns false when the word was already there.
    pub fn add_blocked_word(&self, word: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "INSERT OR IGNORE INTO inappropriate_words (word) VALUES (?1)",
                [word],
            )?;
            Ok(changed > 0)
        })
    }

    // -- Display names --

    /// Whether any stored message was posted under this sender id.
    pub fn name_in_use(&self, name: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let hit = conn
                .query_row(
                    "SELECT 1 FROM messages WHERE sender_id = ?1 LIMIT 1",
                    [name],
                    |_| Ok(()),
                )
                .optional()?;
            Ok(hit.is_some())
        })
    }

    // -- Topic --

    pub fn topic(&self) -> Result<Option<String>> {
        self.with_conn(|conn| {
            let content = conn
                .query_row("SELECT content FROM topic WHERE id = 1", [], |row| row.get(0))
                .optional()?;
            Ok(content)
        })
    }

    /// Overwrite the topic singleton, recreating the row if it is missing.
    pub fn set_topic(&self, content: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO topic (id, content) VALUES (1, ?1)
                 ON CONFLICT(id) DO UPDATE SET content = excluded.content",
                [content],
            )?;
            Ok(())
        })
    }

    // -- Files --

    pub fn record_file(&self, filename: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("INSERT INTO files (filename) VALUES (?1)", [filename])?;
            Ok(())
        })
    }

    /// Drop file records older than `max_age_hours`, returning their
    /// filenames so the caller can remove them from disk. The cutoff is
    /// computed once and used for both the select and the delete.
    pub fn prune_stale_files(&self, max_age_hours: u64) -> Result<Vec<String>> {
        let cutoff = (Utc::now() - Duration::hours(max_age_hours as i64))
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();

        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT filename FROM files WHERE uploaded_at < ?1")?;
            let filenames = stmt
                .query_map([&cutoff], |row| row.get::<_, String>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            conn.execute("DELETE FROM files WHERE uploaded_at < ?1", [&cutoff])?;
            Ok(filenames)
        })
    }

    // -- Admin --

    /// Delete every message. Ids are not reset; see the schema note on
    /// AUTOINCREMENT.
    pub fn clear_messages(&self) -> Result<usize> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM messages", [])?;
            Ok(deleted)
        })
    }
}

fn insert_message(conn: &Connection, sender_id: &str, content: &str) -> Result<MessageRow> {
    conn.execute(
        "INSERT INTO messages (sender_id, content) VALUES (?1, ?2)",
        params![sender_id, content],
    )?;
    let id = conn.last_insert_rowid();

    let row = conn.query_row(
        "SELECT id, sender_id, content, created_at FROM messages WHERE id = ?1",
        [id],
        |row| {
            Ok(MessageRow {
                id: row.get(0)?,
                sender_id: row.get(1)?,
                content: row.get(2)?,
                created_at: row.get(3)?,
            })
        },
    )?;
    Ok(row)
}

fn query_messages_after(conn: &Connection, after_id: i64) -> Result<Vec<MessageRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, sender_id, content, created_at FROM messages
         WHERE id > ?1
         ORDER BY id ASC",
    )?;

    let rows = stmt
        .query_map([after_id], |row| {
            Ok(MessageRow {
                id: row.get(0)?,
                sender_id: row.get(1)?,
                content: row.get(2)?,
                created_at: row.get(3)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn query_is_banned(conn: &Connection, user_id: &str) -> Result<bool> {
    let hit = conn
        .query_row(
            "SELECT 1 FROM banned_users WHERE user_id = ?1",
            [user_id],
            |_| Ok(()),
        )
        .optional()?;
    Ok(hit.is_some())
}

fn query_blocked_word(conn: &Connection, text: &str) -> Result<Option<String>> {
    if text.is_empty() {
        return Ok(None);
    }
    let lowered = text.to_lowercase();

    let mut stmt = conn.prepare("SELECT word FROM inappropriate_words")?;
    let words = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(words.into_iter().find(|w| lowered.contains(&w.to_lowercase())))
}
