/// Database row types, mapping directly to SQLite rows.
/// Distinct from corkboard-types API models to keep the DB layer independent.
///
/// `created_at` stays the raw SQLite text (`YYYY-MM-DD HH:MM:SS`, UTC);
/// callers convert it when they need a typed timestamp.
pub struct MessageRow {
    pub id: i64,
    pub sender_id: String,
    pub content: String,
    pub created_at: String,
}
