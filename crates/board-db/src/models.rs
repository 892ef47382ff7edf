/// Database row types — these map directly to SQLite rows.
/// Distinct from board-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: i64,
    pub nickname: String,
    pub password: String,
}

pub struct PostRow {
    pub id: i64,
    pub user_id: i64,
    pub nickname: String,
    pub title: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

pub struct CommentRow {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub nickname: String,
    pub comment: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Outcome of an update or delete filtered on both row id and owner id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnedMutation {
    Applied,
    /// No row with that id (or not under the given parent).
    Missing,
    /// The row exists but belongs to another user.
    NotOwner,
}
