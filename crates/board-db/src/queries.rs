use crate::migrations::NOW_SQL;
use crate::models::{CommentRow, OwnedMutation, PostRow, UserRow};
use crate::Database;
use anyhow::Result;
use rusqlite::{Connection, ErrorCode};

impl Database {
    // -- Users --

    /// Insert a user. Returns `None` when the nickname is already taken.
    pub fn create_user(&self, nickname: &str, password_hash: &str) -> Result<Option<i64>> {
        self.with_conn(|conn| {
            match conn.execute(
                "INSERT INTO users (nickname, password) VALUES (?1, ?2)",
                (nickname, password_hash),
            ) {
                Ok(_) => Ok(Some(conn.last_insert_rowid())),
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.code == ErrorCode::ConstraintViolation =>
                {
                    Ok(None)
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get_user_by_nickname(&self, nickname: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_nickname(conn, nickname))
    }

    // -- Posts --

    pub fn create_post(&self, user_id: i64, title: &str, content: &str) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO posts (user_id, title, content) VALUES (?1, ?2, ?3)",
                rusqlite::params![user_id, title, content],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// All posts, newest first. Ties on `created_at` fall back to id so the
    /// order is total.
    pub fn list_posts(&self) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT p.id, p.user_id, u.nickname, p.title, p.content, p.created_at, p.updated_at
                 FROM posts p
                 JOIN users u ON p.user_id = u.id
                 ORDER BY p.created_at DESC, p.id DESC",
            )?;

            let rows = stmt
                .query_map([], map_post_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn get_post(&self, id: i64) -> Result<Option<PostRow>> {
        self.with_conn(|conn| query_post(conn, id))
    }

    /// Owner of a post, or `None` if it does not exist.
    pub fn post_owner(&self, id: i64) -> Result<Option<i64>> {
        self.with_conn(|conn| query_post_owner(conn, id))
    }

    pub fn update_post(
        &self,
        id: i64,
        user_id: i64,
        title: &str,
        content: &str,
    ) -> Result<OwnedMutation> {
        self.with_conn(|conn| {
            let sql = format!(
                "UPDATE posts SET title = ?3, content = ?4, updated_at = {NOW_SQL}
                 WHERE id = ?1 AND user_id = ?2"
            );
            let changed = conn.execute(&sql, rusqlite::params![id, user_id, title, content])?;
            classify(changed, query_post_owner(conn, id)?)
        })
    }

    /// Delete a post and, through the foreign-key cascade, its comments.
    pub fn delete_post(&self, id: i64, user_id: i64) -> Result<OwnedMutation> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "DELETE FROM posts WHERE id = ?1 AND user_id = ?2",
                rusqlite::params![id, user_id],
            )?;
            classify(changed, query_post_owner(conn, id)?)
        })
    }

    // -- Comments --

    /// Insert a comment. Returns `None` when the post does not exist.
    pub fn create_comment(&self, post_id: i64, user_id: i64, comment: &str) -> Result<Option<i64>> {
        self.with_conn(|conn| {
            if query_post_owner(conn, post_id)?.is_none() {
                return Ok(None);
            }

            conn.execute(
                "INSERT INTO comments (post_id, user_id, comment) VALUES (?1, ?2, ?3)",
                rusqlite::params![post_id, user_id, comment],
            )?;
            Ok(Some(conn.last_insert_rowid()))
        })
    }

    /// Comments of a post, newest first. `None` when the post does not exist.
    pub fn list_comments(&self, post_id: i64) -> Result<Option<Vec<CommentRow>>> {
        self.with_conn(|conn| {
            if query_post_owner(conn, post_id)?.is_none() {
                return Ok(None);
            }

            let mut stmt = conn.prepare(
                "SELECT c.id, c.post_id, c.user_id, u.nickname, c.comment, c.created_at, c.updated_at
                 FROM comments c
                 JOIN users u ON c.user_id = u.id
                 WHERE c.post_id = ?1
                 ORDER BY c.created_at DESC, c.id DESC",
            )?;

            let rows = stmt
                .query_map([post_id], map_comment_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(Some(rows))
        })
    }

    /// Owner of a comment under the given post, or `None`.
    pub fn comment_owner(&self, post_id: i64, id: i64) -> Result<Option<i64>> {
        self.with_conn(|conn| query_comment_owner(conn, post_id, id))
    }

    pub fn update_comment(
        &self,
        post_id: i64,
        id: i64,
        user_id: i64,
        comment: &str,
    ) -> Result<OwnedMutation> {
        self.with_conn(|conn| {
            let sql = format!(
                "UPDATE comments SET comment = ?4, updated_at = {NOW_SQL}
                 WHERE id = ?1 AND post_id = ?2 AND user_id = ?3"
            );
            let changed = conn.execute(&sql, rusqlite::params![id, post_id, user_id, comment])?;
            classify(changed, query_comment_owner(conn, post_id, id)?)
        })
    }

    pub fn delete_comment(&self, post_id: i64, id: i64, user_id: i64) -> Result<OwnedMutation> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "DELETE FROM comments WHERE id = ?1 AND post_id = ?2 AND user_id = ?3",
                rusqlite::params![id, post_id, user_id],
            )?;
            classify(changed, query_comment_owner(conn, post_id, id)?)
        })
    }
}

/// Zero affected rows means the owner filter or the id did not match; the
/// follow-up owner lookup runs under the same lock and tells which.
fn classify(changed: usize, owner_after: Option<i64>) -> Result<OwnedMutation> {
    Ok(match (changed, owner_after) {
        (0, None) => OwnedMutation::Missing,
        (0, Some(_)) => OwnedMutation::NotOwner,
        _ => OwnedMutation::Applied,
    })
}

fn query_user_by_nickname(conn: &Connection, nickname: &str) -> Result<Option<UserRow>> {
    let mut stmt =
        conn.prepare("SELECT id, nickname, password FROM users WHERE nickname = ?1")?;

    let row = stmt
        .query_row([nickname], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                nickname: row.get(1)?,
                password: row.get(2)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_post(conn: &Connection, id: i64) -> Result<Option<PostRow>> {
    let mut stmt = conn.prepare(
        "SELECT p.id, p.user_id, u.nickname, p.title, p.content, p.created_at, p.updated_at
         FROM posts p
         JOIN users u ON p.user_id = u.id
         WHERE p.id = ?1",
    )?;

    let row = stmt.query_row([id], map_post_row).optional()?;
    Ok(row)
}

fn query_post_owner(conn: &Connection, id: i64) -> Result<Option<i64>> {
    conn.query_row("SELECT user_id FROM posts WHERE id = ?1", [id], |row| row.get(0))
        .optional()
}

fn query_comment_owner(conn: &Connection, post_id: i64, id: i64) -> Result<Option<i64>> {
    conn.query_row(
        "SELECT user_id FROM comments WHERE id = ?1 AND post_id = ?2",
        [id, post_id],
        |row| row.get(0),
    )
    .optional()
}

fn map_post_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PostRow> {
    Ok(PostRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        nickname: row.get(2)?,
        title: row.get(3)?,
        content: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn map_comment_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CommentRow> {
    Ok(CommentRow {
        id: row.get(0)?,
        post_id: row.get(1)?,
        user_id: row.get(2)?,
        nickname: row.get(3)?,
        comment: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
