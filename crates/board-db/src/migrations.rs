use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

/// Timestamps are ISO-8601 UTC with milliseconds, so text order is time order.
pub const NOW_SQL: &str = "strftime('%Y-%m-%dT%H:%M:%fZ', 'now')";

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(&format!(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            nickname    TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT ({NOW_SQL}),
            updated_at  TEXT NOT NULL DEFAULT ({NOW_SQL})
        );

        CREATE TABLE IF NOT EXISTS posts (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id     INTEGER NOT NULL REFERENCES users(id),
            title       TEXT NOT NULL,
            content     TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT ({NOW_SQL}),
            updated_at  TEXT NOT NULL DEFAULT ({NOW_SQL})
        );

        CREATE INDEX IF NOT EXISTS idx_posts_created
            ON posts(created_at);

        CREATE TABLE IF NOT EXISTS comments (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            post_id     INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
            user_id     INTEGER NOT NULL REFERENCES users(id),
            comment     TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT ({NOW_SQL}),
            updated_at  TEXT NOT NULL DEFAULT ({NOW_SQL})
        );

        CREATE INDEX IF NOT EXISTS idx_comments_post
            ON comments(post_id, created_at);
        "
    ))?;

    info!("Database migrations complete");
    Ok(())
}
