use chrono::{DateTime, Utc};
use tracing::warn;

use board_db::models::{CommentRow, PostRow};
use board_types::models::{Comment, Post, PostSummary};

/// Stored timestamps are RFC 3339. SQLite's `datetime('now')` format (no zone,
/// no `T`) is also accepted, as naive UTC, for rows inserted by hand.
pub fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", raw, e);
            DateTime::default()
        })
}

pub fn post_summary(row: PostRow) -> PostSummary {
    PostSummary {
        post_id: row.id,
        user_id: row.user_id,
        nickname: row.nickname,
        title: row.title,
        created_at: parse_timestamp(&row.created_at),
        updated_at: parse_timestamp(&row.updated_at),
    }
}

pub fn post(row: PostRow) -> Post {
    Post {
        post_id: row.id,
        user_id: row.user_id,
        nickname: row.nickname,
        title: row.title,
        content: row.content,
        created_at: parse_timestamp(&row.created_at),
        updated_at: parse_timestamp(&row.updated_at),
    }
}

pub fn comment(row: CommentRow) -> Comment {
    Comment {
        comment_id: row.id,
        post_id: row.post_id,
        user_id: row.user_id,
        nickname: row.nickname,
        comment: row.comment,
        created_at: parse_timestamp(&row.created_at),
        updated_at: parse_timestamp(&row.updated_at),
    }
}
