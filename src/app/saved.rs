use anyhow::Result;
use sqlx::Row;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::app::posts::{post_from_row, split_cursor, POST_COLUMNS};
use crate::domain::saved::{SavedPost, SavedPostEntry};
use crate::infra::db::Db;

#[derive(Debug)]
pub enum SaveOutcome {
    Saved(SavedPost),
    AlreadySaved,
    PostNotFound,
}

#[derive(Clone)]
pub struct SavedPostService {
    db: Db,
}

impl SavedPostService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn save_post(&self, user_id: Uuid, post_id: Uuid) -> Result<SaveOutcome> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM posts WHERE id = $1)")
            .bind(post_id)
            .fetch_one(self.db.pool())
            .await?;
        if !exists {
            return Ok(SaveOutcome::PostNotFound);
        }

        let row = sqlx::query(
            "INSERT INTO saved_posts (user_id, post_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING \
             RETURNING id, user_id, post_id, created_at",
        )
        .bind(user_id)
        .bind(post_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(match row {
            Some(row) => SaveOutcome::Saved(SavedPost {
                id: row.get("id"),
                user_id: row.get("user_id"),
                post_id: row.get("post_id"),
                created_at: row.get("created_at"),
            }),
            None => SaveOutcome::AlreadySaved,
        })
    }

    pub async fn unsave_post(&self, user_id: Uuid, post_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM saved_posts WHERE user_id = $1 AND post_id = $2")
            .bind(user_id)
            .bind(post_id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Most recently saved first; the cursor is over the save, not the post.
    pub async fn list_saved(
        &self,
        user_id: Uuid,
        cursor: Option<(OffsetDateTime, Uuid)>,
        limit: i64,
    ) -> Result<Vec<SavedPostEntry>> {
        let (cursor_at, cursor_id) = split_cursor(cursor);
        let sql = format!(
            "SELECT s.id AS saved_id, s.created_at AS saved_at, {POST_COLUMNS} \
             FROM saved_posts s \
             JOIN posts p ON p.id = s.post_id \
             JOIN users u ON u.id = p.author_id \
             WHERE s.user_id = $1 \
               AND ($2::timestamptz IS NULL \
                    OR s.created_at < $2 \
                    OR (s.created_at = $2 AND s.id < $3)) \
             ORDER BY s.created_at DESC, s.id DESC \
             LIMIT $4"
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .bind(cursor_at)
            .bind(cursor_id)
            .bind(limit)
            .fetch_all(self.db.pool())
            .await?;

        let entries = rows
            .iter()
            .map(|row| SavedPostEntry {
                id: row.get("saved_id"),
                saved_at: row.get("saved_at"),
                post: post_from_row(row),
            })
            .collect();

        Ok(entries)
    }
}
