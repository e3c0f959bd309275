use anyhow::Result;
use sqlx::postgres::PgRow;
use sqlx::Row;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::app::notifications::NotificationService;
use crate::app::posts::split_cursor;
use crate::domain::engagement::{Comment, Like};
use crate::domain::notification::NotificationType;
use crate::infra::db::Db;

#[derive(Debug)]
pub enum LikeOutcome {
    Created(Like),
    AlreadyLiked,
    PostNotFound,
}

#[derive(Clone)]
pub struct EngagementService {
    db: Db,
}

impl EngagementService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn like_post(&self, user_id: Uuid, post_id: Uuid) -> Result<LikeOutcome> {
        let mut tx = self.db.pool().begin().await?;

        let author_id: Option<Uuid> =
            sqlx::query_scalar("SELECT author_id FROM posts WHERE id = $1")
                .bind(post_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(author_id) = author_id else {
            tx.rollback().await?;
            return Ok(LikeOutcome::PostNotFound);
        };

        let row = sqlx::query(
            "INSERT INTO likes (user_id, post_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING \
             RETURNING id, user_id, post_id, created_at",
        )
        .bind(user_id)
        .bind(post_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(LikeOutcome::AlreadyLiked);
        };
        let like = like_from_row(&row);

        NotificationService::notify_with_tx(
            user_id,
            author_id,
            Some(post_id),
            NotificationType::Like,
            &mut tx,
        )
        .await?;

        tx.commit().await?;
        Ok(LikeOutcome::Created(like))
    }

    pub async fn unlike_post(&self, user_id: Uuid, post_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM likes WHERE user_id = $1 AND post_id = $2")
            .bind(user_id)
            .bind(post_id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list_likes(
        &self,
        post_id: Uuid,
        cursor: Option<(OffsetDateTime, Uuid)>,
        limit: i64,
    ) -> Result<Vec<Like>> {
        let (cursor_at, cursor_id) = split_cursor(cursor);
        let rows = sqlx::query(
            "SELECT id, user_id, post_id, created_at \
             FROM likes \
             WHERE post_id = $1 \
               AND ($2::timestamptz IS NULL \
                    OR created_at < $2 \
                    OR (created_at = $2 AND id < $3)) \
             ORDER BY created_at DESC, id DESC \
             LIMIT $4",
        )
        .bind(post_id)
        .bind(cursor_at)
        .bind(cursor_id)
        .bind(limit)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.iter().map(like_from_row).collect())
    }

    /// Returns `None` when the post does not exist.
    pub async fn comment_post(
        &self,
        user_id: Uuid,
        post_id: Uuid,
        body: String,
    ) -> Result<Option<Comment>> {
        let mut tx = self.db.pool().begin().await?;

        let author_id: Option<Uuid> =
            sqlx::query_scalar("SELECT author_id FROM posts WHERE id = $1")
                .bind(post_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(author_id) = author_id else {
            tx.rollback().await?;
            return Ok(None);
        };

        let row = sqlx::query(
            "WITH inserted AS ( \
                INSERT INTO comments (user_id, post_id, body) VALUES ($1, $2, $3) \
                RETURNING id, user_id, post_id, body, created_at \
             ) \
             SELECT c.*, u.handle AS user_handle \
             FROM inserted c \
             JOIN users u ON u.id = c.user_id",
        )
        .bind(user_id)
        .bind(post_id)
        .bind(body)
        .fetch_one(&mut *tx)
        .await?;
        let comment = comment_from_row(&row);

        NotificationService::notify_with_tx(
            user_id,
            author_id,
            Some(post_id),
            NotificationType::Comment,
            &mut tx,
        )
        .await?;

        tx.commit().await?;
        Ok(Some(comment))
    }

    pub async fn list_comments(
        &self,
        post_id: Uuid,
        cursor: Option<(OffsetDateTime, Uuid)>,
        limit: i64,
    ) -> Result<Vec<Comment>> {
        let (cursor_at, cursor_id) = split_cursor(cursor);
        let rows = sqlx::query(
            "SELECT c.id, c.user_id, u.handle AS user_handle, c.post_id, c.body, c.created_at \
             FROM comments c \
             JOIN users u ON u.id = c.user_id \
             WHERE c.post_id = $1 \
               AND ($2::timestamptz IS NULL \
                    OR c.created_at < $2 \
                    OR (c.created_at = $2 AND c.id < $3)) \
             ORDER BY c.created_at DESC, c.id DESC \
             LIMIT $4",
        )
        .bind(post_id)
        .bind(cursor_at)
        .bind(cursor_id)
        .bind(limit)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.iter().map(comment_from_row).collect())
    }

    pub async fn delete_comment(
        &self,
        comment_id: Uuid,
        post_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM comments WHERE id = $1 AND post_id = $2 AND user_id = $3",
        )
        .bind(comment_id)
        .bind(post_id)
        .bind(user_id)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn like_from_row(row: &PgRow) -> Like {
    Like {
        id: row.get("id"),
        user_id: row.get("user_id"),
        post_id: row.get("post_id"),
        created_at: row.get("created_at"),
    }
}

fn comment_from_row(row: &PgRow) -> Comment {
    Comment {
        id: row.get("id"),
        user_id: row.get("user_id"),
        user_handle: row.get("user_handle"),
        post_id: row.get("post_id"),
        body: row.get("body"),
        created_at: row.get("created_at"),
    }
}
