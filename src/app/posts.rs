use anyhow::Result;
use sqlx::postgres::PgRow;
use sqlx::Row;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::post::Post;
use crate::infra::db::Db;

/// Columns every post query selects, with `p` = posts and `u` = author.
pub(crate) const POST_COLUMNS: &str = "p.id, p.author_id, \
     u.handle AS author_handle, u.display_name AS author_display_name, \
     p.title, p.body, p.created_at, p.updated_at, \
     (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS like_count, \
     (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count";

#[derive(Clone)]
pub struct PostService {
    db: Db,
}

impl PostService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn create_post(&self, author_id: Uuid, title: String, body: String) -> Result<Post> {
        let post_id: Uuid = sqlx::query_scalar(
            "INSERT INTO posts (author_id, title, body) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(author_id)
        .bind(title)
        .bind(body)
        .fetch_one(self.db.pool())
        .await?;

        self.get_post(post_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("post {} vanished after insert", post_id))
    }

    pub async fn get_post(&self, post_id: Uuid) -> Result<Option<Post>> {
        let sql = format!(
            "SELECT {POST_COLUMNS} \
             FROM posts p \
             JOIN users u ON p.author_id = u.id \
             WHERE p.id = $1"
        );
        let row = sqlx::query(&sql)
            .bind(post_id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.as_ref().map(post_from_row))
    }

    pub async fn update_post(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        title: Option<String>,
        body: Option<String>,
    ) -> Result<Option<Post>> {
        let updated: Option<Uuid> = sqlx::query_scalar(
            "UPDATE posts \
             SET title = COALESCE($3, title), \
                 body = COALESCE($4, body), \
                 updated_at = now() \
             WHERE id = $1 AND author_id = $2 \
             RETURNING id",
        )
        .bind(post_id)
        .bind(author_id)
        .bind(title)
        .bind(body)
        .fetch_optional(self.db.pool())
        .await?;

        match updated {
            Some(post_id) => self.get_post(post_id).await,
            None => Ok(None),
        }
    }

    pub async fn delete_post(&self, post_id: Uuid, author_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1 AND author_id = $2")
            .bind(post_id)
            .bind(author_id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list_by_user(
        &self,
        author_id: Uuid,
        cursor: Option<(OffsetDateTime, Uuid)>,
        limit: i64,
    ) -> Result<Vec<Post>> {
        let (cursor_at, cursor_id) = split_cursor(cursor);
        let sql = format!(
            "SELECT {POST_COLUMNS} \
             FROM posts p \
             JOIN users u ON p.author_id = u.id \
             WHERE p.author_id = $1 \
               AND ($2::timestamptz IS NULL \
                    OR p.created_at < $2 \
                    OR (p.created_at = $2 AND p.id < $3)) \
             ORDER BY p.created_at DESC, p.id DESC \
             LIMIT $4"
        );
        let rows = sqlx::query(&sql)
            .bind(author_id)
            .bind(cursor_at)
            .bind(cursor_id)
            .bind(limit)
            .fetch_all(self.db.pool())
            .await?;

        Ok(rows.iter().map(post_from_row).collect())
    }

    /// Newest posts from everyone.
    pub async fn list_recent(
        &self,
        cursor: Option<(OffsetDateTime, Uuid)>,
        limit: i64,
    ) -> Result<Vec<Post>> {
        let (cursor_at, cursor_id) = split_cursor(cursor);
        let sql = format!(
            "SELECT {POST_COLUMNS} \
             FROM posts p \
             JOIN users u ON p.author_id = u.id \
             WHERE ($1::timestamptz IS NULL \
                    OR p.created_at < $1 \
                    OR (p.created_at = $1 AND p.id < $2)) \
             ORDER BY p.created_at DESC, p.id DESC \
             LIMIT $3"
        );
        let rows = sqlx::query(&sql)
            .bind(cursor_at)
            .bind(cursor_id)
            .bind(limit)
            .fetch_all(self.db.pool())
            .await?;

        Ok(rows.iter().map(post_from_row).collect())
    }
}

pub(crate) fn post_from_row(row: &PgRow) -> Post {
    Post {
        id: row.get("id"),
        author_id: row.get("author_id"),
        author_handle: row.get("author_handle"),
        author_display_name: row.get("author_display_name"),
        title: row.get("title"),
        body: row.get("body"),
        like_count: row.get("like_count"),
        comment_count: row.get("comment_count"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

pub(crate) fn split_cursor(
    cursor: Option<(OffsetDateTime, Uuid)>,
) -> (Option<OffsetDateTime>, Option<Uuid>) {
    match cursor {
        Some((created_at, id)) => (Some(created_at), Some(id)),
        None => (None, None),
    }
}
