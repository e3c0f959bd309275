use anyhow::{anyhow, Result};
use sqlx::postgres::PgRow;
use sqlx::Row;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::app::posts::split_cursor;
use crate::domain::notification::{Notification, NotificationType};
use crate::infra::db::Db;

#[derive(Clone)]
pub struct NotificationService {
    db: Db,
}

impl NotificationService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Records a notification for `receiver_id` unless the actor is acting on
    /// their own post. Returns whether a row was written.
    pub async fn notify_with_tx(
        sender_id: Uuid,
        receiver_id: Uuid,
        post_id: Option<Uuid>,
        notification_type: NotificationType,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<bool> {
        if sender_id == receiver_id {
            return Ok(false);
        }

        sqlx::query(
            "INSERT INTO notifications (sender_id, receiver_id, post_id, notification_type) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(sender_id)
        .bind(receiver_id)
        .bind(post_id)
        .bind(notification_type.as_db())
        .execute(&mut **tx)
        .await?;

        Ok(true)
    }

    pub async fn list(
        &self,
        receiver_id: Uuid,
        cursor: Option<(OffsetDateTime, Uuid)>,
        limit: i64,
    ) -> Result<Vec<Notification>> {
        let (cursor_at, cursor_id) = split_cursor(cursor);
        let rows = sqlx::query(
            "SELECT n.id, n.sender_id, s.handle AS sender_handle, n.receiver_id, n.post_id, \
                    n.notification_type, n.read_at, n.created_at \
             FROM notifications n \
             JOIN users s ON s.id = n.sender_id \
             WHERE n.receiver_id = $1 \
               AND ($2::timestamptz IS NULL \
                    OR n.created_at < $2 \
                    OR (n.created_at = $2 AND n.id < $3)) \
             ORDER BY n.created_at DESC, n.id DESC \
             LIMIT $4",
        )
        .bind(receiver_id)
        .bind(cursor_at)
        .bind(cursor_id)
        .bind(limit)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(notification_from_row).collect()
    }

    pub async fn mark_read(&self, notification_id: Uuid, receiver_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE notifications \
             SET read_at = now() \
             WHERE id = $1 AND receiver_id = $2 AND read_at IS NULL",
        )
        .bind(notification_id)
        .bind(receiver_id)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn mark_all_read(&self, receiver_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET read_at = now() \
             WHERE receiver_id = $1 AND read_at IS NULL",
        )
        .bind(receiver_id)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn unread_count(&self, receiver_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE receiver_id = $1 AND read_at IS NULL",
        )
        .bind(receiver_id)
        .fetch_one(self.db.pool())
        .await?;

        Ok(count)
    }
}

fn notification_from_row(row: &PgRow) -> Result<Notification> {
    let kind: String = row.get("notification_type");
    let notification_type = NotificationType::from_db(&kind)
        .ok_or_else(|| anyhow!("unknown notification type: {}", kind))?;

    Ok(Notification {
        id: row.get("id"),
        sender_id: row.get("sender_id"),
        sender_handle: row.get("sender_handle"),
        receiver_id: row.get("receiver_id"),
        post_id: row.get("post_id"),
        notification_type,
        read_at: row.get("read_at"),
        created_at: row.get("created_at"),
    })
}
