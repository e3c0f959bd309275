use anyhow::Result;
use sqlx::Row;
use uuid::Uuid;

use crate::app::auth::user_from_row;
use crate::domain::user::{PublicUser, User};
use crate::infra::db::Db;

#[derive(Clone)]
pub struct UserService {
    db: Db,
}

impl UserService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<Option<PublicUser>> {
        let row = sqlx::query(
            "SELECT u.id, u.handle, u.email, u.display_name, u.bio, u.avatar_key, u.created_at, \
                    (SELECT COUNT(*) FROM posts p WHERE p.author_id = u.id) AS posts_count \
             FROM users u WHERE u.id = $1",
        )
        .bind(user_id)
        .fetch_optional(self.db.pool())
        .await?;

        let user = row.map(|row| {
            let posts_count: i64 = row.get("posts_count");
            PublicUser::from_user_with_counts(user_from_row(&row), posts_count)
        });

        Ok(user)
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        display_name: Option<String>,
        bio: Option<String>,
        avatar_key: Option<String>,
    ) -> Result<Option<User>> {
        let row = sqlx::query(
            "UPDATE users \
             SET display_name = COALESCE($2, display_name), \
                 bio = COALESCE($3, bio), \
                 avatar_key = COALESCE($4, avatar_key) \
             WHERE id = $1 \
             RETURNING id, handle, email, display_name, bio, avatar_key, created_at",
        )
        .bind(user_id)
        .bind(display_name)
        .bind(bio)
        .bind(avatar_key)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    /// Posts, likes, comments, saved posts, notifications and refresh tokens
    /// go with the user through `ON DELETE CASCADE`.
    pub async fn delete_account(&self, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
