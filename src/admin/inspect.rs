use anyhow::Result;
use sqlx::Row;
use std::fmt;
use uuid::Uuid;

use crate::admin::backfill::PasswordAction;
use crate::admin::reset::RESET_ORDER;
use crate::infra::db::Db;

#[derive(Debug, Clone)]
pub struct UserOverview {
    pub id: Uuid,
    pub handle: String,
    pub email: String,
    pub password: PasswordAction,
    pub posts_count: i64,
}

#[derive(Debug, Clone, Default)]
pub struct DatabaseSummary {
    pub tables: Vec<(&'static str, i64)>,
    pub users: Vec<UserOverview>,
}

impl DatabaseSummary {
    pub fn rows(&self, table: &str) -> Option<i64> {
        self.tables
            .iter()
            .find(|(name, _)| *name == table)
            .map(|(_, rows)| *rows)
    }
}

pub async fn inspect_database(db: &Db) -> Result<DatabaseSummary> {
    let mut summary = DatabaseSummary::default();

    // Reverse of the reset order reads parents first.
    for table in RESET_ORDER.iter().rev() {
        let rows: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(db.pool())
            .await?;
        summary.tables.push((*table, rows));
    }

    let rows = sqlx::query(
        "SELECT u.id, u.handle, u.email, u.password_hash, \
                (SELECT COUNT(*) FROM posts p WHERE p.author_id = u.id) AS posts_count \
         FROM users u \
         ORDER BY u.created_at, u.handle",
    )
    .fetch_all(db.pool())
    .await?;

    for row in rows {
        let stored: String = row.get("password_hash");
        summary.users.push(UserOverview {
            id: row.get("id"),
            handle: row.get("handle"),
            email: row.get("email"),
            password: PasswordAction::for_stored(&stored),
            posts_count: row.get("posts_count"),
        });
    }

    Ok(summary)
}

impl fmt::Display for DatabaseSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Table row counts ===")?;
        for (table, rows) in &self.tables {
            writeln!(f, "  {:<16} {}", table, rows)?;
        }

        writeln!(f)?;
        writeln!(f, "=== Users ({}) ===", self.users.len())?;
        if self.users.is_empty() {
            writeln!(f, "  (none)")?;
        }
        for (i, user) in self.users.iter().enumerate() {
            writeln!(
                f,
                "  {}. {} <{}> password={} posts={} id={}",
                i + 1,
                user.handle,
                user.email,
                user.password.label(),
                user.posts_count,
                user.id
            )?;
        }
        Ok(())
    }
}
