use anyhow::Result;
use uuid::Uuid;

use crate::app::passwords::hash_password;
use crate::infra::db::Db;

/// Every table, children before the tables they reference.
pub const RESET_ORDER: [&str; 7] = [
    "notifications",
    "saved_posts",
    "comments",
    "likes",
    "posts",
    "refresh_tokens",
    "users",
];

/// Foreign keys in `migrations/`, as (table, tables it references).
pub const TABLE_DEPENDENCIES: [(&str, &[&str]); 7] = [
    ("notifications", &["users", "posts"]),
    ("saved_posts", &["users", "posts"]),
    ("comments", &["users", "posts"]),
    ("likes", &["users", "posts"]),
    ("posts", &["users"]),
    ("refresh_tokens", &["users"]),
    ("users", &[]),
];

#[derive(Debug, Clone)]
pub struct SeedUser {
    pub handle: String,
    pub email: String,
    pub display_name: String,
    pub password: String,
}

impl SeedUser {
    pub fn new(handle: &str, display_name: &str, password: &str) -> Self {
        Self {
            handle: handle.to_string(),
            email: format!("{}@example.com", handle),
            display_name: display_name.to_string(),
            password: password.to_string(),
        }
    }

    /// The two accounts a fresh database starts with.
    pub fn defaults(password: &str) -> Vec<SeedUser> {
        vec![
            SeedUser::new("alice", "Alice", password),
            SeedUser::new("bob", "Bob", password),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct SeededUser {
    pub id: Uuid,
    pub handle: String,
}

#[derive(Debug, Default, Clone)]
pub struct ResetReport {
    pub deleted: Vec<(&'static str, u64)>,
    pub seeded: Vec<SeededUser>,
}

impl ResetReport {
    pub fn total_deleted(&self) -> u64 {
        self.deleted.iter().map(|(_, rows)| rows).sum()
    }
}

/// Empties every table and inserts `seeds`, all in one transaction.
pub async fn reset_database(db: &Db, seeds: &[SeedUser]) -> Result<ResetReport> {
    // Hash up front so the transaction is not held open across Argon2 work.
    let mut hashed = Vec::with_capacity(seeds.len());
    for seed in seeds {
        hashed.push((seed, hash_password(&seed.password)?));
    }

    let mut tx = db.pool().begin().await?;
    let mut report = ResetReport::default();

    for table in RESET_ORDER {
        let result = sqlx::query(&format!("DELETE FROM {}", table))
            .execute(&mut *tx)
            .await?;
        tracing::info!(table, rows = result.rows_affected(), "cleared table");
        report.deleted.push((table, result.rows_affected()));
    }

    for (seed, password_hash) in hashed {
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO users (handle, email, display_name, password_hash) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(&seed.handle)
        .bind(&seed.email)
        .bind(&seed.display_name)
        .bind(password_hash)
        .fetch_one(&mut *tx)
        .await?;
        tracing::info!(user_id = %id, handle = %seed.handle, "seeded user");
        report.seeded.push(SeededUser {
            id,
            handle: seed.handle.clone(),
        });
    }

    tx.commit().await?;
    tracing::info!(
        deleted = report.total_deleted(),
        seeded = report.seeded.len(),
        "database reset finished"
    );
    Ok(report)
}
