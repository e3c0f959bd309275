use anyhow::Result;
use sqlx::Row;
use uuid::Uuid;

use crate::app::passwords::{hash_password, is_password_hashed};
use crate::infra::db::Db;

/// What the backfill does with one stored `password_hash` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordAction {
    AlreadyHashed,
    Empty,
    Hash,
}

impl PasswordAction {
    pub fn for_stored(stored: &str) -> Self {
        if stored.is_empty() {
            Self::Empty
        } else if is_password_hashed(stored) {
            Self::AlreadyHashed
        } else {
            Self::Hash
        }
    }

    /// State of the stored value as shown by `quill-admin inspect`.
    pub fn label(&self) -> &'static str {
        match self {
            Self::AlreadyHashed => "hashed",
            Self::Empty => "empty",
            Self::Hash => "plaintext",
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BackfillReport {
    pub scanned: usize,
    pub hashed: usize,
    pub already_hashed: usize,
    pub empty: usize,
    /// Plaintext rows that changed between the read and the write.
    pub skipped: usize,
}

/// Hashes every legacy plaintext password in `users`.
///
/// Already-hashed values are left untouched, so running this twice is a
/// no-op the second time. With `dry_run` nothing is written and `hashed`
/// counts the rows that would have been.
pub async fn backfill_passwords(db: &Db, dry_run: bool) -> Result<BackfillReport> {
    let rows = sqlx::query("SELECT id, handle, password_hash FROM users ORDER BY id")
        .fetch_all(db.pool())
        .await?;

    let mut report = BackfillReport::default();
    for row in rows {
        let user_id: Uuid = row.get("id");
        let handle: String = row.get("handle");
        let stored: String = row.get("password_hash");
        report.scanned += 1;

        match PasswordAction::for_stored(&stored) {
            PasswordAction::AlreadyHashed => {
                report.already_hashed += 1;
                tracing::debug!(%user_id, %handle, "password already hashed");
            }
            PasswordAction::Empty => {
                report.empty += 1;
                tracing::warn!(%user_id, %handle, "user has no password; skipping");
            }
            PasswordAction::Hash => {
                if dry_run {
                    report.hashed += 1;
                    tracing::info!(%user_id, %handle, dry_run, "would hash password");
                } else if hash_if_unchanged(db, user_id, &stored).await? {
                    report.hashed += 1;
                    tracing::info!(%user_id, %handle, "hashed password");
                } else {
                    report.skipped += 1;
                    tracing::warn!(%user_id, %handle, "password changed during backfill; skipping");
                }
            }
        }
    }

    tracing::info!(
        scanned = report.scanned,
        hashed = report.hashed,
        already_hashed = report.already_hashed,
        empty = report.empty,
        skipped = report.skipped,
        dry_run,
        "password backfill finished"
    );
    Ok(report)
}

/// Replaces `stored` with its hash only if the row still holds `stored`.
/// Returns whether the row was written.
pub async fn hash_if_unchanged(db: &Db, user_id: Uuid, stored: &str) -> Result<bool> {
    let hashed = hash_password(stored)?;
    let result = sqlx::query(
        "UPDATE users SET password_hash = $1 \
         WHERE id = $2 AND password_hash = $3",
    )
    .bind(hashed)
    .bind(user_id)
    .bind(stored)
    .execute(db.pool())
    .await?;

    Ok(result.rows_affected() == 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plaintext_is_hashed() {
        assert_eq!(PasswordAction::for_stored("hunter2"), PasswordAction::Hash);
    }

    #[test]
    fn hashed_value_is_never_rehashed() {
        let hash = hash_password("hunter2").unwrap();
        assert_eq!(PasswordAction::for_stored(&hash), PasswordAction::AlreadyHashed);
    }

    #[test]
    fn empty_is_skipped() {
        assert_eq!(PasswordAction::for_stored(""), PasswordAction::Empty);
    }

    #[test]
    fn prefix_alone_is_not_enough() {
        assert_eq!(
            PasswordAction::for_stored("$argon2-is-my-password"),
            PasswordAction::Hash
        );
    }

    #[test]
    fn labels() {
        assert_eq!(PasswordAction::AlreadyHashed.label(), "hashed");
        assert_eq!(PasswordAction::Hash.label(), "plaintext");
        assert_eq!(PasswordAction::Empty.label(), "empty");
    }
}
