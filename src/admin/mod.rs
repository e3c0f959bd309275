//! Maintenance operations run by `quill-admin`.
//!
//! Each operation borrows a [`Db`] and runs its statements one after another.
//! [`with_db`] owns the connection lifecycle around them.

pub mod backfill;
pub mod inspect;
pub mod reset;
pub mod smoke;

use anyhow::{Context, Result};
use std::future::Future;

use crate::config::DbConfig;
use crate::infra::db::Db;

/// Connects, runs `task`, and closes the pool whether or not the task failed.
/// A failure is logged here before it is handed back to the caller.
pub async fn with_db<T, F, Fut>(config: &DbConfig, task_name: &str, task: F) -> Result<T>
where
    F: FnOnce(Db) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let db = Db::connect(config)
        .await
        .context("failed to connect to database")?;
    tracing::debug!(task = task_name, "database connected");

    let result = task(db.clone()).await;
    if let Err(err) = &result {
        tracing::error!(task = task_name, error = ?err, "admin task failed");
    }

    db.close().await;
    tracing::debug!(task = task_name, "database connection closed");
    result
}
