//! Admin Tooling Tests
//!
//! Reset and backfill touch every row, so tests in this file run one at a
//! time behind `SERIAL`.

mod common;

use axum::http::StatusCode;
use common::{app, TEST_ADMIN_TOKEN};
use tokio::sync::Mutex;

use quill::admin::backfill::{backfill_passwords, hash_if_unchanged};
use quill::admin::inspect::inspect_database;
use quill::admin::reset::{reset_database, SeedUser, RESET_ORDER};
use quill::admin::smoke::{auth_smoke_test, find_user_id};
use quill::admin::with_db;
use quill::app::passwords::{is_password_hashed, verify_password};

static SERIAL: Mutex<()> = Mutex::const_new(());

async fn stored_password(app: &common::TestApp, handle: &str) -> String {
    sqlx::query_scalar("SELECT password_hash FROM users WHERE handle = $1")
        .bind(handle)
        .fetch_one(app.pool())
        .await
        .unwrap()
}

// ===========================================================================
// Reset
// ===========================================================================

#[tokio::test]
async fn reset_leaves_only_seeded_users() {
    let _guard = SERIAL.lock().await;
    let Some(app) = app().await else { return };
    let user = app.create_user("reset_victim").await;
    app.create_post_for_user(user.id).await;

    let report = reset_database(&app.state.db, &SeedUser::defaults("seedpassword"))
        .await
        .unwrap();
    assert!(report.total_deleted() >= 3);
    assert_eq!(report.deleted.len(), RESET_ORDER.len());
    assert_eq!(report.seeded.len(), 2);

    assert_eq!(app.count("users").await, 2);
    for table in RESET_ORDER.iter().filter(|table| **table != "users") {
        assert_eq!(app.count(table).await, 0, "{} not emptied", table);
    }

    let stored = stored_password(&app, "alice").await;
    assert!(is_password_hashed(&stored));
    assert!(verify_password("seedpassword", &stored).unwrap());
}

#[tokio::test]
async fn seeded_user_can_log_in() {
    let _guard = SERIAL.lock().await;
    let Some(app) = app().await else { return };

    reset_database(&app.state.db, &SeedUser::defaults("seedpassword"))
        .await
        .unwrap();

    let resp = app
        .post_json(
            "/auth/login",
            serde_json::json!({ "handle": "bob", "password": "seedpassword" }),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
}

// ===========================================================================
// Password Backfill
// ===========================================================================

#[tokio::test]
async fn backfill_hashes_plaintext_once() {
    let _guard = SERIAL.lock().await;
    let Some(app) = app().await else { return };
    app.insert_user("legacy_plain", "legacy_plain@example.com", "oldpassword")
        .await;
    let existing = app.create_user("already_hashed").await;
    let before = stored_password(&app, &existing.handle).await;

    let report = backfill_passwords(&app.state.db, false).await.unwrap();
    assert!(report.hashed >= 1);

    let stored = stored_password(&app, "legacy_plain").await;
    assert!(is_password_hashed(&stored));
    assert!(verify_password("oldpassword", &stored).unwrap());
    assert_eq!(stored_password(&app, &existing.handle).await, before);

    let again = backfill_passwords(&app.state.db, false).await.unwrap();
    assert_eq!(again.hashed, 0);
    assert_eq!(again.skipped, 0);
    assert_eq!(again.scanned, again.already_hashed + again.empty);
}

#[tokio::test]
async fn backfill_dry_run_writes_nothing() {
    let _guard = SERIAL.lock().await;
    let Some(app) = app().await else { return };
    app.insert_user("legacy_dry", "legacy_dry@example.com", "drypassword")
        .await;

    let report = backfill_passwords(&app.state.db, true).await.unwrap();
    assert!(report.hashed >= 1);
    assert_eq!(stored_password(&app, "legacy_dry").await, "drypassword");

    // Leave nothing in plaintext for the other tests.
    backfill_passwords(&app.state.db, false).await.unwrap();
}

#[tokio::test]
async fn stale_plaintext_is_not_written() {
    let _guard = SERIAL.lock().await;
    let Some(app) = app().await else { return };
    let user_id = app
        .insert_user("legacy_stale", "legacy_stale@example.com", "stalepassword")
        .await;

    // The user changes their password after the backfill read the row.
    let fresh = quill::app::passwords::hash_password("freshpassword").unwrap();
    sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
        .bind(&fresh)
        .bind(user_id)
        .execute(app.pool())
        .await
        .unwrap();

    let written = hash_if_unchanged(&app.state.db, user_id, "stalepassword")
        .await
        .unwrap();
    assert!(!written);
    assert_eq!(stored_password(&app, "legacy_stale").await, fresh);

    let report = backfill_passwords(&app.state.db, false).await.unwrap();
    assert_eq!(report.skipped, 0);
}

#[tokio::test]
async fn unchanged_plaintext_is_written() {
    let _guard = SERIAL.lock().await;
    let Some(app) = app().await else { return };
    let user_id = app
        .insert_user("legacy_current", "legacy_current@example.com", "currentpassword")
        .await;

    let written = hash_if_unchanged(&app.state.db, user_id, "currentpassword")
        .await
        .unwrap();
    assert!(written);
    let stored = stored_password(&app, "legacy_current").await;
    assert!(verify_password("currentpassword", &stored).unwrap());
}

#[tokio::test]
async fn backfilled_user_can_log_in() {
    let _guard = SERIAL.lock().await;
    let Some(app) = app().await else { return };
    app.insert_user("legacy_login_after", "legacy_login_after@example.com", "plainpass1")
        .await;

    backfill_passwords(&app.state.db, false).await.unwrap();

    let resp = app
        .post_json(
            "/auth/login",
            serde_json::json!({ "email": "legacy_login_after@example.com", "password": "plainpass1" }),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
}

// ===========================================================================
// Inspect & Runner
// ===========================================================================

#[tokio::test]
async fn inspect_through_runner() {
    let _guard = SERIAL.lock().await;
    let Some(app) = app().await else { return };
    let user = app.create_user("inspect_me").await;
    app.create_post_for_user(user.id).await;

    let summary = with_db(&app.db_config, "inspect", |db| async move {
        inspect_database(&db).await
    })
    .await
    .unwrap();

    assert_eq!(summary.tables.len(), RESET_ORDER.len());
    assert!(summary.rows("posts").unwrap() >= 1);
    let overview = summary
        .users
        .iter()
        .find(|overview| overview.id == user.id)
        .unwrap();
    assert_eq!(overview.posts_count, 1);
    assert_eq!(overview.password.label(), "hashed");
}

#[tokio::test]
async fn runner_reports_task_error() {
    let _guard = SERIAL.lock().await;
    let Some(app) = app().await else { return };

    let result = with_db(&app.db_config, "lookup", |db| async move {
        find_user_id(&db, "no_such_handle").await
    })
    .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn auth_check_for_existing_user() {
    let _guard = SERIAL.lock().await;
    let Some(app) = app().await else { return };
    let user = app.create_user("auth_check").await;

    let user_id = find_user_id(&app.state.db, &user.handle).await.unwrap();
    assert_eq!(user_id, user.id);
    assert_eq!(auth_smoke_test(&app.state.tokens, user_id).unwrap(), user.id);
}

// ===========================================================================
// Admin HTTP
// ===========================================================================

#[tokio::test]
async fn summary_requires_admin_token() {
    let _guard = SERIAL.lock().await;
    let Some(app) = app().await else { return };

    let resp = app.get_admin("/admin/summary", None).await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);

    let resp = app.get_admin("/admin/summary", Some("wrong-token")).await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn summary_with_admin_token() {
    let _guard = SERIAL.lock().await;
    let Some(app) = app().await else { return };
    app.create_user("summary").await;

    let resp = app.get_admin("/admin/summary", Some(TEST_ADMIN_TOKEN)).await;
    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["tables"].as_array().unwrap().len(), RESET_ORDER.len());
    assert!(!body["users"].as_array().unwrap().is_empty());
}
