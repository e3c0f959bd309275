#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::sync::OnceCell;
use tower::ServiceExt;
use uuid::Uuid;

use quill::app::auth::AuthService;
use quill::app::passwords::hash_password;
use quill::app::tokens::TokenIssuer;
use quill::config::DbConfig;
use quill::infra::db::Db;
use quill::AppState;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

// Test-only keys.
const TEST_ACCESS_KEY: [u8; 32] = *b"0123456789abcdef0123456789abcdef";
const TEST_REFRESH_KEY: [u8; 32] = *b"fedcba9876543210fedcba9876543210";
pub const TEST_ADMIN_TOKEN: &str = "test-admin-token-12345";
pub const DEFAULT_PASSWORD: &str = "testpassword123";

// ---------------------------------------------------------------------------
// TestApp
// ---------------------------------------------------------------------------

pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub db_config: DbConfig,
}

pub struct TestResponse {
    pub status: StatusCode,
    body_bytes: bytes::Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body_bytes).unwrap_or(Value::Null)
    }

    pub fn error_message(&self) -> String {
        self.json()["error"].as_str().unwrap_or("").to_string()
    }
}

pub struct TestUser {
    pub id: Uuid,
    pub handle: String,
    pub email: String,
    pub access_token: String,
    pub refresh_token: String,
}

/// Schema setup runs once per test binary.
static PREPARED: OnceCell<()> = OnceCell::const_new();

/// Builds a TestApp against `TEST_DATABASE_URL`, or returns `None` when the
/// variable is unset so database tests are skipped.
///
/// Each `#[tokio::test]` gets its own runtime, so every call opens a fresh
/// pool instead of sharing one across runtimes.
pub async fn app() -> Option<TestApp> {
    let database_url = match std::env::var("TEST_DATABASE_URL") {
        Ok(url) if !url.is_empty() => url,
        _ => {
            eprintln!("TEST_DATABASE_URL not set; skipping database test");
            return None;
        }
    };

    PREPARED
        .get_or_init(|| prepare_database(database_url.clone()))
        .await;

    Some(TestApp::connect(database_url).await)
}

async fn prepare_database(database_url: String) {
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .expect("cannot connect to test database");
    let db = Db::from_pool(pool);

    db.migrate().await.expect("migrations failed");

    // Clean slate, keeping the migration bookkeeping.
    sqlx::raw_sql(
        "DO $$ DECLARE r RECORD; BEGIN \
         FOR r IN (SELECT tablename FROM pg_tables \
                   WHERE schemaname = 'public' AND tablename <> '_sqlx_migrations') LOOP \
         EXECUTE 'TRUNCATE TABLE ' || quote_ident(r.tablename) || ' CASCADE'; \
         END LOOP; END $$;",
    )
    .execute(db.pool())
    .await
    .expect("failed to truncate tables");

    db.close().await;
}

impl TestApp {
    async fn connect(database_url: String) -> Self {
        let db_config = DbConfig {
            database_url,
            max_connections: 5,
            connect_timeout_seconds: 30,
            idle_timeout_seconds: 60,
            max_lifetime_seconds: 300,
        };
        let db = Db::connect(&db_config).await.expect("Db::connect failed");

        let state = AppState {
            db,
            tokens: TokenIssuer::new(TEST_ACCESS_KEY, TEST_REFRESH_KEY, 15, 30),
            admin_token: Some(TEST_ADMIN_TOKEN.to_string()),
        };
        let router = quill::http::router(state.clone());

        TestApp {
            router,
            state,
            db_config,
        }
    }

    // ------------------------------------------------------------------
    // Low-level request helper
    // ------------------------------------------------------------------
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header("host", "localhost");

        for &(key, value) in headers {
            builder = builder.header(key, value);
        }

        let request = if let Some(body) = body {
            builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap()
        } else {
            builder.body(Body::empty()).unwrap()
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("oneshot failed");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("failed to collect body")
            .to_bytes();

        TestResponse { status, body_bytes }
    }

    // ------------------------------------------------------------------
    // Convenience HTTP helpers
    // ------------------------------------------------------------------
    pub async fn get(&self, path: &str, token: Option<&str>) -> TestResponse {
        let mut headers = vec![];
        let auth;
        if let Some(t) = token {
            auth = format!("Bearer {}", t);
            headers.push(("Authorization", auth.as_str()));
        }
        self.request(Method::GET, path, None, &headers).await
    }

    pub async fn post_json(&self, path: &str, body: Value, token: Option<&str>) -> TestResponse {
        let mut headers = vec![];
        let auth;
        if let Some(t) = token {
            auth = format!("Bearer {}", t);
            headers.push(("Authorization", auth.as_str()));
        }
        self.request(Method::POST, path, Some(body), &headers).await
    }

    pub async fn patch_json(&self, path: &str, body: Value, token: Option<&str>) -> TestResponse {
        let mut headers = vec![];
        let auth;
        if let Some(t) = token {
            auth = format!("Bearer {}", t);
            headers.push(("Authorization", auth.as_str()));
        }
        self.request(Method::PATCH, path, Some(body), &headers)
            .await
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> TestResponse {
        let mut headers = vec![];
        let auth;
        if let Some(t) = token {
            auth = format!("Bearer {}", t);
            headers.push(("Authorization", auth.as_str()));
        }
        self.request(Method::DELETE, path, None, &headers).await
    }

    /// GET with an admin token in the x-admin-token header.
    pub async fn get_admin(&self, path: &str, admin_token: Option<&str>) -> TestResponse {
        let mut headers = vec![];
        if let Some(t) = admin_token {
            headers.push(("x-admin-token", t));
        }
        self.request(Method::GET, path, None, &headers).await
    }

    // ------------------------------------------------------------------
    // Test data helpers
    // ------------------------------------------------------------------

    /// Suffixes are made unique so tests in one binary never collide.
    fn unique(suffix: &str) -> String {
        let tag = Uuid::new_v4().simple().to_string();
        format!("{}_{}", suffix, &tag[..8])
    }

    /// Create a user directly in the DB and issue tokens for it.
    pub async fn create_user(&self, suffix: &str) -> TestUser {
        let unique = Self::unique(suffix);
        let handle = format!("testuser_{}", unique);
        let email = format!("test_{}@example.com", unique);
        let hash = hash_password(DEFAULT_PASSWORD).expect("password hash failed");

        let user_id = self.insert_user(&handle, &email, &hash).await;

        let auth_service = AuthService::new(self.state.db.clone(), self.state.tokens.clone());
        let tokens = auth_service
            .issue_token_pair(user_id)
            .await
            .expect("issue_token_pair failed");

        TestUser {
            id: user_id,
            handle,
            email,
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        }
    }

    /// Insert a user row with `password_hash` stored verbatim. Returns the id.
    pub async fn insert_user(&self, handle: &str, email: &str, password_hash: &str) -> Uuid {
        sqlx::query_scalar(
            "INSERT INTO users (handle, email, display_name, password_hash) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(handle)
        .bind(email)
        .bind(format!("Test {}", handle))
        .bind(password_hash)
        .fetch_one(self.pool())
        .await
        .expect("insert test user failed")
    }

    /// Insert a post directly in DB. Returns the post id.
    pub async fn create_post_for_user(&self, author_id: Uuid) -> Uuid {
        sqlx::query_scalar(
            "INSERT INTO posts (author_id, title, body) \
             VALUES ($1, 'test title', 'test body') RETURNING id",
        )
        .bind(author_id)
        .fetch_one(self.pool())
        .await
        .expect("insert test post failed")
    }

    /// Return the pool for direct DB assertions.
    pub fn pool(&self) -> &PgPool {
        self.state.db.pool()
    }

    pub async fn count(&self, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(self.pool())
            .await
            .expect("count failed")
    }
}
