#![allow(dead_code)]

use absensi::auth::Role;
use absensi::auth::password::hash_password;
use absensi::db::users::insert_user;
use absensi::models::{NewUser, User};
use absensi::{AppState, Config, router};
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use serde_json::Value;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub db: SqlitePool,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub async fn spawn_app() -> TestApp {
    let db = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create database");

    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .expect("Failed to run migrations");

    app_over(db)
}

/// App over a fresh database file, for tests that need several connections.
pub async fn spawn_file_app() -> (TestApp, std::path::PathBuf) {
    let path = std::env::temp_dir().join(format!("absensi-it-{}.db", uuid::Uuid::new_v4()));
    let db = absensi::db::connect(&format!("sqlite://{}?mode=rwc", path.display()))
        .await
        .expect("Failed to open database file");
    (app_over(db), path)
}

fn app_over(db: SqlitePool) -> TestApp {
    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        jwt_secret: "integration-test-secret-0123456789abcdef".to_string(),
        token_ttl_secs: 3600,
        cookie_secure: false,
    };

    TestApp {
        router: router(AppState::new(db.clone(), &config)),
        db,
    }
}

impl TestApp {
    pub async fn request(&self, method: Method, uri: &str, cookie: Option<&str>, body: Option<Value>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .expect("request failed");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, headers, body }
    }

    /// Inserts an account directly, for roles that cannot self-register.
    pub async fn seed_user(&self, email: &str, password: &str, role: Role) -> User {
        insert_user(
            &self.db,
            NewUser {
                name: email.split('@').next().unwrap().to_string(),
                email: email.to_string(),
                password_hash: hash_password(password).unwrap(),
                role,
            },
        )
        .await
        .expect("Failed to seed user")
    }

    /// Logs in and returns a `Cookie` header value carrying the token.
    pub async fn login(&self, email: &str, password: &str) -> String {
        let res = self
            .request(
                Method::POST,
                "/auth/login",
                None,
                Some(serde_json::json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(res.status, StatusCode::OK, "login failed: {}", res.body);
        token_cookie(&res.headers).expect("login did not set a token cookie")
    }

    pub async fn seed_and_login(&self, email: &str, role: Role) -> (User, String) {
        let user = self.seed_user(email, "pw123", role).await;
        let cookie = self.login(email, "pw123").await;
        (user, cookie)
    }

    pub async fn count(&self, table: &str) -> i64 {
        let sql = format!("SELECT COUNT(*) FROM {}", table);
        let (n,): (i64,) = sqlx::query_as(&sql).fetch_one(&self.db).await.unwrap();
        n
    }
}

/// `token=<value>` from the response's `Set-Cookie`, if any.
pub fn token_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("token="))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

pub fn set_cookie_header(headers: &HeaderMap) -> String {
    headers
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

pub fn tomorrow() -> String {
    (chrono::Utc::now() + chrono::Duration::days(1))
        .format("%Y-%m-%d")
        .to_string()
}

pub fn yesterday() -> String {
    (chrono::Utc::now() - chrono::Duration::days(1))
        .format("%Y-%m-%d")
        .to_string()
}
