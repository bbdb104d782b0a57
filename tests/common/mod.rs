use std::env;
use std::sync::Arc;

use anyhow::{anyhow, ensure, Context, Result};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use diesel::connection::SimpleConnection;
use diesel::PgConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use http_body_util::BodyExt;
use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use uuid::Uuid;

use tower::util::ServiceExt;
use workboard::auth::jwt::JwtService;
use workboard::config::AppConfig;
use workboard::db::{self, PgPool};
use workboard::mailer::ResetMailer;
use workboard::routes;
use workboard::state::AppState;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

static DB_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

#[allow(dead_code)]
#[derive(Clone)]
pub struct SentReset {
    pub email: String,
    pub reset_link: String,
}

/// Records reset links instead of delivering them.
#[derive(Default)]
pub struct FakeMailer {
    sent: Mutex<Vec<SentReset>>,
}

#[async_trait]
impl ResetMailer for FakeMailer {
    async fn send_reset_link(&self, email: &str, reset_link: &str) -> Result<()> {
        self.sent.lock().await.push(SentReset {
            email: email.to_string(),
            reset_link: reset_link.to_string(),
        });
        Ok(())
    }
}

impl FakeMailer {
    #[allow(dead_code)]
    pub async fn sent(&self) -> Vec<SentReset> {
        self.sent.lock().await.clone()
    }
}

pub struct TestApp {
    pub state: AppState,
    router: Router,
    mailer: Arc<FakeMailer>,
}

impl TestApp {
    /// Returns `None` (and the calling test should pass trivially) when
    /// `TEST_DATABASE_URL` is not configured.
    pub async fn new() -> Result<Option<Self>> {
        let Ok(database_url) = env::var("TEST_DATABASE_URL") else {
            eprintln!("TEST_DATABASE_URL not set; skipping integration test");
            return Ok(None);
        };

        let config = AppConfig {
            database_url: database_url.clone(),
            database_max_pool_size: db::DEFAULT_MAX_POOL_SIZE,
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            jwt_secret: "test-secret".to_string(),
            jwt_issuer: "test-issuer".to_string(),
            jwt_audience: "test-audience".to_string(),
            jwt_expiry_hours: 24,
            reset_token_expiry_minutes: 60,
            client_url: "http://localhost:3000".to_string(),
            cors_allowed_origin: None,
        };

        let pool = db::init_pool_with_size(&config.database_url, config.database_max_pool_size)?;
        prepare_database(&pool).await?;

        let mailer = Arc::new(FakeMailer::default());
        let mailer_for_state: Arc<dyn ResetMailer> = mailer.clone();
        let jwt = JwtService::from_config(&config)?;
        let state = AppState::new(pool, config, mailer_for_state, jwt);
        let router = routes::create_router(state.clone());

        Ok(Some(Self {
            state,
            router,
            mailer,
        }))
    }

    pub async fn cleanup(&self) -> Result<()> {
        let pool = self.state.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut conn = pool
                .get()
                .map_err(|err| anyhow!("failed to get cleanup connection: {err}"))?;
            truncate_all(&mut conn)?;
            Ok(())
        })
        .await
        .context("cleanup task panicked")?
    }

    #[allow(dead_code)]
    pub fn mailer(&self) -> Arc<FakeMailer> {
        self.mailer.clone()
    }

    /// Registers a user through the API and returns `(id, token)`.
    pub async fn register_user(
        &self,
        username: &str,
        email: &str,
        password: &str,
        role: &str,
    ) -> Result<(Uuid, String)> {
        let response = self
            .post_json(
                "/api/auth/register",
                &json!({
                    "username": username,
                    "email": email,
                    "password": password,
                    "role": role,
                }),
                None,
            )
            .await?;

        ensure!(
            response.status() == StatusCode::CREATED,
            "registration failed with status {}",
            response.status()
        );

        let body = json_body(response.into_body()).await?;
        let id = body["id"]
            .as_str()
            .context("registration response missing id")?
            .parse()?;
        let token = body["token"]
            .as_str()
            .context("registration response missing token")?
            .to_string();
        Ok((id, token))
    }

    /// Creates a job through the API and returns its id.
    #[allow(dead_code)]
    pub async fn create_job(&self, token: &str, payload: &Value) -> Result<Uuid> {
        let response = self.post_json("/api/jobs", payload, Some(token)).await?;
        ensure!(
            response.status() == StatusCode::CREATED,
            "job creation failed with status {}",
            response.status()
        );
        let body = json_body(response.into_body()).await?;
        Ok(body["id"]
            .as_str()
            .context("job response missing id")?
            .parse()?)
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Result<hyper::Response<Body>> {
        self.request(Method::GET, path, None::<&Value>, token).await
    }

    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
        token: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        self.request(Method::POST, path, Some(payload), token).await
    }

    #[allow(dead_code)]
    pub async fn put_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
        token: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        self.request(Method::PUT, path, Some(payload), token).await
    }

    #[allow(dead_code)]
    pub async fn delete(&self, path: &str, token: Option<&str>) -> Result<hyper::Response<Body>> {
        self.request(Method::DELETE, path, None::<&Value>, token)
            .await
    }

    async fn request<T: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        payload: Option<&T>,
        token: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = match payload {
            Some(payload) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(payload)?))?,
            None => builder.body(Body::empty())?,
        };
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }
}

pub async fn acquire_db_lock() -> tokio::sync::MutexGuard<'static, ()> {
    DB_LOCK.lock().await
}

pub async fn json_body(body: Body) -> Result<Value> {
    let collected = body
        .collect()
        .await
        .map_err(|err| anyhow!("failed to read response body: {err}"))?;
    Ok(serde_json::from_slice(&collected.to_bytes())?)
}

/// A job payload that passes validation; tweak fields per test.
#[allow(dead_code)]
pub fn job_payload(title: &str, job_type: &str) -> Value {
    json!({
        "title": title,
        "company": "Initech",
        "location": "Berlin",
        "type": job_type,
        "description": "We are looking for somebody who enjoys building reliable backend services in a small team.",
        "requirements": "3+ years of backend experience",
        "salary": 100_000,
    })
}

/// A cover letter that clears the minimum length check.
#[allow(dead_code)]
pub fn cover_letter() -> String {
    "I have spent the last four years building and operating web backends and \
     would love to bring that experience to your team."
        .to_string()
}

async fn prepare_database(pool: &PgPool) -> Result<()> {
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || -> Result<()> {
        let mut conn = pool
            .get()
            .map_err(|err| anyhow!("failed to acquire connection: {err}"))?;
        conn.run_pending_migrations(MIGRATIONS)
            .map_err(|err| anyhow!("failed to run migrations: {err}"))?;
        truncate_all(&mut conn)?;
        Ok(())
    })
    .await
    .context("migration task panicked")?
}

fn truncate_all(conn: &mut PgConnection) -> Result<()> {
    conn.batch_execute("TRUNCATE TABLE applications, jobs, users RESTART IDENTITY CASCADE;")
        .context("failed to truncate tables")?;
    Ok(())
}
