use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use common::rate_limit::FixedWindowLimiter;
use jsonwebtoken::Algorithm;
use migration::MigratorTrait;
use reqwest::StatusCode as HttpStatusCode;
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use service::anomaly::{AlertLogNotifier, AnomalyDetector};
use service::auth::password;
use service::auth::repo::seaorm::{SeaOrmLoginLogStore, SeaOrmUserStore};
use service::auth::TokenService;
use server::routes::{self, auth::AppState};

fn cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

struct TestApp {
    base_url: String,
    username: String,
    password: String,
}

/// Boot a real server against the configured database, seeding one account.
/// Returns Err when no database is reachable so callers can skip.
async fn start_server() -> anyhow::Result<TestApp> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return Err(anyhow::anyhow!("SKIP_DB_TESTS set"));
    }
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("DATABASE_URL missing; skip e2e tests. Provide .env.test or env var.");
        return Err(anyhow::anyhow!("missing DATABASE_URL"));
    }

    let db = models::db::connect().await?;
    if let Err(e) = migration::Migrator::up(&db, None).await {
        eprintln!("migrations notice: {}", e);
    }

    // Seed a unique account per run
    let username = format!("user_{}", Uuid::new_v4());
    let email = format!("{}@example.com", username);
    let plain = "S3curePass!".to_string();
    let hash = password::hash_password(&plain)?;
    models::user::create(&db, &username, &email, &hash).await?;

    let users = Arc::new(SeaOrmUserStore { db: db.clone() });
    let login_logs = Arc::new(SeaOrmLoginLogStore { db });
    let tokens = Arc::new(TokenService::new("test-secret", Algorithm::HS256, 60));
    let detector = Arc::new(AnomalyDetector::new(
        users.clone(),
        login_logs.clone(),
        Arc::new(AlertLogNotifier),
    ));
    let state = AppState {
        users,
        login_logs,
        tokens,
        detector,
        // generous window so repeated test logins stay under the limit
        limiter: Arc::new(FixedWindowLimiter::new(100, 900, true)),
        primes_max_count: 10_000,
    };

    let app: Router = routes::build_router(state, cors());
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    let base_url = format!("http://{}:{}", addr.ip(), addr.port());

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("server error: {}", e);
        }
    });

    Ok(TestApp { base_url, username, password: plain })
}

#[tokio::test]
async fn e2e_public_health() -> anyhow::Result<()> {
    let app = match start_server().await {
        Ok(a) => a,
        Err(_) => return Ok(()),
    };
    let res = reqwest::get(format!("{}/health", app.base_url)).await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn e2e_login_then_generate_primes() -> anyhow::Result<()> {
    let app = match start_server().await {
        Ok(a) => a,
        Err(_) => return Ok(()),
    };
    let c = reqwest::Client::new();

    // Login
    let res = c
        .post(format!("{}/api/v1/auth/login", app.base_url))
        .json(&json!({"username": app.username, "password": app.password}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    assert!(res.headers().get("X-RateLimit-Remaining").is_some());
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["token_type"], "bearer");
    let token = body["token"].as_str().expect("token").to_string();

    // Protected call with the fresh token
    let res = c
        .post(format!("{}/api/v1/primes/generate", app.base_url))
        .bearer_auth(&token)
        .json(&json!({"count": 5}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["count"], 5);
    assert_eq!(body["primes"], json!([2, 3, 5, 7, 11]));

    // Out-of-range count
    let res = c
        .post(format!("{}/api/v1/primes/generate", app.base_url))
        .bearer_auth(&token)
        .json(&json!({"count": 0}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::BAD_REQUEST);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["error"]["code"], "INVALID_INPUT");

    // Invalid token
    let res = c
        .post(format!("{}/api/v1/primes/generate", app.base_url))
        .bearer_auth("not-a-token")
        .json(&json!({"count": 5}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn e2e_wrong_password_unauthorized() -> anyhow::Result<()> {
    let app = match start_server().await {
        Ok(a) => a,
        Err(_) => return Ok(()),
    };
    let c = reqwest::Client::new();

    let res = c
        .post(format!("{}/api/v1/auth/login", app.base_url))
        .json(&json!({"username": app.username, "password": "wrong"}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::UNAUTHORIZED);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["error"]["code"], "INVALID_CREDENTIALS");
    Ok(())
}
