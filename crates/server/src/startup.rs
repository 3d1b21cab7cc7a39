use std::{net::SocketAddr, sync::Arc};

use anyhow::anyhow;
use axum::Router;
use common::rate_limit::FixedWindowLimiter;
use common::utils::logging::init_logging_default;
use dotenvy::dotenv;
use jsonwebtoken::Algorithm;
use migration::MigratorTrait;
use tower_http::cors::CorsLayer;
use tracing::info;

use service::anomaly::{AlertLogNotifier, AnomalyDetector};
use service::auth::repo::seaorm::{SeaOrmLoginLogStore, SeaOrmUserStore};
use service::auth::repository::{LoginLogStore, UserStore};
use service::auth::TokenService;

use crate::routes::{self, auth::AppState};

/// Initialize logging via shared common utils
fn init_logging() {
    init_logging_default();
}

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Public entry: wire collaborators from config and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging();

    let cfg = configs::AppConfig::load_and_validate()?;

    // DB connection and schema
    let db = models::db::connect_with(&cfg.database).await?;
    migration::Migrator::up(&db, None).await?;

    let algorithm = cfg
        .auth
        .jwt_algorithm
        .parse::<Algorithm>()
        .map_err(|_| anyhow!("unsupported signing algorithm {:?}", cfg.auth.jwt_algorithm))?;
    let tokens = Arc::new(TokenService::new(
        cfg.auth.jwt_secret.clone(),
        algorithm,
        cfg.auth.token_lifetime_minutes,
    ));

    let users: Arc<dyn UserStore> = Arc::new(SeaOrmUserStore { db: db.clone() });
    let login_logs: Arc<dyn LoginLogStore> = Arc::new(SeaOrmLoginLogStore { db });

    let detector = Arc::new(AnomalyDetector::new(
        users.clone(),
        login_logs.clone(),
        Arc::new(AlertLogNotifier),
    ));
    let limiter = Arc::new(FixedWindowLimiter::new(
        cfg.rate_limit.max_requests,
        cfg.rate_limit.window_secs,
        cfg.rate_limit.enabled,
    ));

    let state = AppState {
        users,
        login_logs,
        tokens,
        detector,
        limiter,
        primes_max_count: cfg.primes.max_count,
    };

    // Build router
    let app: Router = routes::build_router(state, build_cors());

    // Bind and serve
    let addr: SocketAddr = format!("{}:{}", cfg.server.host, cfg.server.port).parse()?;
    info!(%addr, "starting http server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
