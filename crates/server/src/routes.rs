use axum::{routing::get, routing::post, Json, Router};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use axum::middleware::from_fn_with_state;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::types::Health;

use crate::middleware::{rate_limit, require_bearer_token};
use crate::openapi::ApiDoc;

pub mod auth;
pub mod primes;

use auth::AppState;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK")))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Primes Backend API",
        "version": env!("CARGO_PKG_VERSION"),
        "docs": "/docs",
    }))
}

/// Build the full application router: public routes, the rate-limited login
/// route, and bearer-protected API routes.
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    let public = Router::new()
        .route("/", get(root))
        .route("/health", get(health));

    // Login is consulted by the rate limiter before the pipeline runs
    let login = Router::new()
        .route("/api/v1/auth/login", post(auth::login))
        .route_layer(from_fn_with_state(state.clone(), rate_limit));

    // Protected API routes
    let api = Router::new()
        .route("/api/v1/primes/generate", post(primes::generate))
        .route_layer(from_fn_with_state(state.clone(), require_bearer_token));

    // Compose
    public
        .merge(login)
        .merge(api)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
