use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use common::rate_limit::FixedWindowLimiter;
use service::anomaly::AnomalyDetector;
use service::auth::domain::{Credential, LoginAttempt, LoginOutcome};
use service::auth::repository::{LoginLogStore, UserStore};
use service::auth::{LoginPipeline, TokenService};

use crate::errors::ApiError;
use crate::middleware::{client_ip, user_agent};

/// Shared application state: store capabilities behind trait objects, the
/// token service, the detector, and the login rate limiter.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub login_logs: Arc<dyn LoginLogStore>,
    pub tokens: Arc<TokenService>,
    pub detector: Arc<AnomalyDetector>,
    pub limiter: Arc<FixedWindowLimiter>,
    pub primes_max_count: u32,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginBody {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct UserBody {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub name: Option<String>,
    pub profile_pic_url: Option<String>,
}

impl From<Credential> for UserBody {
    fn from(user: Credential) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            name: user.name,
            profile_pic_url: user.profile_pic_url,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginSuccessBody {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserBody,
}

/// Map each pipeline outcome to its fixed transport contract:
/// 200 / 400 / 401 / 403.
fn outcome_response(outcome: LoginOutcome) -> Response {
    match outcome {
        LoginOutcome::Success { user, token, expires_in } => (
            axum::http::StatusCode::OK,
            Json(LoginSuccessBody {
                token,
                token_type: "bearer".to_string(),
                expires_in,
                user: UserBody::from(user),
            }),
        )
            .into_response(),
        LoginOutcome::InvalidInput { reason } => {
            ApiError::invalid_input(Some(reason)).into_response()
        }
        LoginOutcome::InvalidCredentials => ApiError::invalid_credentials().into_response(),
        LoginOutcome::InactiveAccount => ApiError::inactive_account().into_response(),
    }
}

#[utoipa::path(post, path = "/api/v1/auth/login", tag = "auth", request_body = LoginBody, responses((status = 200, description = "Logged in", body = LoginSuccessBody), (status = 400, description = "Invalid input"), (status = 401, description = "Invalid credentials"), (status = 403, description = "Inactive account"), (status = 429, description = "Rate limited")))]
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<LoginBody>, JsonRejection>,
) -> Response {
    let Ok(Json(body)) = payload else {
        return ApiError::invalid_input(Some("malformed request body".into())).into_response();
    };

    let pipeline = LoginPipeline::new(
        state.users.clone(),
        state.login_logs.clone(),
        state.tokens.clone(),
    )
    .with_detector(state.detector.clone());

    let attempt = LoginAttempt {
        username: body.username,
        password: body.password,
        ip_address: client_ip(&headers),
        user_agent: user_agent(&headers),
    };

    match pipeline.attempt_login(attempt).await {
        Ok(outcome) => outcome_response(outcome),
        Err(e) => ApiError::from(e).into_response(),
    }
}
