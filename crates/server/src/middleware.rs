use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;
use uuid::Uuid;

use service::auth::domain::Credential;

use crate::errors::ApiError;
use crate::routes::auth::AppState;

/// Authenticated account, injected into request extensions by
/// `require_bearer_token`.
#[derive(Clone)]
pub struct CurrentUser(pub Credential);

/// First address in `X-Forwarded-For`, if any. The service sits behind a
/// proxy; the socket peer is not the client.
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

/// Middleware guarding protected routes: validates `Authorization: Bearer`,
/// resolves the subject, and rejects inactive accounts with 403. Signature
/// mismatch, malformed input, and expiry are indistinguishable 401s.
pub async fn require_bearer_token(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let path = req.uri().path().to_string();

    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.to_string());

    let Some(token) = token else {
        warn!(path = %path, "missing or malformed Authorization header");
        return Err(ApiError::unauthenticated());
    };

    let Some(claims) = state.tokens.validate(&token) else {
        warn!(path = %path, "token validation failed");
        return Err(ApiError::unauthenticated());
    };

    let Ok(user_id) = claims.sub.parse::<Uuid>() else {
        warn!(path = %path, "token subject is not a valid id");
        return Err(ApiError::unauthenticated());
    };

    let Some(user) = state.users.find_by_id(user_id).await? else {
        return Err(ApiError::unauthenticated());
    };

    if !user.is_active {
        return Err(ApiError::inactive_account());
    }

    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}

/// Middleware consulted before the login pipeline: one fixed-window counter
/// per endpoint path. Allowed responses carry `X-RateLimit-*` headers;
/// rejections carry `Retry-After`.
pub async fn rate_limit(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    let decision = state.limiter.check(&path);

    if !decision.allowed {
        let mut response = ApiError::rate_limited(decision.reset_secs).into_response();
        if let Ok(value) = HeaderValue::from_str(&decision.reset_secs.to_string()) {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }
        return response;
    }

    let mut response = next.run(req).await;
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&decision.limit.to_string()) {
        headers.insert("X-RateLimit-Limit", value);
    }
    if let Ok(value) = HeaderValue::from_str(&decision.remaining.to_string()) {
        headers.insert("X-RateLimit-Remaining", value);
    }
    if let Ok(value) = HeaderValue::from_str(&decision.reset_secs.to_string()) {
        headers.insert("X-RateLimit-Reset", value);
    }
    response
}
