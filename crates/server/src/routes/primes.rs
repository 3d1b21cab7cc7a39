use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use service::primes;

use crate::errors::ApiError;
use crate::middleware::CurrentUser;
use crate::routes::auth::AppState;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct PrimesBody {
    pub count: i64,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PrimesResponse {
    pub count: u32,
    pub primes: Vec<u64>,
}

#[utoipa::path(post, path = "/api/v1/primes/generate", tag = "primes", request_body = PrimesBody, responses((status = 200, description = "Primes generated", body = PrimesResponse), (status = 400, description = "Count out of range"), (status = 401, description = "Unauthenticated"), (status = 403, description = "Inactive account")))]
pub async fn generate(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    payload: Result<Json<PrimesBody>, JsonRejection>,
) -> Result<Json<PrimesResponse>, ApiError> {
    let Ok(Json(body)) = payload else {
        return Err(ApiError::invalid_input(Some("malformed request body".into())));
    };

    let count = primes::validate_count(body.count, state.primes_max_count)
        .map_err(|e| ApiError::invalid_input(Some(e.to_string())))?;

    let primes = primes::generate_primes(count);
    debug!(user_id = %user.id, count, "primes generated");

    Ok(Json(PrimesResponse { count, primes }))
}
