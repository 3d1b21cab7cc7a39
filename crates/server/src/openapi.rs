use utoipa::OpenApi;

use crate::routes::auth::{LoginBody, LoginSuccessBody, UserBody};
use crate::routes::primes::{PrimesBody, PrimesResponse};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::login,
        crate::routes::primes::generate,
    ),
    components(
        schemas(
            LoginBody,
            LoginSuccessBody,
            UserBody,
            PrimesBody,
            PrimesResponse,
        )
    ),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "primes")
    )
)]
pub struct ApiDoc;
