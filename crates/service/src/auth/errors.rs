use thiserror::Error;

/// Collaborator failures surfaced by the login workflows. These are never
/// login outcomes; the boundary maps them to a generic 500.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("hashing error: {0}")]
    HashError(String),
    #[error("token error: {0}")]
    TokenError(String),
    #[error("repository error: {0}")]
    Repository(String),
}

impl From<models::errors::ModelError> for AuthError {
    fn from(e: models::errors::ModelError) -> Self {
        AuthError::Repository(e.to_string())
    }
}
