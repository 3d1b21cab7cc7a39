use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stored account record as seen by the pipeline (read-only during login).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub name: Option<String>,
    pub profile_pic_url: Option<String>,
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One inbound login attempt; lives only for the duration of a single
/// pipeline invocation and is never persisted.
#[derive(Debug, Clone)]
pub struct LoginAttempt {
    pub username: String,
    pub password: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Audit row to append; the store stamps the server-side timestamp.
#[derive(Debug, Clone)]
pub struct NewLoginEvent {
    pub user_id: Uuid,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Persisted audit row.
#[derive(Debug, Clone)]
pub struct LoginEvent {
    pub id: Uuid,
    pub user_id: Uuid,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub login_timestamp: DateTime<Utc>,
}

/// Terminal classification of one login attempt. Exactly one variant per
/// attempt; collaborator failures are errors, not outcomes.
#[derive(Debug, Clone)]
pub enum LoginOutcome {
    Success {
        user: Credential,
        token: String,
        expires_in: i64,
    },
    InvalidInput { reason: String },
    InvalidCredentials,
    InactiveAccount,
}
