use async_trait::async_trait;
use uuid::Uuid;

use super::domain::{Credential, LoginEvent, NewLoginEvent};
use super::errors::AuthError;

/// Lookup of account records. Username matching is exact and
/// case-sensitive; no normalization happens at this seam.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<Credential>, AuthError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Credential>, AuthError>;
}

/// Append-only login audit log.
#[async_trait]
pub trait LoginLogStore: Send + Sync {
    async fn append(&self, event: NewLoginEvent) -> Result<LoginEvent, AuthError>;
    /// Most recent events for one account, newest first.
    async fn recent_for_user(&self, user_id: Uuid, limit: usize) -> Result<Vec<LoginEvent>, AuthError>;
}

/// Simple in-memory store implementations for tests, doc examples, and
/// benches.
pub mod mock {
    use super::*;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Build an account fixture with a derived email and fresh timestamps.
    pub fn credential(username: &str, password_hash: &str, is_active: bool) -> Credential {
        let now = Utc::now();
        Credential {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: format!("{username}@example.com"),
            name: None,
            profile_pic_url: None,
            password_hash: password_hash.to_string(),
            is_active,
            created_at: now,
            updated_at: now,
        }
    }

    #[derive(Default)]
    pub struct InMemoryUserStore {
        users: Mutex<HashMap<String, Credential>>, // key: username
    }

    impl InMemoryUserStore {
        pub fn insert(&self, credential: Credential) {
            let mut users = self.users.lock().unwrap();
            users.insert(credential.username.clone(), credential);
        }
    }

    #[async_trait]
    impl UserStore for InMemoryUserStore {
        async fn find_by_username(&self, username: &str) -> Result<Option<Credential>, AuthError> {
            let users = self.users.lock().unwrap();
            Ok(users.get(username).cloned())
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<Credential>, AuthError> {
            let users = self.users.lock().unwrap();
            Ok(users.values().find(|u| u.id == id).cloned())
        }
    }

    /// Events are kept in insertion order; `recent_for_user` walks them
    /// newest first, which keeps ordering deterministic even when two
    /// appends land on the same timestamp.
    #[derive(Default)]
    pub struct InMemoryLoginLogStore {
        events: Mutex<Vec<LoginEvent>>,
    }

    impl InMemoryLoginLogStore {
        pub fn events(&self) -> Vec<LoginEvent> {
            self.events.lock().unwrap().clone()
        }

        pub fn events_for(&self, user_id: Uuid) -> Vec<LoginEvent> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .filter(|e| e.user_id == user_id)
                .cloned()
                .collect()
        }
    }

    #[async_trait]
    impl LoginLogStore for InMemoryLoginLogStore {
        async fn append(&self, event: NewLoginEvent) -> Result<LoginEvent, AuthError> {
            let stored = LoginEvent {
                id: Uuid::new_v4(),
                user_id: event.user_id,
                ip_address: event.ip_address,
                user_agent: event.user_agent,
                login_timestamp: Utc::now(),
            };
            self.events.lock().unwrap().push(stored.clone());
            Ok(stored)
        }

        async fn recent_for_user(&self, user_id: Uuid, limit: usize) -> Result<Vec<LoginEvent>, AuthError> {
            let events = self.events.lock().unwrap();
            Ok(events
                .iter()
                .rev()
                .filter(|e| e.user_id == user_id)
                .take(limit)
                .cloned()
                .collect())
        }
    }
}
