use chrono::Utc;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::auth::domain::{Credential, LoginEvent, NewLoginEvent};
use crate::auth::errors::AuthError;
use crate::auth::repository::{LoginLogStore, UserStore};

fn to_credential(u: models::user::Model) -> Credential {
    Credential {
        id: u.id,
        username: u.username,
        email: u.email,
        name: u.name,
        profile_pic_url: u.profile_pic_url,
        password_hash: u.password_hash,
        is_active: u.is_active,
        created_at: u.created_at.with_timezone(&Utc),
        updated_at: u.updated_at.with_timezone(&Utc),
    }
}

fn to_login_event(l: models::login_log::Model) -> LoginEvent {
    LoginEvent {
        id: l.id,
        user_id: l.user_id,
        ip_address: l.ip_address,
        user_agent: l.user_agent,
        login_timestamp: l.login_timestamp.with_timezone(&Utc),
    }
}

pub struct SeaOrmUserStore {
    pub db: DatabaseConnection,
}

#[async_trait::async_trait]
impl UserStore for SeaOrmUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<Credential>, AuthError> {
        let res = models::user::find_by_username(&self.db, username).await?;
        Ok(res.map(to_credential))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Credential>, AuthError> {
        let res = models::user::find_by_id(&self.db, id).await?;
        Ok(res.map(to_credential))
    }
}

pub struct SeaOrmLoginLogStore {
    pub db: DatabaseConnection,
}

#[async_trait::async_trait]
impl LoginLogStore for SeaOrmLoginLogStore {
    async fn append(&self, event: NewLoginEvent) -> Result<LoginEvent, AuthError> {
        let created =
            models::login_log::create(&self.db, event.user_id, event.ip_address, event.user_agent)
                .await?;
        Ok(to_login_event(created))
    }

    async fn recent_for_user(&self, user_id: Uuid, limit: usize) -> Result<Vec<LoginEvent>, AuthError> {
        let rows = models::login_log::recent_for_user(&self.db, user_id, limit as u64).await?;
        Ok(rows.into_iter().map(to_login_event).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use migration::MigratorTrait;
    use sea_orm::EntityTrait;

    /// Adapter round trip against a real database; skips when none is
    /// reachable.
    #[tokio::test]
    async fn seaorm_stores_round_trip() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() {
            return Ok(());
        }
        let db = match models::db::connect().await {
            Ok(db) => db,
            Err(e) => {
                eprintln!("skip: cannot connect to db: {}", e);
                return Ok(());
            }
        };
        if let Err(e) = migration::Migrator::up(&db, None).await {
            eprintln!("skip: migrate up failed: {}", e);
            return Ok(());
        }

        let username = format!("store_user_{}", Uuid::new_v4());
        let email = format!("{}@example.com", username);
        let created = models::user::create(&db, &username, &email, "$argon2id$fake").await?;

        let users = SeaOrmUserStore { db: db.clone() };
        let found = users.find_by_username(&username).await?.expect("present");
        assert_eq!(found.id, created.id);
        assert_eq!(found.email, email);

        let logs = SeaOrmLoginLogStore { db: db.clone() };
        logs.append(NewLoginEvent {
            user_id: created.id,
            ip_address: Some("127.0.0.1".into()),
            user_agent: Some("tester".into()),
        })
        .await?;
        let recent = logs.recent_for_user(created.id, 6).await?;
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].ip_address.as_deref(), Some("127.0.0.1"));

        for row in models::login_log::recent_for_user(&db, created.id, 10).await? {
            models::login_log::Entity::delete_by_id(row.id).exec(&db).await?;
        }
        models::user::Entity::delete_by_id(created.id).exec(&db).await?;
        Ok(())
    }
}
