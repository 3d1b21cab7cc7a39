//! Post-hoc login-location check. Runs off the critical path after a
//! successful login and only ever produces a best-effort notification;
//! its failures are logged and swallowed, never surfaced to the login
//! caller.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::auth::errors::AuthError;
use crate::auth::repository::{LoginLogStore, UserStore};

/// How many recent audit rows to fetch: the just-written current event
/// plus up to five prior ones.
const HISTORY_WINDOW: usize = 6;

#[derive(Debug, Clone, PartialEq)]
pub struct LocationAlert {
    pub email: String,
    pub current_ip: String,
    pub recent_ips: Vec<String>,
}

#[derive(Debug, Error)]
#[error("notification failed: {0}")]
pub struct NotifyError(pub String);

/// Delivery channel for location alerts. At-least-once-or-never semantics
/// are acceptable; a missed alert is not a correctness failure.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_location_alert(&self, alert: LocationAlert) -> Result<(), NotifyError>;
}

/// Notifier that emits the alert into the service log, mirroring an email
/// hand-off.
pub struct AlertLogNotifier;

#[async_trait]
impl Notifier for AlertLogNotifier {
    async fn send_location_alert(&self, alert: LocationAlert) -> Result<(), NotifyError> {
        warn!(
            email = %alert.email,
            current_ip = %alert.current_ip,
            recent_ips = ?alert.recent_ips,
            "login from new location detected; notifying account contact"
        );
        Ok(())
    }
}

pub struct AnomalyDetector {
    users: Arc<dyn UserStore>,
    login_logs: Arc<dyn LoginLogStore>,
    notifier: Arc<dyn Notifier>,
}

impl AnomalyDetector {
    pub fn new(
        users: Arc<dyn UserStore>,
        login_logs: Arc<dyn LoginLogStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self { users, login_logs, notifier }
    }

    /// Fire-and-forget entry point, invoked after the success audit row has
    /// been committed. Spawns the check on the runtime and returns
    /// immediately; no completion or ordering guarantee is given.
    pub fn dispatch(self: &Arc<Self>, user_id: Uuid, current_ip: Option<String>) {
        let Some(ip) = current_ip else {
            // no source address recorded, nothing to compare against
            return;
        };
        let detector = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = detector.check_login_location(user_id, &ip).await {
                warn!(%user_id, error = %e, "login location check failed");
            }
        });
    }

    /// Compare the current source address with up to five prior ones. A
    /// brand-new account (no prior addresses) is not anomalous.
    pub async fn check_login_location(&self, user_id: Uuid, current_ip: &str) -> Result<(), AuthError> {
        let history = self.login_logs.recent_for_user(user_id, HISTORY_WINDOW).await?;

        // Skip the first row: it is the event the current login just wrote.
        let mut recent_ips: Vec<String> = Vec::new();
        for event in history.iter().skip(1) {
            if let Some(ip) = &event.ip_address {
                if !ip.is_empty() && !recent_ips.contains(ip) {
                    recent_ips.push(ip.clone());
                }
            }
        }

        if recent_ips.is_empty() || recent_ips.iter().any(|ip| ip == current_ip) {
            debug!(%user_id, "login location matches recent history");
            return Ok(());
        }

        let Some(user) = self.users.find_by_id(user_id).await? else {
            // account vanished between audit and check; nothing to notify
            return Ok(());
        };

        let alert = LocationAlert {
            email: user.email,
            current_ip: current_ip.to_string(),
            recent_ips,
        };
        if let Err(e) = self.notifier.send_location_alert(alert).await {
            warn!(%user_id, error = %e, "location alert delivery failed");
        }
        Ok(())
    }
}
