use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::anomaly::AnomalyDetector;

use super::domain::{LoginAttempt, LoginOutcome, NewLoginEvent};
use super::errors::AuthError;
use super::password;
use super::repository::{LoginLogStore, UserStore};
use super::token::TokenService;

/// The authentication decision pipeline: validates input, drives the
/// stores and the token service in strict order, decides the outcome, and
/// writes the audit trail. Stateless per attempt; safe to share.
pub struct LoginPipeline {
    users: Arc<dyn UserStore>,
    login_logs: Arc<dyn LoginLogStore>,
    tokens: Arc<TokenService>,
    detector: Option<Arc<AnomalyDetector>>,
}

impl LoginPipeline {
    pub fn new(
        users: Arc<dyn UserStore>,
        login_logs: Arc<dyn LoginLogStore>,
        tokens: Arc<TokenService>,
    ) -> Self {
        Self { users, login_logs, tokens, detector: None }
    }

    /// Attach the post-login location check, dispatched fire-and-forget
    /// after a successful attempt.
    pub fn with_detector(mut self, detector: Arc<AnomalyDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    /// Classify one login attempt.
    ///
    /// Ordering is externally observable and fixed: input validation,
    /// credential lookup, account-status check, password verification,
    /// token issuance, audit. An inactive account with a wrong password
    /// still reports `InactiveAccount`. Unknown usernames and wrong
    /// passwords collapse into `InvalidCredentials`.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use jsonwebtoken::Algorithm;
    /// use service::auth::domain::{LoginAttempt, LoginOutcome};
    /// use service::auth::repository::mock::{credential, InMemoryLoginLogStore, InMemoryUserStore};
    /// use service::auth::{password, LoginPipeline, TokenService};
    ///
    /// let users = Arc::new(InMemoryUserStore::default());
    /// let hash = password::hash_password("Secret123").unwrap();
    /// users.insert(credential("alice", &hash, true));
    ///
    /// let pipeline = LoginPipeline::new(
    ///     users,
    ///     Arc::new(InMemoryLoginLogStore::default()),
    ///     Arc::new(TokenService::new("secret", Algorithm::HS256, 60)),
    /// );
    ///
    /// let outcome = tokio_test::block_on(pipeline.attempt_login(LoginAttempt {
    ///     username: "alice".into(),
    ///     password: "Secret123".into(),
    ///     ip_address: None,
    ///     user_agent: None,
    /// }))
    /// .unwrap();
    /// assert!(matches!(outcome, LoginOutcome::Success { .. }));
    /// ```
    #[instrument(skip(self, attempt), fields(username = %attempt.username))]
    pub async fn attempt_login(&self, attempt: LoginAttempt) -> Result<LoginOutcome, AuthError> {
        if attempt.username.trim().is_empty() {
            return Ok(LoginOutcome::InvalidInput { reason: "username is required".into() });
        }
        if attempt.password.trim().is_empty() {
            return Ok(LoginOutcome::InvalidInput { reason: "password is required".into() });
        }

        // Unknown usernames take the same outward path as wrong passwords,
        // and leave no audit row (there is no credential id to attach).
        let Some(user) = self.users.find_by_username(&attempt.username).await? else {
            debug!("username not found");
            return Ok(LoginOutcome::InvalidCredentials);
        };

        // Status precedes password verification: an inactive account with a
        // wrong password still reports InactiveAccount.
        if !user.is_active {
            self.record_attempt(&attempt, user.id).await?;
            debug!(user_id = %user.id, "inactive account");
            return Ok(LoginOutcome::InactiveAccount);
        }

        if !password::verify_password(&attempt.password, &user.password_hash) {
            self.record_attempt(&attempt, user.id).await?;
            debug!(user_id = %user.id, "password mismatch");
            return Ok(LoginOutcome::InvalidCredentials);
        }

        let (token, expires_in) = self.tokens.issue(user.id, &user.username)?;

        self.record_attempt(&attempt, user.id).await?;

        if let Some(detector) = &self.detector {
            detector.dispatch(user.id, attempt.ip_address.clone());
        }

        info!(user_id = %user.id, "login succeeded");
        Ok(LoginOutcome::Success { user, token, expires_in })
    }

    /// Append one audit row for a known credential id. Used on success and
    /// on failures past the lookup step.
    async fn record_attempt(&self, attempt: &LoginAttempt, user_id: uuid::Uuid) -> Result<(), AuthError> {
        self.login_logs
            .append(NewLoginEvent {
                user_id,
                ip_address: attempt.ip_address.clone(),
                user_agent: attempt.user_agent.clone(),
            })
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::{AlertLogNotifier, AnomalyDetector, LocationAlert, NotifyError, Notifier};
    use crate::auth::repository::mock::{credential, InMemoryLoginLogStore, InMemoryUserStore};
    use jsonwebtoken::Algorithm;
    use std::sync::Mutex;
    use std::time::Duration;

    struct Fixture {
        users: Arc<InMemoryUserStore>,
        logs: Arc<InMemoryLoginLogStore>,
        tokens: Arc<TokenService>,
        pipeline: LoginPipeline,
    }

    fn fixture() -> Fixture {
        let users = Arc::new(InMemoryUserStore::default());
        let logs = Arc::new(InMemoryLoginLogStore::default());
        let tokens = Arc::new(TokenService::new("test-secret", Algorithm::HS256, 60));
        let pipeline = LoginPipeline::new(users.clone(), logs.clone(), tokens.clone());
        Fixture { users, logs, tokens, pipeline }
    }

    fn attempt(username: &str, password: &str) -> LoginAttempt {
        LoginAttempt {
            username: username.into(),
            password: password.into(),
            ip_address: Some("127.0.0.1".into()),
            user_agent: Some("test-agent".into()),
        }
    }

    #[tokio::test]
    async fn blank_input_is_invalid_and_leaves_no_audit_row() {
        let f = fixture();

        for (username, password) in [("", "pw"), ("   ", "pw"), ("alice", ""), ("alice", " \t ")] {
            let outcome = f.pipeline.attempt_login(attempt(username, password)).await.unwrap();
            assert!(matches!(outcome, LoginOutcome::InvalidInput { .. }), "{username:?}/{password:?}");
        }
        assert!(f.logs.events().is_empty());
    }

    #[tokio::test]
    async fn unknown_username_is_invalid_credentials_without_audit() {
        let f = fixture();

        let outcome = f.pipeline.attempt_login(attempt("ghost", "whatever")).await.unwrap();
        assert!(matches!(outcome, LoginOutcome::InvalidCredentials));
        assert!(f.logs.events().is_empty());
    }

    #[tokio::test]
    async fn inactive_account_wins_regardless_of_password() {
        let f = fixture();
        let hash = password::hash_password("correct").unwrap();
        let account = credential("carol", &hash, false);
        let account_id = account.id;
        f.users.insert(account);

        // correct password
        let outcome = f.pipeline.attempt_login(attempt("carol", "correct")).await.unwrap();
        assert!(matches!(outcome, LoginOutcome::InactiveAccount));
        assert_eq!(f.logs.events_for(account_id).len(), 1);

        // wrong password still reports the inactive status
        let outcome = f.pipeline.attempt_login(attempt("carol", "wrong")).await.unwrap();
        assert!(matches!(outcome, LoginOutcome::InactiveAccount));
        assert_eq!(f.logs.events_for(account_id).len(), 2);
    }

    #[tokio::test]
    async fn wrong_password_is_invalid_credentials_with_one_audit_row() {
        let f = fixture();
        let hash = password::hash_password("correct").unwrap();
        let account = credential("alice", &hash, true);
        let account_id = account.id;
        f.users.insert(account);

        let outcome = f.pipeline.attempt_login(attempt("alice", "wrong")).await.unwrap();
        assert!(matches!(outcome, LoginOutcome::InvalidCredentials));
        assert_eq!(f.logs.events_for(account_id).len(), 1);
    }

    #[tokio::test]
    async fn successful_login_issues_token_and_audits_once() {
        let f = fixture();
        let hash = password::hash_password("correct").unwrap();
        let account = credential("alice", &hash, true);
        let account_id = account.id;
        f.users.insert(account);

        let outcome = f.pipeline.attempt_login(attempt("alice", "correct")).await.unwrap();
        let LoginOutcome::Success { user, token, expires_in } = outcome else {
            panic!("expected success");
        };
        assert_eq!(user.id, account_id);
        assert_eq!(expires_in, 3600);

        let claims = f.tokens.validate(&token).expect("freshly issued token validates");
        assert_eq!(claims.sub, account_id.to_string());
        assert_eq!(claims.username, "alice");

        let events = f.logs.events_for(account_id);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].ip_address.as_deref(), Some("127.0.0.1"));
        assert_eq!(events[0].user_agent.as_deref(), Some("test-agent"));
    }

    #[tokio::test]
    async fn username_lookup_is_case_sensitive() {
        let f = fixture();
        let hash = password::hash_password("correct").unwrap();
        f.users.insert(credential("Alice", &hash, true));

        let outcome = f.pipeline.attempt_login(attempt("alice", "correct")).await.unwrap();
        assert!(matches!(outcome, LoginOutcome::InvalidCredentials));
    }

    #[derive(Default)]
    struct RecordingNotifier {
        alerts: Mutex<Vec<LocationAlert>>,
    }

    #[async_trait::async_trait]
    impl Notifier for RecordingNotifier {
        async fn send_location_alert(&self, alert: LocationAlert) -> Result<(), NotifyError> {
            self.alerts.lock().unwrap().push(alert);
            Ok(())
        }
    }

    #[tokio::test]
    async fn success_dispatches_location_check_off_the_critical_path() {
        let users = Arc::new(InMemoryUserStore::default());
        let logs = Arc::new(InMemoryLoginLogStore::default());
        let tokens = Arc::new(TokenService::new("test-secret", Algorithm::HS256, 60));
        let notifier = Arc::new(RecordingNotifier::default());
        let detector = Arc::new(AnomalyDetector::new(users.clone(), logs.clone(), notifier.clone()));
        let pipeline = LoginPipeline::new(users.clone(), logs.clone(), tokens).with_detector(detector);

        let hash = password::hash_password("correct").unwrap();
        let account = credential("alice", &hash, true);
        let account_id = account.id;
        users.insert(account);

        // seed history from one address, then log in from another
        for _ in 0..3 {
            logs.append(NewLoginEvent {
                user_id: account_id,
                ip_address: Some("10.0.0.1".into()),
                user_agent: None,
            })
            .await
            .unwrap();
        }

        let mut attempt = attempt("alice", "correct");
        attempt.ip_address = Some("203.0.113.9".into());
        let outcome = pipeline.attempt_login(attempt).await.unwrap();
        assert!(matches!(outcome, LoginOutcome::Success { .. }));

        // the check runs on a spawned task; poll briefly for its effect
        let mut alerts = Vec::new();
        for _ in 0..100 {
            alerts = notifier.alerts.lock().unwrap().clone();
            if !alerts.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].current_ip, "203.0.113.9");
        assert_eq!(alerts[0].recent_ips, vec!["10.0.0.1".to_string()]);
    }

    #[tokio::test]
    async fn detector_wiring_smoke_with_log_notifier() {
        // the default notifier only logs; the pipeline must still succeed
        let users = Arc::new(InMemoryUserStore::default());
        let logs = Arc::new(InMemoryLoginLogStore::default());
        let tokens = Arc::new(TokenService::new("test-secret", Algorithm::HS256, 60));
        let detector = Arc::new(AnomalyDetector::new(
            users.clone(),
            logs.clone(),
            Arc::new(AlertLogNotifier),
        ));
        let pipeline = LoginPipeline::new(users.clone(), logs, tokens).with_detector(detector);

        let hash = password::hash_password("correct").unwrap();
        users.insert(credential("alice", &hash, true));

        let outcome = pipeline.attempt_login(attempt("alice", "correct")).await.unwrap();
        assert!(matches!(outcome, LoginOutcome::Success { .. }));
    }
}
