use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub primes: PrimesConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
        }
    }
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_acquire_timeout() -> u64 { 30 }

/// Token signing and password policy settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    #[serde(default = "default_jwt_algorithm")]
    pub jwt_algorithm: String,
    #[serde(default = "default_token_lifetime")]
    pub token_lifetime_minutes: i64,
    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            jwt_algorithm: default_jwt_algorithm(),
            token_lifetime_minutes: default_token_lifetime(),
            min_password_length: default_min_password_length(),
        }
    }
}

fn default_jwt_secret() -> String { "dev-secret-change-me".into() }
fn default_jwt_algorithm() -> String { "HS256".into() }
fn default_token_lifetime() -> i64 { 3600 }
fn default_min_password_length() -> usize { 8 }

/// Fixed-window rate limiting applied to the login endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_rate_limit_requests")]
    pub max_requests: u32,
    #[serde(default = "default_rate_limit_window")]
    pub window_secs: u64,
    #[serde(default = "default_rate_limit_enabled")]
    pub enabled: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_rate_limit_requests(),
            window_secs: default_rate_limit_window(),
            enabled: default_rate_limit_enabled(),
        }
    }
}

fn default_rate_limit_requests() -> u32 { 5 }
fn default_rate_limit_window() -> u64 { 900 }
fn default_rate_limit_enabled() -> bool { true }

#[derive(Debug, Clone, Deserialize)]
pub struct PrimesConfig {
    #[serde(default = "default_max_prime_count")]
    pub max_count: u32,
}

impl Default for PrimesConfig {
    fn default() -> Self {
        Self { max_count: default_max_prime_count() }
    }
}

fn default_max_prime_count() -> u32 { 10_000 }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load `config.toml` (or `CONFIG_PATH`), falling back to built-in
    /// defaults when no file is present, then apply env overrides and
    /// validate the result.
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default().unwrap_or_default();
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.database.normalize_from_env();
        self.auth.normalize_from_env();
        self.auth.validate()?;
        self.rate_limit.normalize_from_env();
        self.rate_limit.validate()?;
        self.primes.normalize_from_env();
        self.primes.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if let Ok(host) = std::env::var("SERVER_HOST") {
            self.host = host;
        }
        if let Ok(port) = std::env::var("SERVER_PORT") {
            self.port = port
                .parse::<u16>()
                .map_err(|_| anyhow!("SERVER_PORT is not a valid port number"))?;
        }
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        if let Some(w) = self.worker_threads {
            if w == 0 { self.worker_threads = Some(4); }
        } else {
            self.worker_threads = Some(4);
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn normalize_from_env(&mut self) {
        // TOML value wins; env fills the gap
        if self.url.trim().is_empty() {
            if let Ok(url) = std::env::var("DATABASE_URL") {
                self.url = url;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url is empty; set it in config.toml or via DATABASE_URL"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://")) {
            return Err(anyhow!("database.url must start with postgresql:// or postgres://"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive seconds"));
        }
        Ok(())
    }
}

impl AuthConfig {
    pub fn normalize_from_env(&mut self) {
        if let Ok(secret) = std::env::var("JWT_SECRET_KEY") {
            self.jwt_secret = secret;
        }
        if let Ok(alg) = std::env::var("JWT_ALGORITHM") {
            self.jwt_algorithm = alg;
        }
        if let Ok(minutes) = std::env::var("JWT_EXPIRATION_MINUTES") {
            if let Ok(m) = minutes.parse::<i64>() {
                self.token_lifetime_minutes = m;
            }
        }
        if let Ok(len) = std::env::var("PASSWORD_MIN_LENGTH") {
            if let Ok(l) = len.parse::<usize>() {
                self.min_password_length = l;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.jwt_secret.trim().is_empty() {
            return Err(anyhow!("auth.jwt_secret must not be empty"));
        }
        match self.jwt_algorithm.as_str() {
            "HS256" | "HS384" | "HS512" => {}
            other => return Err(anyhow!("auth.jwt_algorithm {other:?} is not a supported HMAC algorithm")),
        }
        if self.token_lifetime_minutes < 1 {
            return Err(anyhow!("auth.token_lifetime_minutes must be >= 1"));
        }
        Ok(())
    }

    pub fn token_lifetime_secs(&self) -> i64 {
        self.token_lifetime_minutes * 60
    }
}

impl RateLimitConfig {
    pub fn normalize_from_env(&mut self) {
        if let Ok(max) = std::env::var("LOGIN_RATE_LIMIT_REQUESTS") {
            if let Ok(m) = max.parse::<u32>() {
                self.max_requests = m;
            }
        }
        if let Ok(window) = std::env::var("LOGIN_RATE_LIMIT_WINDOW") {
            if let Ok(w) = window.parse::<u64>() {
                self.window_secs = w;
            }
        }
        if let Ok(enabled) = std::env::var("LOGIN_RATE_LIMIT_ENABLED") {
            self.enabled = enabled.to_lowercase() == "true";
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_requests == 0 {
            return Err(anyhow!("rate_limit.max_requests must be >= 1"));
        }
        if self.window_secs == 0 {
            return Err(anyhow!("rate_limit.window_secs must be >= 1"));
        }
        Ok(())
    }
}

impl PrimesConfig {
    pub fn normalize_from_env(&mut self) {
        if let Ok(max) = std::env::var("MAX_PRIME_COUNT") {
            if let Ok(m) = max.parse::<u32>() {
                self.max_count = m;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_count == 0 {
            return Err(anyhow!("primes.max_count must be >= 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.auth.jwt_algorithm, "HS256");
        assert_eq!(cfg.auth.token_lifetime_minutes, 3600);
        assert_eq!(cfg.auth.min_password_length, 8);
        assert_eq!(cfg.rate_limit.max_requests, 5);
        assert_eq!(cfg.rate_limit.window_secs, 900);
        assert!(cfg.rate_limit.enabled);
        assert_eq!(cfg.primes.max_count, 10_000);
        assert_eq!(cfg.database.max_connections, 10);
        assert_eq!(cfg.database.min_connections, 2);
    }

    #[test]
    fn toml_sections_override_defaults() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [server]
            host = "0.0.0.0"
            port = 9000

            [auth]
            jwt_secret = "super-secret"
            token_lifetime_minutes = 30

            [rate_limit]
            max_requests = 2
            window_secs = 60

            [primes]
            max_count = 100
            "#,
        )
        .expect("parse toml");
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.auth.jwt_secret, "super-secret");
        assert_eq!(cfg.auth.token_lifetime_secs(), 1800);
        assert_eq!(cfg.rate_limit.max_requests, 2);
        assert_eq!(cfg.primes.max_count, 100);
        // unspecified fields keep their defaults
        assert_eq!(cfg.auth.jwt_algorithm, "HS256");
    }

    #[test]
    fn unsupported_signing_algorithm_rejected() {
        let mut cfg = AuthConfig::default();
        cfg.jwt_algorithm = "RS256".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_rate_limit_window_rejected() {
        let mut cfg = RateLimitConfig::default();
        cfg.window_secs = 0;
        assert!(cfg.validate().is_err());
    }
}
