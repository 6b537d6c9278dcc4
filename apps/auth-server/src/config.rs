//! Application configuration loaded from environment variables.

use std::env;
use std::fmt;
use std::time::Duration;

use gym_infra::auth::JwtConfigError;
use gym_infra::{DatabaseConfig, JwtConfig, PasswordConfig, RateLimitConfig, RedisConfig};

const DEFAULT_LOOKUP_TIMEOUT_MS: u64 = 2000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Jwt(#[from] JwtConfigError),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Administrator created at startup when the in-memory store is used.
#[derive(Clone)]
pub struct SeedAdmin {
    pub identifier: String,
    pub secret: String,
}

impl fmt::Debug for SeedAdmin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeedAdmin")
            .field("identifier", &self.identifier)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: Option<DatabaseConfig>,
    pub redis: Option<RedisConfig>,
    pub jwt: JwtConfig,
    pub password: PasswordConfig,
    pub rate_limit: RateLimitConfig,
    /// Key the login limiter on `Forwarded` / `X-Forwarded-For`. Only for
    /// deployments behind a proxy that overwrites those headers.
    pub trust_proxy_headers: bool,
    /// Upper bound on a credential lookup during request authentication.
    pub lookup_timeout: Duration,
    pub seed_admin: Option<SeedAdmin>,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// `JWT_SECRET` is required; there is no built-in signing key.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match env::var("PORT") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: raw,
            })?,
            Err(_) => 8080,
        };

        let lookup_timeout = match env::var("AUTH_LOOKUP_TIMEOUT_MS") {
            Ok(raw) => raw
                .parse()
                .ok()
                .filter(|ms: &u64| *ms > 0)
                .map(Duration::from_millis)
                .ok_or(ConfigError::Invalid {
                    name: "AUTH_LOOKUP_TIMEOUT_MS",
                    value: raw,
                })?,
            Err(_) => Duration::from_millis(DEFAULT_LOOKUP_TIMEOUT_MS),
        };

        let trust_proxy_headers = match env::var("TRUST_PROXY_HEADERS") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: "TRUST_PROXY_HEADERS",
                value: raw,
            })?,
            Err(_) => false,
        };

        let seed_admin = match (
            env::var("SEED_ADMIN_IDENTIFIER"),
            env::var("SEED_ADMIN_SECRET"),
        ) {
            (Ok(identifier), Ok(secret)) => Some(SeedAdmin { identifier, secret }),
            _ => None,
        };

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port,
            database: DatabaseConfig::from_env(),
            redis: RedisConfig::from_env(),
            jwt: JwtConfig::from_env()?,
            password: PasswordConfig::from_env(),
            rate_limit: RateLimitConfig::from_env(),
            trust_proxy_headers,
            lookup_timeout,
            seed_admin,
        })
    }
}
