//! JWT token service implementation.

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use gym_core::ports::{AuthError, IssuedToken, TokenClaims, TokenError, TokenService};

/// Shortest accepted HMAC secret, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

const DEFAULT_TTL_SECS: i64 = 3600;
const DEFAULT_ISSUER: &str = "gymgate";

/// JWT token service configuration.
#[derive(Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_seconds: i64,
    pub issuer: String,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("ttl_seconds", &self.ttl_seconds)
            .field("issuer", &self.issuer)
            .finish()
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum JwtConfigError {
    #[error("JWT_SECRET is not set")]
    MissingSecret,

    #[error("JWT secret must be at least {MIN_SECRET_LEN} bytes")]
    WeakSecret,

    #[error("Token TTL must be positive, got {0}")]
    InvalidTtl(i64),

    #[error("Invalid value for {name}: {value}")]
    InvalidVar { name: &'static str, value: String },
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ttl_seconds: DEFAULT_TTL_SECS,
            issuer: DEFAULT_ISSUER.to_string(),
        }
    }

    /// Load from `JWT_SECRET` (required), `JWT_TTL_SECS` and `JWT_ISSUER`.
    pub fn from_env() -> Result<Self, JwtConfigError> {
        let secret = std::env::var("JWT_SECRET").map_err(|_| JwtConfigError::MissingSecret)?;

        let ttl_seconds = match std::env::var("JWT_TTL_SECS") {
            Ok(raw) => raw.parse().map_err(|_| JwtConfigError::InvalidVar {
                name: "JWT_TTL_SECS",
                value: raw,
            })?,
            Err(_) => DEFAULT_TTL_SECS,
        };

        let config = Self {
            secret,
            ttl_seconds,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| DEFAULT_ISSUER.to_string()),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), JwtConfigError> {
        if self.secret.len() < MIN_SECRET_LEN {
            return Err(JwtConfigError::WeakSecret);
        }
        if self.ttl_seconds <= 0 {
            return Err(JwtConfigError::InvalidTtl(self.ttl_seconds));
        }
        Ok(())
    }
}

/// Wire form of the claims.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
    iss: String,
    jti: String,
}

/// HS256 JWT token service.
///
/// Keys are derived once from the configured secret and never change for
/// the lifetime of the service. Rotating the secret means building a new
/// service, which invalidates every token issued by the old one.
pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    config: JwtConfig,
}

impl JwtTokenService {
    pub fn new(config: JwtConfig) -> Result<Self, JwtConfigError> {
        config.validate()?;

        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_issuer(&[&config.issuer]);
        validation.set_required_spec_claims(&["exp", "iat", "sub", "iss"]);

        Ok(Self {
            encoding_key,
            decoding_key,
            validation,
            config,
        })
    }

    pub fn from_env() -> Result<Self, JwtConfigError> {
        Self::new(JwtConfig::from_env()?)
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_at(&self, subject: &str, now: DateTime<Utc>) -> Result<IssuedToken, AuthError> {
        let exp = now + TimeDelta::seconds(self.config.ttl_seconds);

        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: self.config.issuer.clone(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))?;

        Ok(IssuedToken {
            token,
            claims: TokenClaims {
                subject: claims.sub,
                token_id: claims.jti,
                issued_at: claims.iat,
                expires_at: claims.exp,
            },
        })
    }
}

fn classify(error: &jsonwebtoken::errors::Error) -> TokenError {
    match error.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        // Not produced by this issuer with this key and algorithm.
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm | ErrorKind::InvalidIssuer => {
            TokenError::BadSignature
        }
        _ => TokenError::Malformed,
    }
}

impl TokenService for JwtTokenService {
    fn issue(&self, subject: &str) -> Result<IssuedToken, AuthError> {
        self.issue_at(subject, Utc::now())
    }

    fn decode(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            let kind = classify(&e);
            tracing::debug!(error = %e, ?kind, "Token rejected");
            kind
        })?;

        let claims = TokenClaims {
            subject: data.claims.sub,
            token_id: data.claims.jti,
            issued_at: data.claims.iat,
            expires_at: data.claims.exp,
        };

        if claims.expires_at <= claims.issued_at {
            return Err(TokenError::Malformed);
        }
        // jsonwebtoken accepts `exp == now`; validity ends at `expires_at`.
        if self.is_expired(&claims) {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    fn is_expired(&self, claims: &TokenClaims) -> bool {
        claims.is_expired_at(Utc::now().timestamp())
    }

    fn ttl_seconds(&self) -> i64 {
        self.config.ttl_seconds
    }
}
