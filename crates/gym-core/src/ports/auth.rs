//! Authentication and authorization ports.

use std::time::Duration;

/// Claims carried by a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub subject: String,
    /// Unique token id, used as the revocation key.
    pub token_id: String,
    pub issued_at: i64,
    pub expires_at: i64,
}

impl TokenClaims {
    /// True once `now` has reached `expires_at`.
    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.expires_at
    }

    /// Lifetime left at `now`, zero once expired.
    pub fn remaining_at(&self, now: i64) -> Duration {
        Duration::from_secs(self.expires_at.saturating_sub(now).max(0) as u64)
    }
}

/// A freshly issued token and the claims it encodes.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: TokenClaims,
}

/// Why a token string could not be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("Malformed token")]
    Malformed,

    #[error("Token signature verification failed")]
    BadSignature,

    #[error("Token expired")]
    Expired,
}

/// Token codec: issues and verifies signed, time-bounded identity assertions.
pub trait TokenService: Send + Sync {
    /// Issue a token for `subject`, valid from now for the configured TTL.
    fn issue(&self, subject: &str) -> Result<IssuedToken, AuthError>;

    /// Verify signature and expiry, then return the claims.
    fn decode(&self, token: &str) -> Result<TokenClaims, TokenError>;

    /// Compare `expires_at` with the current time.
    fn is_expired(&self, claims: &TokenClaims) -> bool;

    /// Token lifetime in seconds.
    fn ttl_seconds(&self) -> i64;
}

/// Password hashing service.
pub trait PasswordService: Send + Sync {
    /// Hash a plain text password.
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// Verify a password against a hash.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError>;
}

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("Token has been revoked")]
    Revoked,

    #[error("Missing authorization header")]
    MissingAuth,

    #[error("Token subject no longer exists")]
    UnknownSubject,

    #[error("Account is not active")]
    AccountNotActive,

    #[error("Insufficient permissions")]
    InsufficientRole,

    #[error("Credential store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Token signing failed: {0}")]
    Signing(String),

    #[error("Hashing error: {0}")]
    HashingError(String),
}

impl AuthError {
    /// Internal failures as opposed to a caller presenting bad credentials.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            AuthError::StoreUnavailable(_) | AuthError::Signing(_) | AuthError::HashingError(_)
        )
    }
}
