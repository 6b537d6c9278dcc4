//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod cache;
mod rate_limit;
mod repository;
mod revocation;

pub use auth::{AuthError, IssuedToken, PasswordService, TokenClaims, TokenError, TokenService};
pub use cache::{Cache, CacheError};
pub use rate_limit::{RateLimitError, RateLimitResult, RateLimiter};
pub use repository::CredentialStore;
pub use revocation::RevocationList;
