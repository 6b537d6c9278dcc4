//! # GymGate Infrastructure
//!
//! Concrete implementations of the ports defined in `gym-core`:
//! credential stores, token and password services, caches backing the
//! revocation list, and login rate limiters.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external dependencies, in-memory only
//! - `postgres` - PostgreSQL credential store via SeaORM
//! - `auth` - JWT + Argon2 authentication
//! - `rate-limit` - Login rate limiting via governor
//! - `redis` - Redis-backed revocation cache and rate limiter

pub mod cache;
pub mod database;

#[cfg(feature = "auth")]
pub mod auth;

#[cfg(feature = "rate-limit")]
pub mod rate_limit;

// Re-exports - In-Memory
pub use cache::InMemoryCache;
pub use database::{DatabaseConfig, InMemoryCredentialStore};

#[cfg(feature = "auth")]
pub use auth::{Argon2PasswordService, JwtConfig, JwtTokenService, PasswordConfig};

#[cfg(feature = "postgres")]
pub use database::PostgresCredentialStore;

#[cfg(feature = "rate-limit")]
pub use rate_limit::{InMemoryRateLimiter, RateLimitConfig};

// Re-exports - Redis
#[cfg(feature = "redis")]
pub use cache::{RedisCache, RedisConfig};
#[cfg(all(feature = "redis", feature = "rate-limit"))]
pub use rate_limit::RedisRateLimiter;
