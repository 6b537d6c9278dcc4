//! Authentication implementations.

mod jwt;
mod password;

pub use jwt::{JwtConfig, JwtConfigError, JwtTokenService, MIN_SECRET_LEN};
pub use password::{Argon2PasswordService, PasswordConfig};
