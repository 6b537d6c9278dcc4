//! Authentication services built on the ports.

mod authenticator;
mod login;
mod revocation;

#[cfg(test)]
pub(crate) mod test_support;

pub use authenticator::{BoundIdentity, RequestAuthenticator, parse_bearer};
pub use login::LoginService;
pub use revocation::CacheRevocationList;
