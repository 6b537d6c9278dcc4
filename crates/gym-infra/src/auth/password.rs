//! Argon2id credential hashing.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};

use gym_core::ports::{AuthError, PasswordService};

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    /// The argon2 crate's recommended costs (19 MiB, 2 passes, 1 lane).
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

impl PasswordConfig {
    /// Reads `ARGON2_MEMORY_KIB`, `ARGON2_ITERATIONS` and `ARGON2_PARALLELISM`.
    pub fn from_env() -> Self {
        let cost = |name: &str, default: u32| -> u32 {
            match std::env::var(name).map(|raw| raw.parse()) {
                Ok(Ok(value)) => value,
                _ => default,
            }
        };
        let defaults = Self::default();

        Self {
            memory_kib: cost("ARGON2_MEMORY_KIB", defaults.memory_kib),
            iterations: cost("ARGON2_ITERATIONS", defaults.iterations),
            parallelism: cost("ARGON2_PARALLELISM", defaults.parallelism),
        }
    }
}

fn hashing_error(e: password_hash::Error) -> AuthError {
    AuthError::HashingError(e.to_string())
}

/// Argon2id credential hasher.
///
/// Verification re-derives the hash with the parameters stored in the PHC
/// string and compares in constant time, so hashes created under older cost
/// settings keep verifying after the configuration changes.
pub struct Argon2PasswordService {
    hasher: Argon2<'static>,
}

impl Argon2PasswordService {
    pub fn with_config(config: PasswordConfig) -> Result<Self, AuthError> {
        let params = Params::new(config.memory_kib, config.iterations, config.parallelism, None)
            .map_err(|e| AuthError::HashingError(format!("invalid Argon2 parameters: {e}")))?;

        Ok(Self {
            hasher: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }
}

impl PasswordService for Argon2PasswordService {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let phc = self
            .hasher
            .hash_password(password.as_bytes(), &salt)
            .map_err(hashing_error)?;
        Ok(phc.to_string())
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let stored = PasswordHash::new(hash).map_err(hashing_error)?;

        match self.hasher.verify_password(password.as_bytes(), &stored) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(hashing_error(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> Argon2PasswordService {
        Argon2PasswordService::with_config(PasswordConfig {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let service = cheap();
        let password = "123tamarindo";

        let hash = service.hash(password).unwrap();
        assert!(service.verify(password, &hash).unwrap());
        assert!(!service.verify("123tamarind0", &hash).unwrap());
    }

    #[test]
    fn test_hash_is_salted_and_never_plaintext() {
        let service = cheap();

        let a = service.hash("123tamarindo").unwrap();
        let b = service.hash("123tamarindo").unwrap();

        assert_ne!(a, b);
        assert!(a.starts_with("$argon2id$"));
        assert!(!a.contains("123tamarindo"));
    }

    #[test]
    fn test_hash_from_other_cost_still_verifies() {
        let old = cheap();
        let hash = old.hash("123tamarindo").unwrap();

        let current = Argon2PasswordService::with_config(PasswordConfig {
            memory_kib: 2048,
            iterations: 2,
            parallelism: 1,
        })
        .unwrap();
        assert!(current.verify("123tamarindo", &hash).unwrap());
    }

    #[test]
    fn test_unparseable_hash_is_an_error() {
        let result = cheap().verify("123tamarindo", "123tamarindo");
        assert!(matches!(result, Err(AuthError::HashingError(_))));
    }

    #[test]
    fn test_invalid_params_rejected() {
        let result = Argon2PasswordService::with_config(PasswordConfig {
            memory_kib: 1,
            iterations: 0,
            parallelism: 1,
        });
        assert!(result.is_err());
    }
}
