//! Credential login: identifier + secret in, signed token out.

use std::sync::Arc;

use crate::domain::mask_identifier;
use crate::ports::{AuthError, CredentialStore, IssuedToken, PasswordService, TokenService};

/// Hashed once at startup so unknown identifiers cost one full verification too.
const TIMING_DUMMY_SECRET: &str = "gymgate-timing-equalizer";

/// Establishes identity from credentials and issues tokens.
///
/// Unknown identifiers and wrong secrets produce the same
/// [`AuthError::InvalidCredentials`], after the same amount of hashing work.
pub struct LoginService {
    store: Arc<dyn CredentialStore>,
    passwords: Arc<dyn PasswordService>,
    tokens: Arc<dyn TokenService>,
    dummy_hash: String,
}

impl LoginService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        passwords: Arc<dyn PasswordService>,
        tokens: Arc<dyn TokenService>,
    ) -> Result<Self, AuthError> {
        let dummy_hash = passwords.hash(TIMING_DUMMY_SECRET)?;
        Ok(Self {
            store,
            passwords,
            tokens,
            dummy_hash,
        })
    }

    pub fn token_ttl_seconds(&self) -> i64 {
        self.tokens.ttl_seconds()
    }

    pub async fn login(&self, identifier: &str, secret: &str) -> Result<IssuedToken, AuthError> {
        let masked = mask_identifier(identifier);

        let record = self
            .store
            .find_by_identifier(identifier)
            .await
            .map_err(|e| {
                tracing::error!(identifier = %masked, error = %e, "Credential lookup failed");
                AuthError::StoreUnavailable(e.to_string())
            })?;

        let Some(member) = record else {
            let _ = self.verify_secret(secret, &self.dummy_hash).await;
            tracing::debug!(identifier = %masked, "Login rejected");
            return Err(AuthError::InvalidCredentials);
        };

        let matches = self
            .verify_secret(secret, &member.credential_hash)
            .await
            .unwrap_or_else(|e| {
                tracing::error!(identifier = %masked, error = %e, "Stored credential hash unusable");
                false
            });

        if !matches {
            tracing::debug!(identifier = %masked, "Login rejected");
            return Err(AuthError::InvalidCredentials);
        }

        if !member.is_active() {
            tracing::warn!(identifier = %masked, status = %member.status, "Login for inactive account");
            return Err(AuthError::AccountNotActive);
        }

        let issued = self.tokens.issue(&member.identifier)?;
        tracing::info!(
            identifier = %masked,
            role = %member.role,
            expires_at = issued.claims.expires_at,
            "Token issued"
        );
        Ok(issued)
    }

    // Argon2 is deliberately slow; keep it off the async workers.
    async fn verify_secret(&self, secret: &str, hash: &str) -> Result<bool, AuthError> {
        let passwords = Arc::clone(&self.passwords);
        let secret = secret.to_owned();
        let hash = hash.to_owned();

        tokio::task::spawn_blocking(move || passwords.verify(&secret, &hash))
            .await
            .map_err(|e| AuthError::HashingError(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AccountStatus, Role, StaffMember};
    use crate::services::test_support::{DotTokens, MemStore, PlainPasswords};
    use std::sync::atomic::Ordering;

    fn service(store: MemStore) -> LoginService {
        LoginService::new(
            Arc::new(store),
            Arc::new(PlainPasswords),
            Arc::new(DotTokens::new(3600)),
        )
        .unwrap()
    }

    fn admin() -> StaffMember {
        StaffMember::new("12345678".into(), "plain$123tamarindo".into(), Role::Admin)
    }

    #[tokio::test]
    async fn test_login_success_issues_token_for_subject() {
        let svc = service(MemStore::with(vec![admin()]));

        let issued = svc.login("12345678", "123tamarindo").await.unwrap();

        assert_eq!(issued.claims.subject, "12345678");
        assert!(issued.claims.expires_at > issued.claims.issued_at);
        assert!(!issued.token.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_identifier_and_wrong_secret_look_the_same() {
        let svc = service(MemStore::with(vec![admin()]));

        let unknown = svc.login("99999999", "123tamarindo").await.unwrap_err();
        let wrong = svc.login("12345678", "wrong").await.unwrap_err();

        assert!(matches!(unknown, AuthError::InvalidCredentials));
        assert!(matches!(wrong, AuthError::InvalidCredentials));
        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[tokio::test]
    async fn test_inactive_account_cannot_login() {
        let member = admin().with_status(AccountStatus::OnLeave);
        let svc = service(MemStore::with(vec![member]));

        let err = svc.login("12345678", "123tamarindo").await.unwrap_err();
        assert!(matches!(err, AuthError::AccountNotActive));
    }

    #[tokio::test]
    async fn test_corrupt_hash_is_a_mismatch() {
        let member = StaffMember::new("12345678".into(), "md5:abc".into(), Role::Admin);
        let svc = service(MemStore::with(vec![member]));

        let err = svc.login("12345678", "abc").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_store_failure_fails_closed() {
        let store = MemStore::with(vec![admin()]);
        store.fail.store(true, Ordering::SeqCst);
        let svc = service(store);

        let err = svc.login("12345678", "123tamarindo").await.unwrap_err();
        assert!(matches!(err, AuthError::StoreUnavailable(_)));
        assert!(err.is_internal());
    }
}
