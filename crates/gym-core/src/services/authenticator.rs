//! Per-request authentication and authorization.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::domain::{AccessDecision, AccessPolicy, DenyReason, Principal, mask_identifier};
use crate::ports::{
    AuthError, CredentialStore, RevocationList, TokenClaims, TokenError, TokenService,
};

const BEARER_PREFIX: &str = "Bearer ";

/// Identity bound to one request, together with the token that proved it.
#[derive(Debug, Clone)]
pub struct BoundIdentity {
    pub principal: Principal,
    pub claims: TokenClaims,
}

#[derive(Debug)]
enum AuthState<'a> {
    Unauthenticated,
    TokenPresent(&'a str),
    Verified(TokenClaims),
    Bound(BoundIdentity),
    Rejected(AuthError),
}

/// Extract the token from an `Authorization` header value.
pub fn parse_bearer(header: &str) -> Option<&str> {
    header
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Drives a request from its raw `Authorization` header to an access decision.
///
/// Holds no per-request state; one instance serves all requests concurrently.
pub struct RequestAuthenticator {
    tokens: Arc<dyn TokenService>,
    store: Arc<dyn CredentialStore>,
    revocations: Arc<dyn RevocationList>,
    policy: AccessPolicy,
    lookup_timeout: Duration,
}

impl RequestAuthenticator {
    pub fn new(
        tokens: Arc<dyn TokenService>,
        store: Arc<dyn CredentialStore>,
        revocations: Arc<dyn RevocationList>,
        policy: AccessPolicy,
        lookup_timeout: Duration,
    ) -> Self {
        Self {
            tokens,
            store,
            revocations,
            policy,
            lookup_timeout,
        }
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    /// Authenticate and authorize a request for `path`.
    ///
    /// `Ok(None)` means the path is public and no identity was looked at.
    /// `Ok(Some(_))` means the identity is bound and allowed on `path`.
    pub async fn authenticate(
        &self,
        path: &str,
        authorization: Option<&str>,
    ) -> Result<Option<BoundIdentity>, AuthError> {
        if self.policy.is_public(path) {
            return Ok(None);
        }

        let mut state = match authorization {
            None => AuthState::Unauthenticated,
            Some(header) => match parse_bearer(header) {
                Some(token) => AuthState::TokenPresent(token),
                None => AuthState::Rejected(AuthError::Token(TokenError::Malformed)),
            },
        };

        loop {
            state = match state {
                AuthState::Unauthenticated => match self.policy.authorize(path, None) {
                    AccessDecision::Allow => return Ok(None),
                    AccessDecision::Deny(_) => AuthState::Rejected(AuthError::MissingAuth),
                },
                AuthState::TokenPresent(token) => match self.verify(token).await {
                    Ok(claims) => AuthState::Verified(claims),
                    Err(e) => AuthState::Rejected(e),
                },
                AuthState::Verified(claims) => match self.bind(claims).await {
                    Ok(bound) => AuthState::Bound(bound),
                    Err(e) => AuthState::Rejected(e),
                },
                AuthState::Bound(bound) => {
                    return match self.policy.authorize(path, Some(bound.principal.role)) {
                        AccessDecision::Allow => Ok(Some(bound)),
                        AccessDecision::Deny(DenyReason::InsufficientRole) => {
                            tracing::warn!(
                                subject = %mask_identifier(&bound.principal.subject),
                                role = %bound.principal.role,
                                path,
                                "Access denied: insufficient role"
                            );
                            Err(AuthError::InsufficientRole)
                        }
                        AccessDecision::Deny(DenyReason::Unauthenticated) => {
                            Err(AuthError::MissingAuth)
                        }
                    };
                }
                AuthState::Rejected(err) => {
                    if err.is_internal() {
                        tracing::error!(path, error = %err, "Request rejected");
                    } else {
                        tracing::debug!(path, reason = %err, "Request rejected");
                    }
                    return Err(err);
                }
            };
        }
    }

    /// Revoke the token behind `claims` for the rest of its lifetime.
    pub async fn revoke(&self, claims: &TokenClaims) -> Result<(), AuthError> {
        let remaining = claims.remaining_at(Utc::now().timestamp());
        self.revocations
            .revoke(&claims.token_id, remaining)
            .await
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;

        tracing::info!(subject = %mask_identifier(&claims.subject), "Token revoked");
        Ok(())
    }

    async fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let claims = self.tokens.decode(token)?;
        if self.tokens.is_expired(&claims) {
            return Err(TokenError::Expired.into());
        }

        let revoked = self
            .revocations
            .is_revoked(&claims.token_id)
            .await
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;
        if revoked {
            return Err(AuthError::Revoked);
        }

        Ok(claims)
    }

    async fn bind(&self, claims: TokenClaims) -> Result<BoundIdentity, AuthError> {
        let lookup = self.store.find_by_identifier(&claims.subject);
        let record = tokio::time::timeout(self.lookup_timeout, lookup)
            .await
            .map_err(|_| AuthError::StoreUnavailable("credential lookup timed out".into()))?
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;

        let member = record.ok_or(AuthError::UnknownSubject)?;
        if !member.is_active() {
            tracing::warn!(
                subject = %mask_identifier(&member.identifier),
                status = %member.status,
                "Token presented for inactive account"
            );
            return Err(AuthError::AccountNotActive);
        }

        Ok(BoundIdentity {
            principal: Principal::from(&member),
            claims,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AccountStatus, Role, StaffMember};
    use crate::ports::CredentialStore;
    use crate::services::CacheRevocationList;
    use crate::services::test_support::{BrokenRevocations, DotTokens, MapCache, MemStore};
    use std::sync::atomic::Ordering;

    struct Fixture {
        tokens: Arc<DotTokens>,
        store: Arc<MemStore>,
        auth: RequestAuthenticator,
    }

    fn fixture_with(store: MemStore, revocations: Arc<dyn RevocationList>) -> Fixture {
        let tokens = Arc::new(DotTokens::new(3600));
        let store = Arc::new(store);
        let auth = RequestAuthenticator::new(
            tokens.clone(),
            store.clone(),
            revocations,
            AccessPolicy::default(),
            Duration::from_millis(200),
        );
        Fixture {
            tokens,
            store,
            auth,
        }
    }

    fn fixture() -> Fixture {
        let store = MemStore::with(vec![
            StaffMember::new("12345678".into(), "plain$x".into(), Role::Admin),
            StaffMember::new("87654321".into(), "plain$y".into(), Role::FrontDesk),
        ]);
        fixture_with(
            store,
            Arc::new(CacheRevocationList::new(Arc::new(MapCache::default()))),
        )
    }

    fn bearer(f: &Fixture, subject: &str) -> String {
        format!("Bearer {}", f.tokens.issue(subject).unwrap().token)
    }

    #[test]
    fn test_parse_bearer() {
        assert_eq!(parse_bearer("Bearer abc"), Some("abc"));
        assert_eq!(parse_bearer("Bearer "), None);
        assert_eq!(parse_bearer("Basic abc"), None);
        assert_eq!(parse_bearer("bearer abc"), None);
    }

    #[tokio::test]
    async fn test_public_path_skips_everything() {
        let f = fixture();
        let result = f.auth.authenticate("/api/health", Some("Bearer garbage")).await;
        assert!(matches!(result, Ok(None)));
    }

    #[tokio::test]
    async fn test_missing_header_on_protected_path() {
        let f = fixture();
        let err = f.auth.authenticate("/api/auth/me", None).await.unwrap_err();
        assert!(matches!(err, AuthError::MissingAuth));
    }

    #[tokio::test]
    async fn test_wrong_scheme_is_rejected() {
        let f = fixture();
        let err = f
            .auth
            .authenticate("/api/auth/me", Some("Basic MTIzOjQ1Ng=="))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Token(TokenError::Malformed)));
    }

    #[tokio::test]
    async fn test_valid_token_binds_principal() {
        let f = fixture();
        let header = bearer(&f, "12345678");

        let bound = f
            .auth
            .authenticate("/admin/reportes", Some(&header))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(bound.principal.subject, "12345678");
        assert_eq!(bound.principal.role, Role::Admin);
        assert!(bound.principal.is_active);
    }

    #[tokio::test]
    async fn test_insufficient_role() {
        let f = fixture();
        let header = bearer(&f, "87654321");

        let err = f
            .auth
            .authenticate("/admin/reportes", Some(&header))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InsufficientRole));

        assert!(f.auth.authenticate("/api/auth/me", Some(&header)).await.is_ok());
    }

    #[tokio::test]
    async fn test_forged_and_expired_tokens_rejected() {
        let f = fixture();

        let err = f
            .auth
            .authenticate("/api/auth/me", Some("Bearer forged.t1.0.99999999999"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Token(TokenError::BadSignature)));

        let past = Utc::now().timestamp() - 10;
        let expired = format!("Bearer 12345678.t9.{}.{}", past - 3600, past);
        let err = f
            .auth
            .authenticate("/api/auth/me", Some(&expired))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Token(TokenError::Expired)));
    }

    #[tokio::test]
    async fn test_status_change_takes_effect_on_next_request() {
        let f = fixture();
        let header = bearer(&f, "12345678");
        assert!(f.auth.authenticate("/admin/reportes", Some(&header)).await.is_ok());

        f.store
            .update_status("12345678", AccountStatus::Inactive)
            .await
            .unwrap();

        let err = f
            .auth
            .authenticate("/admin/reportes", Some(&header))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::AccountNotActive));
    }

    #[tokio::test]
    async fn test_role_comes_from_current_record() {
        let f = fixture();
        let header = bearer(&f, "12345678");

        let demoted = StaffMember::new("12345678".into(), "plain$x".into(), Role::Cleaning);
        f.store.save(demoted).await.unwrap();

        let err = f
            .auth
            .authenticate("/admin/reportes", Some(&header))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InsufficientRole));
    }

    #[tokio::test]
    async fn test_unknown_subject_rejected() {
        let f = fixture();
        let header = bearer(&f, "00000000");
        let err = f
            .auth
            .authenticate("/api/auth/me", Some(&header))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UnknownSubject));
    }

    #[tokio::test]
    async fn test_revoked_token_rejected() {
        let f = fixture();
        let header = bearer(&f, "12345678");
        let bound = f
            .auth
            .authenticate("/api/auth/me", Some(&header))
            .await
            .unwrap()
            .unwrap();

        f.auth.revoke(&bound.claims).await.unwrap();

        let err = f
            .auth
            .authenticate("/api/auth/me", Some(&header))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Revoked));
    }

    #[tokio::test]
    async fn test_store_failure_fails_closed() {
        let f = fixture();
        let header = bearer(&f, "12345678");
        f.store.fail.store(true, Ordering::SeqCst);

        let err = f
            .auth
            .authenticate("/api/auth/me", Some(&header))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::StoreUnavailable(_)));
    }

    #[tokio::test]
    async fn test_revocation_backend_failure_fails_closed() {
        let f = fixture_with(
            MemStore::with(vec![StaffMember::new(
                "12345678".into(),
                "plain$x".into(),
                Role::Admin,
            )]),
            Arc::new(BrokenRevocations),
        );
        let header = bearer(&f, "12345678");

        let err = f
            .auth
            .authenticate("/api/auth/me", Some(&header))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::StoreUnavailable(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_lookup_times_out() {
        let store = MemStore::with(vec![StaffMember::new(
            "12345678".into(),
            "plain$x".into(),
            Role::Admin,
        )])
        .slow(Duration::from_secs(5));
        let f = fixture_with(
            store,
            Arc::new(CacheRevocationList::new(Arc::new(MapCache::default()))),
        );
        let header = bearer(&f, "12345678");

        let err = f
            .auth
            .authenticate("/api/auth/me", Some(&header))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::StoreUnavailable(_)));
    }
}
