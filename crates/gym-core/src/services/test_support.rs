//! In-process doubles for the ports, shared by the service tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::{AccountStatus, StaffMember};
use crate::error::RepoError;
use crate::ports::{
    AuthError, Cache, CacheError, CredentialStore, IssuedToken, PasswordService, RevocationList,
    TokenClaims, TokenError, TokenService,
};

#[derive(Default)]
pub struct MapCache {
    entries: Mutex<HashMap<String, String>>,
}

#[async_trait]
impl Cache for MapCache {
    async fn set(&self, key: &str, value: &str, _ttl: Option<Duration>) -> Result<(), CacheError> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.entries.lock().unwrap().contains_key(key))
    }
}

/// Revocation list whose backend is always down.
pub struct BrokenRevocations;

#[async_trait]
impl RevocationList for BrokenRevocations {
    async fn revoke(&self, _token_id: &str, _ttl: Duration) -> Result<(), CacheError> {
        Err(CacheError::Connection("down".into()))
    }

    async fn is_revoked(&self, _token_id: &str) -> Result<bool, CacheError> {
        Err(CacheError::Connection("down".into()))
    }
}

#[derive(Default)]
pub struct MemStore {
    members: Mutex<HashMap<String, StaffMember>>,
    pub fail: AtomicBool,
    pub delay: Option<Duration>,
}

impl MemStore {
    pub fn with(members: Vec<StaffMember>) -> Self {
        let store = Self::default();
        {
            let mut map = store.members.lock().unwrap();
            for m in members {
                map.insert(m.identifier.clone(), m);
            }
        }
        store
    }

    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl CredentialStore for MemStore {
    async fn find_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<StaffMember>, RepoError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(RepoError::Connection("unreachable".into()));
        }
        Ok(self.members.lock().unwrap().get(identifier).cloned())
    }

    async fn save(&self, member: StaffMember) -> Result<StaffMember, RepoError> {
        self.members
            .lock()
            .unwrap()
            .insert(member.identifier.clone(), member.clone());
        Ok(member)
    }

    async fn update_status(
        &self,
        identifier: &str,
        status: AccountStatus,
    ) -> Result<StaffMember, RepoError> {
        let mut members = self.members.lock().unwrap();
        let member = members.get_mut(identifier).ok_or(RepoError::NotFound)?;
        member.status = status;
        member.updated_at = Utc::now();
        Ok(member.clone())
    }
}

/// Password double: the "hash" is the secret behind a marker prefix.
pub struct PlainPasswords;

impl PasswordService for PlainPasswords {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        Ok(format!("plain${password}"))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        hash.strip_prefix("plain$")
            .map(|stored| stored == password)
            .ok_or_else(|| AuthError::HashingError("unrecognised hash".into()))
    }
}

/// Token double: `subject.jti.iat.exp`, with `forged` as a sentinel subject
/// that fails signature checks.
pub struct DotTokens {
    pub ttl: i64,
    counter: AtomicU64,
}

impl DotTokens {
    pub fn new(ttl: i64) -> Self {
        Self {
            ttl,
            counter: AtomicU64::new(0),
        }
    }

    pub fn encode(claims: &TokenClaims) -> String {
        format!(
            "{}.{}.{}.{}",
            claims.subject, claims.token_id, claims.issued_at, claims.expires_at
        )
    }
}

impl TokenService for DotTokens {
    fn issue(&self, subject: &str) -> Result<IssuedToken, AuthError> {
        let now = Utc::now().timestamp();
        let id = self.counter.fetch_add(1, Ordering::SeqCst);
        let claims = TokenClaims {
            subject: subject.to_string(),
            token_id: format!("t{id}"),
            issued_at: now,
            expires_at: now + self.ttl,
        };
        Ok(IssuedToken {
            token: Self::encode(&claims),
            claims,
        })
    }

    fn decode(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let parts: Vec<&str> = token.split('.').collect();
        let [subject, token_id, iat, exp] = parts.as_slice() else {
            return Err(TokenError::Malformed);
        };
        if *subject == "forged" {
            return Err(TokenError::BadSignature);
        }
        let claims = TokenClaims {
            subject: subject.to_string(),
            token_id: token_id.to_string(),
            issued_at: iat.parse().map_err(|_| TokenError::Malformed)?,
            expires_at: exp.parse().map_err(|_| TokenError::Malformed)?,
        };
        if self.is_expired(&claims) {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    fn is_expired(&self, claims: &TokenClaims) -> bool {
        claims.is_expired_at(Utc::now().timestamp())
    }

    fn ttl_seconds(&self) -> i64 {
        self.ttl
    }
}
