//! In-memory credential store - used when no database is configured.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use gym_core::domain::{AccountStatus, StaffMember};
use gym_core::error::RepoError;
use gym_core::ports::CredentialStore;

/// Credential store held in process memory.
///
/// Lookups take a shared read lock, so concurrent requests never wait on
/// each other; only administrative writes take the exclusive lock.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    members: RwLock<HashMap<String, StaffMember>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.members.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.members.read().await.is_empty()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<StaffMember>, RepoError> {
        Ok(self.members.read().await.get(identifier).cloned())
    }

    async fn save(&self, member: StaffMember) -> Result<StaffMember, RepoError> {
        let mut members = self.members.write().await;
        members.insert(member.identifier.clone(), member.clone());
        Ok(member)
    }

    async fn update_status(
        &self,
        identifier: &str,
        status: AccountStatus,
    ) -> Result<StaffMember, RepoError> {
        let mut members = self.members.write().await;
        let member = members.get_mut(identifier).ok_or(RepoError::NotFound)?;
        member.status = status;
        member.updated_at = Utc::now();
        Ok(member.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gym_core::domain::Role;

    #[tokio::test]
    async fn test_save_and_find() {
        let store = InMemoryCredentialStore::new();
        store
            .save(StaffMember::new("12345678".into(), "h".into(), Role::Admin))
            .await
            .unwrap();

        let found = store.find_by_identifier("12345678").await.unwrap().unwrap();
        assert_eq!(found.role, Role::Admin);
        assert!(store.find_by_identifier("1234567").await.unwrap().is_none());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_save_replaces_existing_record() {
        let store = InMemoryCredentialStore::new();
        store
            .save(StaffMember::new("12345678".into(), "h".into(), Role::Admin))
            .await
            .unwrap();
        store
            .save(StaffMember::new("12345678".into(), "h2".into(), Role::Trainer))
            .await
            .unwrap();

        let found = store.find_by_identifier("12345678").await.unwrap().unwrap();
        assert_eq!(found.role, Role::Trainer);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_update_status() {
        let store = InMemoryCredentialStore::new();
        store
            .save(StaffMember::new("12345678".into(), "h".into(), Role::Cleaning))
            .await
            .unwrap();

        let updated = store
            .update_status("12345678", AccountStatus::Inactive)
            .await
            .unwrap();
        assert_eq!(updated.status, AccountStatus::Inactive);

        let missing = store.update_status("0", AccountStatus::Active).await;
        assert!(matches!(missing, Err(RepoError::NotFound)));
    }
}
