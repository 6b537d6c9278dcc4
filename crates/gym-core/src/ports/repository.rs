use async_trait::async_trait;

use crate::domain::{AccountStatus, StaffMember};
use crate::error::RepoError;

/// Credential store - resolves identifiers to identity records.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Find a staff member by national ID. Pure read.
    async fn find_by_identifier(&self, identifier: &str)
    -> Result<Option<StaffMember>, RepoError>;

    /// Save a staff member (create or update).
    async fn save(&self, member: StaffMember) -> Result<StaffMember, RepoError>;

    /// Administrative status change. `RepoError::NotFound` for unknown identifiers.
    async fn update_status(
        &self,
        identifier: &str,
        status: AccountStatus,
    ) -> Result<StaffMember, RepoError>;
}
