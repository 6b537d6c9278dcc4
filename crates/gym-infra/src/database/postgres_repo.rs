//! PostgreSQL credential store.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{ColumnTrait, DbConn, EntityTrait, QueryFilter};

use gym_core::domain::{AccountStatus, StaffMember, mask_identifier};
use gym_core::error::RepoError;
use gym_core::ports::CredentialStore;

use super::entity::staff::{self, Entity as StaffEntity};

/// PostgreSQL-backed credential store.
pub struct PostgresCredentialStore {
    db: DbConn,
}

impl PostgresCredentialStore {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    async fn find_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<StaffMember>, RepoError> {
        tracing::debug!(identifier = %mask_identifier(identifier), "Finding staff by identifier");

        let result = StaffEntity::find_by_id(identifier.to_string())
            .one(&self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        result.map(StaffMember::try_from).transpose()
    }

    async fn save(&self, member: StaffMember) -> Result<StaffMember, RepoError> {
        let active: staff::ActiveModel = member.clone().into();

        StaffEntity::insert(active)
            .on_conflict(
                OnConflict::column(staff::Column::Identifier)
                    .update_columns([
                        staff::Column::CredentialHash,
                        staff::Column::Role,
                        staff::Column::Status,
                        staff::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(member)
    }

    async fn update_status(
        &self,
        identifier: &str,
        status: AccountStatus,
    ) -> Result<StaffMember, RepoError> {
        let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();

        let result = StaffEntity::update_many()
            .col_expr(staff::Column::Status, Expr::value(status.as_str()))
            .col_expr(staff::Column::UpdatedAt, Expr::value(now))
            .filter(staff::Column::Identifier.eq(identifier))
            .exec(&self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        tracing::info!(
            identifier = %mask_identifier(identifier),
            status = %status,
            "Staff status updated"
        );

        self.find_by_identifier(identifier)
            .await?
            .ok_or(RepoError::NotFound)
    }
}
