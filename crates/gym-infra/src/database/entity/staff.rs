//! Staff credential entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use gym_core::domain::{AccountStatus, Role, StaffMember};
use gym_core::error::RepoError;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "staff")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub identifier: String,
    pub credential_hash: String,
    pub role: String,
    pub status: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Rows with an unknown role or status are rejected rather than guessed at.
impl TryFrom<Model> for StaffMember {
    type Error = RepoError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let role = model
            .role
            .parse::<Role>()
            .map_err(|e| RepoError::Corrupt(e.to_string()))?;
        let status = model
            .status
            .parse::<AccountStatus>()
            .map_err(|e| RepoError::Corrupt(e.to_string()))?;

        Ok(Self {
            identifier: model.identifier,
            credential_hash: model.credential_hash,
            role,
            status,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        })
    }
}

impl From<StaffMember> for ActiveModel {
    fn from(member: StaffMember) -> Self {
        Self {
            identifier: Set(member.identifier),
            credential_hash: Set(member.credential_hash),
            role: Set(member.role.as_str().to_string()),
            status: Set(member.status.as_str().to_string()),
            created_at: Set(member.created_at.into()),
            updated_at: Set(member.updated_at.into()),
        }
    }
}
