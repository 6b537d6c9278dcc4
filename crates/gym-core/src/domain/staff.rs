use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Staff role. The string form is the only representation that leaves the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    FrontDesk,
    Cleaning,
    Trainer,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::FrontDesk, Role::Cleaning, Role::Trainer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::FrontDesk => "FRONT_DESK",
            Role::Cleaning => "CLEANING",
            Role::Trainer => "TRAINER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| DomainError::Validation(format!("unknown role: {s}")))
    }
}

/// Account status. Anything other than `Active` fails every access check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    Active,
    Inactive,
    OnLeave,
}

impl AccountStatus {
    pub const ALL: [AccountStatus; 3] = [
        AccountStatus::Active,
        AccountStatus::Inactive,
        AccountStatus::OnLeave,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "ACTIVE",
            AccountStatus::Inactive => "INACTIVE",
            AccountStatus::OnLeave => "ON_LEAVE",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, AccountStatus::Active)
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AccountStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| DomainError::Validation(format!("unknown account status: {s}")))
    }
}

/// Staff member - the identity record a principal authenticates as.
///
/// `identifier` is the national ID and doubles as the token subject.
#[derive(Clone, Serialize, Deserialize)]
pub struct StaffMember {
    pub identifier: String,
    pub credential_hash: String,
    pub role: Role,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StaffMember {
    /// Create a new, active staff member.
    pub fn new(identifier: String, credential_hash: String, role: Role) -> Self {
        let now = Utc::now();
        Self {
            identifier,
            credential_hash,
            role,
            status: AccountStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_status(mut self, status: AccountStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

// The credential hash never reaches logs.
impl fmt::Debug for StaffMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaffMember")
            .field("identifier", &self.identifier)
            .field("credential_hash", &"<redacted>")
            .field("role", &self.role)
            .field("status", &self.status)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// The identity bound to a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub subject: String,
    pub role: Role,
    pub is_active: bool,
}

impl From<&StaffMember> for Principal {
    fn from(member: &StaffMember) -> Self {
        Self {
            subject: member.identifier.clone(),
            role: member.role,
            is_active: member.is_active(),
        }
    }
}

/// Mask an identifier for logging, keeping only the last two characters.
pub fn mask_identifier(identifier: &str) -> String {
    let count = identifier.chars().count();
    if count <= 2 {
        return "***".to_string();
    }
    let tail: String = identifier.chars().skip(count - 2).collect();
    format!("***{tail}")
}
