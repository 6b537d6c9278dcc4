//! Domain entities - the core business objects.

mod policy;
mod staff;

pub use policy::{
    AccessDecision, AccessPolicy, AccessPolicyBuilder, AccessRule, DenyReason, PolicyError,
};
pub use staff::{AccountStatus, Principal, Role, StaffMember, mask_identifier};
