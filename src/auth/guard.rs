//! Authorization decisions. Every role or ownership check in the service
//! goes through [`authorize`] or [`authorize_loaded`].

use tracing::warn;

use super::claims::Principal;
use crate::errors::{AppError, Resource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    RequireAdmin,
    RequireOwnerOrAdmin(i64),
}

/// Pure allow/deny over a principal and a policy.
pub fn authorize(principal: &Principal, policy: Policy) -> Result<(), AppError> {
    let allowed = match policy {
        Policy::RequireAdmin => principal.is_admin(),
        Policy::RequireOwnerOrAdmin(owner) => principal.is_admin() || principal.user_id == owner,
    };
    if allowed {
        Ok(())
    } else {
        warn!(user_id = principal.user_id, ?policy, "access denied");
        Err(AppError::Forbidden)
    }
}

/// Ownership check for a record that had to be looked up first; `owner` is
/// `None` when the lookup missed. Only admins learn that a record is absent,
/// everyone else not owning it gets `Forbidden`.
pub fn authorize_loaded(
    principal: &Principal,
    owner: Option<i64>,
    resource: Resource,
) -> Result<(), AppError> {
    match owner {
        Some(owner) => authorize(principal, Policy::RequireOwnerOrAdmin(owner)),
        None if principal.is_admin() => Err(AppError::NotFound(resource)),
        None => {
            warn!(user_id = principal.user_id, ?resource, "access denied to missing record");
            Err(AppError::Forbidden)
        }
    }
}
