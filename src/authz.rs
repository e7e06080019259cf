//! Authorization: who may do what.
//!
//! Two layers. The [`registry`] is a fixed role → permission table, and the
//! `check_*` functions here hold an actor against it. Actions whose legality
//! depends on the target or the requested change, not just on a permission,
//! go through an [`escalation`] chain instead (or as well).

pub mod escalation;
pub mod registry;

use tracing::warn;

use crate::model::{AccountState, Actor, Permission, Role};

/// An action was refused.
///
/// Always terminal: callers surface it, nothing retries it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Unauthorized {
    #[error("{actor} lacks permission {permission}")]
    MissingPermission {
        actor: String,
        permission: Permission,
    },

    #[error("{actor} holds none of {}", join(permissions))]
    MissingAnyOf {
        actor: String,
        permissions: Vec<Permission>,
    },

    #[error("{actor} cannot act while {state}")]
    Inactive { actor: String, state: AccountState },

    #[error("{policy}: {actor} refused: {reason}")]
    Refused {
        policy: &'static str,
        actor: String,
        reason: String,
    },

    #[error("{policy}: no policy admits {actor} ({role})")]
    NoPolicy {
        policy: &'static str,
        actor: String,
        role: Role,
    },
}

fn join(permissions: &[Permission]) -> String {
    permissions
        .iter()
        .map(|p| p.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Require `actor` to hold `permission`.
pub fn check_permission(actor: &Actor, permission: Permission) -> Result<(), Unauthorized> {
    require_active(actor)?;
    if registry::has_permission(actor.role, permission) {
        return Ok(());
    }
    warn!(actor = %actor.id, role = %actor.role, %permission, "permission denied");
    Err(Unauthorized::MissingPermission {
        actor: actor.id.clone(),
        permission,
    })
}

/// Require `actor` to hold every one of `permissions`.
///
/// The error names the first permission missing.
pub fn check_all(actor: &Actor, permissions: &[Permission]) -> Result<(), Unauthorized> {
    require_active(actor)?;
    if registry::has_all(actor.role, permissions) {
        return Ok(());
    }
    let Some(&permission) = permissions
        .iter()
        .find(|p| !registry::has_permission(actor.role, **p))
    else {
        return Ok(());
    };
    warn!(actor = %actor.id, role = %actor.role, %permission, "permission denied");
    Err(Unauthorized::MissingPermission {
        actor: actor.id.clone(),
        permission,
    })
}

/// Require `actor` to hold at least one of `permissions`.
///
/// An empty list grants nothing.
pub fn check_any(actor: &Actor, permissions: &[Permission]) -> Result<(), Unauthorized> {
    require_active(actor)?;
    if registry::has_any(actor.role, permissions) {
        return Ok(());
    }
    warn!(actor = %actor.id, role = %actor.role, "none of the required permissions held");
    Err(Unauthorized::MissingAnyOf {
        actor: actor.id.clone(),
        permissions: permissions.to_vec(),
    })
}

fn require_active(actor: &Actor) -> Result<(), Unauthorized> {
    if actor.is_active() {
        Ok(())
    } else {
        warn!(actor = %actor.id, state = %actor.state, "inactive actor refused");
        Err(Unauthorized::Inactive {
            actor: actor.id.clone(),
            state: actor.state,
        })
    }
}
